// SPDX-License-Identifier: Apache-2.0

//! The Mutator: single-point edits of an existing [`Value`] tree, sampled
//! uniformly via reservoir sampling over an on-the-fly enumeration (spec
//! §4.6).
//!
//! Mutation never searches for "the best" edit. It enumerates every
//! syntactically legal single-point edit — switching to a sibling
//! alternative, growing or shrinking a collection by one element, nudging a
//! primitive — and keeps `k` of them uniformly at random, without ever
//! materializing the full candidate list.

use indexmap::IndexMap;

use crate::custom::{CustomDistributionRegistry, Proposer};
use crate::error::Result;
use crate::generator::minimal_alternative;
use crate::random::Random;
use crate::registry::model::{DistRef, DistributionModel, ResolvedSource};
use crate::value::{Primitive, Value};
use crate::zipper::{Locator, Zipper};

/// Samples `k` single-point mutations of a [`Value`] tree against a
/// [`DistributionModel`].
pub struct Mutator<'m> {
    model: &'m mut DistributionModel,
    customs: &'m CustomDistributionRegistry,
}

impl<'m> Mutator<'m> {
    pub fn new(model: &'m mut DistributionModel, customs: &'m CustomDistributionRegistry) -> Self {
        Mutator { model, customs }
    }

    /// Returns up to `k` distinct mutated roots, uniformly sampled over
    /// every single-point edit reachable from `root`.
    pub fn mutate(&mut self, root: &Value, k: usize, random: &mut Random) -> Result<Vec<Value>> {
        let mut reservoir = ReservoirProposer::new(k);
        mutate_value(
            self.model,
            self.customs,
            random,
            root,
            &Zipper::root(),
            &mut reservoir,
        )?;
        Ok(reservoir.into_values())
    }
}

/// Classic Algorithm R: the i-th proposal is kept outright while the
/// reservoir is still filling; once full, it replaces a uniformly random
/// occupant with probability `k/i`. Memory stays O(k) regardless of how
/// many candidates are enumerated.
struct ReservoirProposer {
    k: usize,
    seen: usize,
    slots: Vec<Value>,
}

impl ReservoirProposer {
    fn new(k: usize) -> Self {
        ReservoirProposer {
            k,
            seen: 0,
            slots: Vec::with_capacity(k),
        }
    }

    fn into_values(self) -> Vec<Value> {
        self.slots
    }
}

impl Proposer for ReservoirProposer {
    fn propose(&mut self, value: Value, random: &mut Random) {
        self.seen += 1;
        if self.slots.len() < self.k {
            self.slots.push(value);
            return;
        }
        let j = random.index(self.seen);
        if j < self.k {
            self.slots[j] = value;
        }
    }

    fn proposed_count(&self) -> usize {
        self.seen
    }
}

/// Walks `value`, focused at `zipper`, proposing every single-point edit of
/// it and its descendants to `proposer`. Each proposal is a complete new
/// root (the result of `zipper.set(...)` or `zipper.delete()` at the
/// relevant focus), never a bare fragment.
fn mutate_value(
    model: &mut DistributionModel,
    customs: &CustomDistributionRegistry,
    random: &mut Random,
    value: &Value,
    zipper: &Zipper,
    proposer: &mut dyn Proposer,
) -> Result<()> {
    let own_source = match value.dist_ptr() {
        Some(ptr) => Some((
            DistRef(ptr.dist_id.clone()),
            ptr.source_index,
            model.resolve(&DistRef(ptr.dist_id.clone()))?,
        )),
        None => None,
    };

    if let Some((dist_ref, source_index, resolved)) = &own_source {
        propose_sibling_switches(
            model, customs, random, zipper, dist_ref, *source_index, resolved, proposer,
        )?;

        if let Some(ResolvedSource::Custom(name)) = resolved.get(*source_index) {
            if let Some(plugin) = customs.get(name) {
                plugin.mutate(value, zipper, random, proposer);
            }
            // A custom-owned value's structure is entirely the plug-in's
            // business; no generic structural family applies on top of it.
            return Ok(());
        }
    }

    match value {
        Value::ClassInstantiation { arguments, .. } => {
            mutate_positional_children(
                model,
                customs,
                random,
                value,
                zipper,
                arguments,
                Locator::ClassArgument,
                proposer,
            )?;
        }
        Value::StaticMethodCall { arguments, .. } => {
            mutate_positional_children(
                model,
                customs,
                random,
                value,
                zipper,
                arguments,
                Locator::StaticMethodArgument,
                proposer,
            )?;
        }
        Value::StructLiteral { entries, .. } => {
            for (name, field) in entries.iter() {
                let child_zipper = zipper.descend(value.clone(), Locator::StructField(name.clone()));
                mutate_value(model, customs, random, field, &child_zipper, proposer)?;
            }
        }
        Value::MapLiteral { entries, .. } => {
            mutate_map_entries(model, customs, random, value, zipper, entries, proposer)?;
        }
        Value::ArrayValue { elements, .. } => {
            mutate_array_elements(model, customs, random, value, zipper, elements, proposer)?;
        }
        Value::PrimitiveValue { payload, .. } => {
            propose_primitive_family(value, payload, zipper, random, proposer);
        }
        Value::NoValue { .. }
        | Value::StaticPropertyAccess { .. }
        | Value::ScopeValue { .. }
        | Value::Variable { .. } => {
            // No mutation family: these nodes carry no internal structure
            // and (outside the custom-owned case handled above) no
            // sibling alternatives worth switching to beyond what was
            // already proposed.
        }
    }
    Ok(())
}

fn propose_sibling_switches(
    model: &mut DistributionModel,
    customs: &CustomDistributionRegistry,
    random: &mut Random,
    zipper: &Zipper,
    dist_ref: &DistRef,
    current_index: usize,
    resolved: &[ResolvedSource],
    proposer: &mut dyn Proposer,
) -> Result<()> {
    for alt_index in 0..resolved.len() {
        if alt_index == current_index {
            continue;
        }
        let replacement = minimal_alternative(model, customs, random, dist_ref, alt_index)?;
        let new_root = zipper.set(replacement);
        proposer.propose(new_root, random);
    }
    Ok(())
}

/// Spec §4.6: "iterate arguments in a shuffled random order and recurse
/// into the first one that proposes at least one edit." Arguments always
/// number exactly `parameterNames.len()` (the Value invariant fills
/// trailing optional slots with `NoValue`), so the "fewer arguments than
/// parameters" append case never arises here.
fn mutate_positional_children(
    model: &mut DistributionModel,
    customs: &CustomDistributionRegistry,
    random: &mut Random,
    parent: &Value,
    zipper: &Zipper,
    children: &[Value],
    locator_of: impl Fn(usize) -> Locator,
    proposer: &mut dyn Proposer,
) -> Result<()> {
    for i in random.coprime_stride_order(children.len()) {
        let before = proposer.proposed_count();
        let child_zipper = zipper.descend(parent.clone(), locator_of(i));
        mutate_value(model, customs, random, &children[i], &child_zipper, proposer)?;
        if proposer.proposed_count() > before {
            break;
        }
    }
    Ok(())
}

fn mutate_array_elements(
    model: &mut DistributionModel,
    customs: &CustomDistributionRegistry,
    random: &mut Random,
    parent: &Value,
    zipper: &Zipper,
    elements: &[Value],
    proposer: &mut dyn Proposer,
) -> Result<()> {
    // Grow: append a freshly built minimal element. Only representable
    // when the array's own distribution resolves an element source to
    // switch into, which it always does (the array was built from one
    // in the first place).
    if let Some(ptr) = parent.dist_ptr() {
        let dist_ref = DistRef(ptr.dist_id.clone());
        let resolved = model.resolve(&dist_ref)?;
        if let Some(ResolvedSource::Array(elem_dist)) = resolved.get(ptr.source_index) {
            let elem_dist = elem_dist.clone();
            let mut breaker = std::collections::HashSet::new();
            if let Ok(new_elem) = crate::generator::minimal_value(
                model,
                customs,
                random,
                &elem_dist,
                &[Locator::ArrayElement(elements.len())],
                &mut breaker,
            ) {
                let grow_zipper = zipper.descend(parent.clone(), Locator::ArrayElement(elements.len()));
                proposer.propose(grow_zipper.set(new_elem), random);
            }
        }
    }

    // Shrink + recurse: pick one uniformly random index, propose deleting
    // it, then recurse into that same element's own mutation family (spec
    // §4.6: "pick a uniformly random index and propose a delete, then
    // recurse into the element" — a single position, not every element).
    if !elements.is_empty() {
        let i = random.index(elements.len());
        let child_zipper = zipper.descend(parent.clone(), Locator::ArrayElement(i));
        proposer.propose(child_zipper.delete(), random);
        mutate_value(model, customs, random, &elements[i], &child_zipper, proposer)?;
    }
    Ok(())
}

fn mutate_map_entries(
    model: &mut DistributionModel,
    customs: &CustomDistributionRegistry,
    random: &mut Random,
    parent: &Value,
    zipper: &Zipper,
    entries: &IndexMap<String, Value>,
    proposer: &mut dyn Proposer,
) -> Result<()> {
    // Grow: add a new entry under a fresh random key, valued with the
    // map's own element distribution built minimally.
    if let Some(ptr) = parent.dist_ptr() {
        let dist_ref = DistRef(ptr.dist_id.clone());
        let resolved = model.resolve(&dist_ref)?;
        if let Some(ResolvedSource::Map(elem_dist)) = resolved.get(ptr.source_index) {
            let elem_dist = elem_dist.clone();
            let key = random.minimal_string();
            let mut breaker = std::collections::HashSet::new();
            if let Ok(new_val) = crate::generator::minimal_value(
                model,
                customs,
                random,
                &elem_dist,
                &[Locator::MapEntry(key.clone())],
                &mut breaker,
            ) {
                let grow_zipper = zipper.descend(parent.clone(), Locator::MapEntry(key));
                proposer.propose(grow_zipper.set(new_val), random);
            }
        }
    }

    // Shrink + recurse: pick one uniformly random key, propose deleting it,
    // then recurse into that same entry's own mutation family (spec §4.6,
    // same single-position reading as the array case above).
    if !entries.is_empty() {
        let i = random.index(entries.len());
        let (key, val) = entries
            .get_index(i)
            .expect("index drawn within entries.len() is always present");
        let child_zipper = zipper.descend(parent.clone(), Locator::MapEntry(key.clone()));
        proposer.propose(child_zipper.delete(), random);
        mutate_value(model, customs, random, val, &child_zipper, proposer)?;
    }
    Ok(())
}

/// The primitive mutation family (spec §4.6): strings get one of
/// append/prepend/slice-out-a-substring chosen uniformly; numbers get one
/// of `v ± k`, `v * k`, `round(v / k)` (`k` in `[1,5]`) chosen uniformly;
/// booleans flip; dates get a bounded millisecond jitter.
fn propose_primitive_family(
    node: &Value,
    payload: &Primitive,
    zipper: &Zipper,
    random: &mut Random,
    proposer: &mut dyn Proposer,
) {
    let dist_ptr = match node.dist_ptr() {
        Some(p) => p.clone(),
        None => return,
    };
    let mutated = match payload {
        Primitive::String(s) => Primitive::String(mutate_string(s, random)),
        Primitive::Number(n) => Primitive::Number(mutate_number(*n, random)),
        Primitive::Boolean(b) => Primitive::Boolean(!b),
        Primitive::Date(ms) => {
            let delta = random.range_inclusive(-86_400_000, 86_400_000);
            Primitive::Date(ms.saturating_add(delta))
        }
    };
    let new_node = Value::PrimitiveValue {
        dist_ptr,
        payload: mutated,
    };
    proposer.propose(zipper.set(new_node), random);
}

/// One of append/prepend/slice-out-a-random-substring, chosen uniformly.
fn mutate_string(s: &str, random: &mut Random) -> String {
    match random.index(3) {
        0 => {
            let mut out = s.to_string();
            out.push_str(&random.short_string());
            out
        }
        1 => {
            let mut out = random.short_string();
            out.push_str(s);
            out
        }
        _ => {
            let chars: Vec<char> = s.chars().collect();
            if chars.is_empty() {
                // Nothing to slice out of an empty string; fall back to
                // the append family so a proposal is still produced.
                return random.short_string();
            }
            let start = random.index(chars.len());
            let cut_len = random.index(chars.len() - start) + 1;
            let end = start + cut_len;
            chars[..start].iter().chain(chars[end..].iter()).collect()
        }
    }
}

/// One of `v ± k`, `v * k`, `round(v / k)` with `k` uniform in `[1,5]`,
/// chosen uniformly over the three ops. The `±` branch draws a nonzero
/// magnitude and an independent sign so it never reproduces `v` unchanged.
fn mutate_number(n: i64, random: &mut Random) -> i64 {
    let k = random.range_inclusive(1, 5);
    match random.index(3) {
        0 => {
            let signed_k = if random.bool() { k } else { -k };
            n.saturating_add(signed_k)
        }
        1 => n.saturating_mul(k),
        _ => ((n as f64) / (k as f64)).round() as i64,
    }
}
