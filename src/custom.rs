// SPDX-License-Identifier: Apache-2.0

//! Named `CustomDistribution` plug-ins: the escape hatch for opaque or
//! correlated sources that a generic `ValueSource` can't express. Looked
//! up by the name carried in `ValueSource::Custom`.

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::error::Result;
use crate::random::Random;
use crate::value::{DistPtr, Primitive, Value};
use crate::zipper::{Locator, Zipper};

/// Receives mutation candidates one at a time; implemented by the
/// reservoir sampler in [`crate::mutator`]. Kept as a trait (rather than a
/// concrete `Vec` builder) so a `CustomDistribution` never has to know
/// whether it's contributing to a larger on-the-fly enumeration.
pub trait Proposer {
    fn propose(&mut self, value: Value, random: &mut Random);

    /// Total number of proposals seen so far. Used by the mutator's
    /// `didPropose` check (spec §4.6) to tell whether a structural recursion
    /// branch contributed anything, without materializing the candidates.
    fn proposed_count(&self) -> usize;
}

/// A named, registry-keyed capability: knows how to build its own minimal
/// value and how to propose mutations of one, without the generator or
/// mutator needing to understand its internal shape.
pub trait CustomDistribution: Send + Sync {
    fn minimal_value(&self, dist_ptr: DistPtr, path: &[Locator], random: &mut Random) -> Result<Value>;

    /// Proposes zero or more mutated replacements for `value` (focused at
    /// `zipper`) to `proposer`. A plug-in with no meaningful mutation (e.g.
    /// an opaque host handle) simply proposes nothing.
    fn mutate(&self, value: &Value, zipper: &Zipper, random: &mut Random, proposer: &mut dyn Proposer);
}

/// Name-keyed lookup table of registered plug-ins.
pub struct CustomDistributionRegistry {
    plugins: IndexMap<String, Box<dyn CustomDistribution>>,
}

impl CustomDistributionRegistry {
    pub fn empty() -> Self {
        CustomDistributionRegistry {
            plugins: IndexMap::new(),
        }
    }

    /// The out-of-the-box plug-ins referenced by the default biaser:
    /// `scope` and `constructId`.
    pub fn with_defaults() -> Self {
        let mut r = Self::empty();
        r.register("scope", Box::new(ScopePlugin));
        r.register("constructId", Box::new(ConstructIdPlugin));
        r
    }

    pub fn register(&mut self, name: impl Into<String>, plugin: Box<dyn CustomDistribution>) {
        self.plugins.insert(name.into(), plugin);
    }

    pub fn get(&self, name: &str) -> Option<&dyn CustomDistribution> {
        self.plugins.get(name).map(|b| b.as_ref())
    }
}

/// A process-wide set of the built-in plug-ins, for callers (chiefly the
/// CLI) that have no reason to build their own. Plug-ins are immutable
/// once constructed, so one shared instance is as good as a fresh one.
pub static DEFAULT_CUSTOM_DISTRIBUTIONS: Lazy<CustomDistributionRegistry> =
    Lazy::new(CustomDistributionRegistry::with_defaults);

/// The opaque host-provided construct scope. Never mutated: there is only
/// one meaningful value, the ambient scope itself.
struct ScopePlugin;

impl CustomDistribution for ScopePlugin {
    fn minimal_value(&self, dist_ptr: DistPtr, _path: &[Locator], _random: &mut Random) -> Result<Value> {
        Ok(Value::ScopeValue { dist_ptr })
    }

    fn mutate(&self, _value: &Value, _zipper: &Zipper, _random: &mut Random, _proposer: &mut dyn Proposer) {
        // No alternative construct scope exists to switch to.
    }
}

/// A freshly generated construct id. Every draw is an independent short
/// random string; mutating one proposes exactly one alternative, a new
/// fresh id, rather than a family of string edits.
struct ConstructIdPlugin;

impl CustomDistribution for ConstructIdPlugin {
    fn minimal_value(&self, dist_ptr: DistPtr, _path: &[Locator], random: &mut Random) -> Result<Value> {
        Ok(Value::PrimitiveValue {
            dist_ptr,
            payload: Primitive::String(random.short_string()),
        })
    }

    fn mutate(&self, value: &Value, _zipper: &Zipper, random: &mut Random, proposer: &mut dyn Proposer) {
        let dist_ptr = match value.dist_ptr() {
            Some(p) => p.clone(),
            None => return,
        };
        let fresh = random.short_string();
        proposer.propose(
            Value::PrimitiveValue {
                dist_ptr,
                payload: Primitive::String(fresh),
            },
            random,
        );
    }
}
