// SPDX-License-Identifier: Apache-2.0

//! The Minimal Generator: produces a smallest valid [`Value`] for an FQN,
//! breaking recursion via a per-traversal [`DistPtr`] blacklist (spec §4.5).

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::{trace, warn};

use crate::custom::CustomDistributionRegistry;
use crate::error::{ProgspaceError, Result};
use crate::random::Random;
use crate::registry::model::{
    DistRef, DistributionModel, ResolvedSource, ValueDistribution, ValueSource,
};
use crate::value::{DistPtr, Primitive, Value};
use crate::zipper::Locator;

/// Produces minimal values against a [`DistributionModel`], using a shared
/// [`CustomDistributionRegistry`] to delegate opaque/correlated sources.
pub struct Generator<'m> {
    model: &'m mut DistributionModel,
    customs: &'m CustomDistributionRegistry,
}

impl<'m> Generator<'m> {
    pub fn new(model: &'m mut DistributionModel, customs: &'m CustomDistributionRegistry) -> Self {
        Generator { model, customs }
    }

    /// Builds the smallest syntactically valid value of `fqn` (spec §4.5
    /// step 1-2): records an anonymous `[FqnRef(fqn)]` wrapper distribution
    /// and builds from it.
    pub fn minimal(&mut self, fqn: &str, random: &mut Random) -> Result<Value> {
        let _span = tracing::debug_span!("generator.minimal", fqn).entered();
        let dist_ref = self
            .model
            .record_distribution(ValueDistribution(vec![ValueSource::FqnRef(fqn.to_string())]))?;
        let mut breaker = HashSet::new();
        minimal_value(self.model, self.customs, random, &dist_ref, &[], &mut breaker)
    }
}

/// Recursive worker shared by [`Generator::minimal`] and by the Mutator
/// when it needs to build a fresh minimal value for a sibling alternative
/// (spec §4.6 "switch alternative"). `breaker` holds every `DistPtr`
/// currently on the construction stack for *this* top-level traversal.
pub(crate) fn minimal_value(
    model: &mut DistributionModel,
    customs: &CustomDistributionRegistry,
    random: &mut Random,
    dist_ref: &DistRef,
    path: &[Locator],
    breaker: &mut HashSet<DistPtr>,
) -> Result<Value> {
    let resolved = model.resolve(dist_ref)?;
    let mut last_err = None;
    for (index, source) in resolved.iter().enumerate() {
        let ptr = DistPtr {
            dist_id: dist_ref.0.clone(),
            source_index: index,
        };
        if breaker.contains(&ptr) {
            trace!(dist_id = %ptr.dist_id, source_index = index, "recursion broken, trying next source");
            continue;
        }
        breaker.insert(ptr.clone());
        let attempt = minimal_value_from_source(model, customs, random, source, ptr.clone(), path, breaker);
        breaker.remove(&ptr);
        match attempt {
            Ok(v) => return Ok(v),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or(ProgspaceError::NoOptionsLeft(dist_ref.0.clone())))
}

/// Builds the value a single alternative of a distribution would produce,
/// with a fresh recursion-breaker scoped to just this build. Used by the
/// mutator's sibling-switch proposals (spec §4.6): switching to another
/// alternative reuses the ordinary minimal-value builder, not a bespoke
/// mutation rule.
pub(crate) fn minimal_alternative(
    model: &mut DistributionModel,
    customs: &CustomDistributionRegistry,
    random: &mut Random,
    dist_ref: &DistRef,
    source_index: usize,
) -> Result<Value> {
    let resolved = model.resolve(dist_ref)?;
    let source = resolved
        .get(source_index)
        .ok_or_else(|| ProgspaceError::NoSourcesInDistribution(dist_ref.0.clone()))?
        .clone();
    let ptr = DistPtr {
        dist_id: dist_ref.0.clone(),
        source_index,
    };
    let mut breaker = HashSet::new();
    minimal_value_from_source(model, customs, random, &source, ptr, &[], &mut breaker)
}

fn minimal_value_from_source(
    model: &mut DistributionModel,
    customs: &CustomDistributionRegistry,
    random: &mut Random,
    source: &ResolvedSource,
    ptr: DistPtr,
    path: &[Locator],
    breaker: &mut HashSet<DistPtr>,
) -> Result<Value> {
    match source {
        ResolvedSource::ClassInstantiation {
            class_fqn,
            parameters,
        } => {
            let parameter_names = parameters.iter().map(|p| p.name.clone()).collect();
            let arguments = generate_arguments(
                model,
                customs,
                random,
                parameters,
                path,
                breaker,
                Locator::ClassArgument,
            )?;
            Ok(Value::ClassInstantiation {
                dist_ptr: ptr,
                fqn: class_fqn.clone(),
                parameter_names,
                arguments,
            })
        }
        ResolvedSource::StaticMethodCall {
            declaring_fqn,
            static_method,
            target_fqn,
            parameters,
        } => {
            let parameter_names = parameters.iter().map(|p| p.name.clone()).collect();
            let arguments = generate_arguments(
                model,
                customs,
                random,
                parameters,
                path,
                breaker,
                Locator::StaticMethodArgument,
            )?;
            Ok(Value::StaticMethodCall {
                dist_ptr: ptr,
                fqn: declaring_fqn.clone(),
                static_method: static_method.clone(),
                target_fqn: target_fqn.clone(),
                parameter_names,
                arguments,
            })
        }
        ResolvedSource::StaticPropertyAccess {
            declaring_fqn,
            static_property,
            target_fqn,
        } => Ok(Value::StaticPropertyAccess {
            dist_ptr: ptr,
            fqn: declaring_fqn.clone(),
            static_property: static_property.clone(),
            target_fqn: target_fqn.clone(),
        }),
        ResolvedSource::ValueObject { struct_fqn, fields } => {
            let mut entries = IndexMap::new();
            for (name, field_dist) in fields.iter() {
                let mut child_path = path.to_vec();
                child_path.push(Locator::StructField(name.clone()));
                match minimal_value(model, customs, random, field_dist, &child_path, breaker) {
                    Ok(v) => {
                        entries.insert(name.clone(), v);
                    }
                    Err(e) => {
                        if field_is_optional(model, field_dist)? {
                            warn!(field = %name, struct_fqn = %struct_fqn, error = %e, "dropping optional struct field that failed to generate");
                        } else {
                            return Err(e);
                        }
                    }
                }
            }
            Ok(Value::StructLiteral {
                dist_ptr: ptr,
                fqn: struct_fqn.clone(),
                entries,
            })
        }
        ResolvedSource::Primitive(name) => build_primitive(random, name, ptr),
        ResolvedSource::NoValue => Ok(Value::NoValue { dist_ptr: ptr }),
        ResolvedSource::Array(elem_dist) => {
            let mut child_path = path.to_vec();
            child_path.push(Locator::ArrayElement(0));
            let elem = minimal_value(model, customs, random, elem_dist, &child_path, breaker)?;
            Ok(Value::ArrayValue {
                dist_ptr: ptr,
                elements: vec![elem],
            })
        }
        ResolvedSource::Map(_) => Ok(Value::MapLiteral {
            dist_ptr: ptr,
            entries: IndexMap::new(),
        }),
        ResolvedSource::Constant(value) => Ok(with_dist_ptr(value.clone(), ptr)),
        ResolvedSource::Custom(name) => {
            let plugin = customs
                .get(name)
                .ok_or_else(|| ProgspaceError::UnknownCustomDistribution(name.clone()))?;
            plugin.minimal_value(ptr, path, random)
        }
    }
}

fn generate_arguments(
    model: &mut DistributionModel,
    customs: &CustomDistributionRegistry,
    random: &mut Random,
    parameters: &[crate::registry::model::ParameterSource],
    path: &[Locator],
    breaker: &mut HashSet<DistPtr>,
    locator_of: impl Fn(usize) -> Locator,
) -> Result<Vec<Value>> {
    let mut arguments = Vec::with_capacity(parameters.len());
    let mut filling_no_value = false;
    for (i, p) in parameters.iter().enumerate() {
        if filling_no_value {
            if let Some(no_value_ptr) = no_value_ptr_for(model, &p.dist)? {
                arguments.push(Value::NoValue {
                    dist_ptr: no_value_ptr,
                });
                continue;
            }
            // Not actually optional: fall through and generate normally.
            filling_no_value = false;
        }
        let mut child_path = path.to_vec();
        child_path.push(locator_of(i));
        let v = minimal_value(model, customs, random, &p.dist, &child_path, breaker)?;
        if v.is_no_value() {
            filling_no_value = true;
        }
        arguments.push(v);
    }
    Ok(arguments)
}

fn no_value_ptr_for(model: &DistributionModel, dist_ref: &DistRef) -> Result<Option<DistPtr>> {
    let resolved = model.resolve(dist_ref)?;
    Ok(resolved
        .iter()
        .position(|s| matches!(s, ResolvedSource::NoValue))
        .map(|index| DistPtr {
            dist_id: dist_ref.0.clone(),
            source_index: index,
        }))
}

fn field_is_optional(model: &DistributionModel, dist_ref: &DistRef) -> Result<bool> {
    let resolved = model.resolve(dist_ref)?;
    Ok(resolved.iter().any(|s| matches!(s, ResolvedSource::NoValue)))
}

fn build_primitive(random: &mut Random, name: &str, ptr: DistPtr) -> Result<Value> {
    match name {
        "string" => Ok(Value::PrimitiveValue {
            dist_ptr: ptr,
            payload: Primitive::String(random.minimal_string()),
        }),
        "number" => Ok(Value::PrimitiveValue {
            dist_ptr: ptr,
            payload: Primitive::Number(random.minimal_number()),
        }),
        "boolean" => Ok(Value::PrimitiveValue {
            dist_ptr: ptr,
            payload: Primitive::Boolean(false),
        }),
        "date" => Ok(Value::PrimitiveValue {
            dist_ptr: ptr,
            payload: Primitive::Date(0),
        }),
        "json" | "any" => Ok(Value::MapLiteral {
            dist_ptr: ptr,
            entries: IndexMap::new(),
        }),
        other => {
            warn!(primitive = other, "unknown primitive name, defaulting to string");
            Ok(Value::PrimitiveValue {
                dist_ptr: ptr,
                payload: Primitive::String(random.minimal_string()),
            })
        }
    }
}

fn with_dist_ptr(value: Value, ptr: DistPtr) -> Value {
    match value {
        Value::ClassInstantiation {
            fqn,
            parameter_names,
            arguments,
            ..
        } => Value::ClassInstantiation {
            dist_ptr: ptr,
            fqn,
            parameter_names,
            arguments,
        },
        Value::StaticMethodCall {
            fqn,
            static_method,
            target_fqn,
            parameter_names,
            arguments,
            ..
        } => Value::StaticMethodCall {
            dist_ptr: ptr,
            fqn,
            static_method,
            target_fqn,
            parameter_names,
            arguments,
        },
        Value::StaticPropertyAccess {
            fqn,
            static_property,
            target_fqn,
            ..
        } => Value::StaticPropertyAccess {
            dist_ptr: ptr,
            fqn,
            static_property,
            target_fqn,
        },
        Value::StructLiteral { fqn, entries, .. } => Value::StructLiteral {
            dist_ptr: ptr,
            fqn,
            entries,
        },
        Value::MapLiteral { entries, .. } => Value::MapLiteral {
            dist_ptr: ptr,
            entries,
        },
        Value::ArrayValue { elements, .. } => Value::ArrayValue {
            dist_ptr: ptr,
            elements,
        },
        Value::PrimitiveValue { payload, .. } => Value::PrimitiveValue {
            dist_ptr: ptr,
            payload,
        },
        Value::NoValue { .. } => Value::NoValue { dist_ptr: ptr },
        Value::ScopeValue { .. } => Value::ScopeValue { dist_ptr: ptr },
        Value::Variable { name } => Value::Variable { name },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::model::{FqnSource, ParameterSource};

    fn const_str_dist(model: &mut DistributionModel) -> DistRef {
        model
            .record_distribution(ValueDistribution(vec![ValueSource::Primitive(
                "string".to_string(),
            )]))
            .unwrap()
    }

    #[test]
    fn minimal_builds_class_instantiation_with_string_arg() {
        let mut model = DistributionModel::new();
        let str_dist = const_str_dist(&mut model);
        model.add_fqn_source(
            "M.Stack",
            FqnSource::ClassInstantiation {
                class_fqn: "M.Stack".into(),
                parameters: vec![ParameterSource {
                    name: "id".into(),
                    dist: str_dist,
                }],
            },
        );
        let customs = CustomDistributionRegistry::with_defaults();
        let mut gen = Generator::new(&mut model, &customs);
        let mut random = Random::new(1);
        let v = gen.minimal("M.Stack", &mut random).unwrap();
        match v {
            Value::ClassInstantiation { fqn, arguments, .. } => {
                assert_eq!(fqn, "M.Stack");
                assert_eq!(arguments.len(), 1);
                assert!(matches!(arguments[0], Value::PrimitiveValue { .. }));
            }
            other => panic!("unexpected value {other:?}"),
        }
    }

    #[test]
    fn optional_field_with_no_value_first_is_omitted() {
        let mut model = DistributionModel::new();
        let optional_dist = model
            .record_distribution(ValueDistribution(vec![
                ValueSource::NoValue,
                ValueSource::Primitive("number".into()),
            ]))
            .unwrap();
        let required_dist = const_str_dist(&mut model);
        model.add_fqn_source(
            "M.Props",
            FqnSource::ValueObject {
                struct_fqn: "M.Props".into(),
                fields: IndexMap::from([
                    ("name".to_string(), required_dist),
                    ("count".to_string(), optional_dist),
                ]),
            },
        );
        let customs = CustomDistributionRegistry::with_defaults();
        let mut gen = Generator::new(&mut model, &customs);
        let mut random = Random::new(2);
        let v = gen.minimal("M.Props", &mut random).unwrap();
        match v {
            Value::StructLiteral { entries, .. } => {
                assert!(entries.contains_key("name"));
                assert!(!entries.contains_key("count"));
            }
            other => panic!("unexpected value {other:?}"),
        }
    }

    #[test]
    fn recursion_is_broken_by_optional_escape_hatch() {
        // A { self: A optional } — minimal(A) must terminate by picking
        // NoValue for the recursive field rather than looping forever.
        let mut model = DistributionModel::new();
        let self_dist = model
            .record_distribution(ValueDistribution(vec![
                ValueSource::NoValue,
                ValueSource::FqnRef("A".into()),
            ]))
            .unwrap();
        model.add_fqn_source(
            "A",
            FqnSource::ValueObject {
                struct_fqn: "A".into(),
                fields: IndexMap::from([("self".to_string(), self_dist)]),
            },
        );
        let customs = CustomDistributionRegistry::with_defaults();
        let mut gen = Generator::new(&mut model, &customs);
        let mut random = Random::new(3);
        let v = gen.minimal("A", &mut random).unwrap();
        match v {
            Value::StructLiteral { entries, .. } => assert!(!entries.contains_key("self")),
            other => panic!("unexpected value {other:?}"),
        }
    }

    #[test]
    fn mutual_recursion_terminates_via_recursion_breaker() {
        // A(B), B(A), neither optional: no escape hatch, so every
        // alternative eventually recurses back onto itself and the call
        // must fail rather than loop forever.
        let mut model = DistributionModel::new();
        let b_dist = model
            .record_distribution(ValueDistribution(vec![ValueSource::FqnRef("B".into())]))
            .unwrap();
        let a_dist = model
            .record_distribution(ValueDistribution(vec![ValueSource::FqnRef("A".into())]))
            .unwrap();
        model.add_fqn_source(
            "A",
            FqnSource::ClassInstantiation {
                class_fqn: "A".into(),
                parameters: vec![ParameterSource {
                    name: "b".into(),
                    dist: b_dist,
                }],
            },
        );
        model.add_fqn_source(
            "B",
            FqnSource::ClassInstantiation {
                class_fqn: "B".into(),
                parameters: vec![ParameterSource {
                    name: "a".into(),
                    dist: a_dist,
                }],
            },
        );
        let customs = CustomDistributionRegistry::with_defaults();
        let mut gen = Generator::new(&mut model, &customs);
        let mut random = Random::new(4);
        let err = gen.minimal("A", &mut random).unwrap_err();
        assert!(matches!(err, ProgspaceError::NoOptionsLeft(_)));
    }

    #[test]
    fn enum_member_resolves_to_static_property_access() {
        let mut model = DistributionModel::new();
        model.add_fqn_source(
            "M.E",
            FqnSource::StaticPropertyAccess {
                declaring_fqn: "M.E".into(),
                static_property: "A".into(),
                target_fqn: "M.E".into(),
            },
        );
        model.add_fqn_source(
            "M.E",
            FqnSource::StaticPropertyAccess {
                declaring_fqn: "M.E".into(),
                static_property: "B".into(),
                target_fqn: "M.E".into(),
            },
        );
        let customs = CustomDistributionRegistry::with_defaults();
        let mut gen = Generator::new(&mut model, &customs);
        let mut random = Random::new(5);
        let v = gen.minimal("M.E", &mut random).unwrap();
        match v {
            Value::StaticPropertyAccess { static_property, .. } => {
                assert_eq!(static_property, "A");
            }
            other => panic!("unexpected value {other:?}"),
        }
    }
}
