// SPDX-License-Identifier: Apache-2.0

//! The Distribution Extractor: turns a normalized [`TypeRegistry`] into a
//! [`DistributionModel`] (spec §4.1).
//!
//! Every constructible shape in the registry becomes an `FqnSource` filed
//! under its own FQN *and* under every ancestor it is substitutable for, so
//! the generator can build, say, an `IBucket` by picking any concrete
//! `Bucket` subtype. Each parameter/field gets its own content-addressed
//! distribution, built recursively from its `TypeRef`.

use tracing::{debug, debug_span};

use crate::biaser::Biaser;
use crate::error::Result;
use crate::registry::model::{
    DistRef, DistributionModel, FqnSource, ParameterSource, ValueDistribution, ValueSource,
};
use crate::registry::typeinfo::{Parameter, TypeRef, TypeRegistry};

/// Builds a [`DistributionModel`] from `registry`, running every recorded
/// `FqnSource` through `biaser` before it is filed.
pub fn extract_distributions(registry: &TypeRegistry, biaser: &Biaser) -> Result<DistributionModel> {
    let mut model = DistributionModel::new();

    for (fqn, class) in &registry.classes {
        let _span = debug_span!("extract.class", fqn = %fqn).entered();
        if class.concrete {
            if let Some(ctor_params) = &class.constructor {
                let parameters = build_parameters(&mut model, ctor_params)?;
                let source = biaser.bias(
                    FqnSource::ClassInstantiation {
                        class_fqn: fqn.clone(),
                        parameters,
                    },
                    &mut model,
                );
                file_under_fqn_and_ancestors(&mut model, fqn, &class.ancestors, source);
            }
        }

        for sm in &class.static_methods {
            let parameters = build_parameters(&mut model, &sm.parameters)?;
            let source = biaser.bias(
                FqnSource::StaticMethodCall {
                    declaring_fqn: fqn.clone(),
                    static_method: sm.name.clone(),
                    target_fqn: sm.return_fqn.clone(),
                    parameters,
                },
                &mut model,
            );
            // Open-question decision (spec §9): propagate only to the
            // *declared return type's* class-ancestor chain, never to the
            // declaring class's own supertypes.
            let return_ancestors = registry
                .classes
                .get(&sm.return_fqn)
                .map(|c| c.ancestors.clone())
                .unwrap_or_default();
            file_under_fqn_and_ancestors(&mut model, &sm.return_fqn, &return_ancestors, source);
        }

        for sp in &class.static_properties {
            let source = FqnSource::StaticPropertyAccess {
                declaring_fqn: fqn.clone(),
                static_property: sp.name.clone(),
                target_fqn: sp.type_fqn.clone(),
            };
            let target_ancestors = registry
                .classes
                .get(&sp.type_fqn)
                .map(|c| c.ancestors.clone())
                .unwrap_or_default();
            file_under_fqn_and_ancestors(&mut model, &sp.type_fqn, &target_ancestors, source);
        }
    }

    for (fqn, iface) in &registry.interfaces {
        if !iface.data {
            debug!(fqn = %fqn, "skipping non-data interface: no FqnSource of its own");
            continue;
        }
        let fields = build_fields(&mut model, &iface.fields)?;
        let source = FqnSource::ValueObject {
            struct_fqn: fqn.clone(),
            fields,
        };
        file_under_fqn_and_ancestors(&mut model, fqn, &iface.super_interfaces, source);
    }

    for (fqn, e) in &registry.enums {
        for member in &e.members {
            model.add_fqn_source(
                fqn.clone(),
                FqnSource::StaticPropertyAccess {
                    declaring_fqn: fqn.clone(),
                    static_property: member.clone(),
                    target_fqn: fqn.clone(),
                },
            );
        }
    }

    Ok(model)
}

fn file_under_fqn_and_ancestors(
    model: &mut DistributionModel,
    fqn: &str,
    ancestors: &[String],
    source: FqnSource,
) {
    model.add_fqn_source(fqn.to_string(), source.clone());
    for ancestor in ancestors {
        model.add_fqn_source(ancestor.clone(), source.clone());
    }
}

fn build_parameters(model: &mut DistributionModel, params: &[Parameter]) -> Result<Vec<ParameterSource>> {
    params
        .iter()
        .map(|p| {
            Ok(ParameterSource {
                name: p.name.clone(),
                dist: parameter_dist(model, p)?,
            })
        })
        .collect()
}

fn build_fields(
    model: &mut DistributionModel,
    fields: &[Parameter],
) -> Result<indexmap::IndexMap<String, DistRef>> {
    let mut out = indexmap::IndexMap::new();
    for f in fields {
        out.insert(f.name.clone(), parameter_dist(model, f)?);
    }
    Ok(out)
}

/// Builds the distribution for one parameter or struct field. Optional
/// ones get `NoValue` spliced in as the *first* alternative, so the
/// minimal generator's "first alternative that succeeds" rule (spec §4.5)
/// naturally prefers omitting an optional value over generating one.
fn parameter_dist(model: &mut DistributionModel, param: &Parameter) -> Result<DistRef> {
    let type_dist = type_ref_dist(model, &param.type_ref)?;
    if !param.optional {
        return Ok(type_dist);
    }
    let mut sources = vec![ValueSource::NoValue];
    if let Some(existing) = model.lookup_dist(&type_dist) {
        sources.extend(existing.iter().cloned());
    }
    model.record_distribution(ValueDistribution(sources))
}

/// Builds the distribution a `TypeRef` describes. Array/map element types
/// and union branches recurse; a union's branches are inlined directly as
/// sibling alternatives of one distribution rather than nested behind an
/// extra indirection, since nothing downstream needs a `DistRef` to the
/// bare union by itself.
fn type_ref_dist(model: &mut DistributionModel, type_ref: &TypeRef) -> Result<DistRef> {
    match type_ref {
        TypeRef::Primitive(name) => {
            model.record_distribution(ValueDistribution(vec![ValueSource::Primitive(name.clone())]))
        }
        TypeRef::Fqn(fqn) => {
            model.record_distribution(ValueDistribution(vec![ValueSource::FqnRef(fqn.clone())]))
        }
        TypeRef::ArrayOf(inner) => {
            let inner_dist = type_ref_dist(model, inner)?;
            model.record_distribution(ValueDistribution(vec![ValueSource::Array(inner_dist)]))
        }
        TypeRef::MapOf(inner) => {
            let inner_dist = type_ref_dist(model, inner)?;
            model.record_distribution(ValueDistribution(vec![ValueSource::Map(inner_dist)]))
        }
        TypeRef::Union(variants) => {
            let mut sources = Vec::new();
            for v in variants {
                let branch_dist = type_ref_dist(model, v)?;
                if let Some(existing) = model.lookup_dist(&branch_dist) {
                    sources.extend(existing.iter().cloned());
                }
            }
            model.record_distribution(ValueDistribution(sources))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::model::ResolvedSource;
    use crate::registry::typeinfo::{ClassDef, EnumDef, InterfaceDef};

    #[test]
    fn concrete_class_is_filed_under_self_and_ancestors() {
        let registry = TypeRegistry::new().with_class(ClassDef {
            fqn: "aws.s3.Bucket".into(),
            concrete: true,
            constructor: Some(vec![Parameter::required("scope", TypeRef::Fqn("aws.Construct".into()))]),
            static_methods: vec![],
            static_properties: vec![],
            ancestors: vec!["aws.s3.IBucket".into()],
        });
        let biaser = Biaser::with_defaults();
        let model = extract_distributions(&registry, &biaser).unwrap();
        assert!(model.lookup_fqn("aws.s3.Bucket").is_some());
        assert!(model.lookup_fqn("aws.s3.IBucket").is_some());
        // Biaser rewrote the single "scope"-named parameter.
        if let Some([FqnSource::ClassInstantiation { parameters, .. }]) =
            model.lookup_fqn("aws.s3.Bucket")
        {
            let dist = model.lookup_dist(&parameters[0].dist).unwrap();
            assert_eq!(dist, &[ValueSource::Custom("scope".into())]);
        } else {
            panic!("expected exactly one class instantiation source");
        }
    }

    #[test]
    fn abstract_class_without_constructor_contributes_no_instantiation() {
        let registry = TypeRegistry::new().with_class(ClassDef {
            fqn: "aws.s3.BucketBase".into(),
            concrete: false,
            constructor: None,
            static_methods: vec![],
            static_properties: vec![],
            ancestors: vec![],
        });
        let biaser = Biaser::with_defaults();
        let model = extract_distributions(&registry, &biaser).unwrap();
        assert!(model.lookup_fqn("aws.s3.BucketBase").is_none());
    }

    #[test]
    fn static_method_propagates_only_to_return_types_ancestors() {
        use crate::registry::typeinfo::StaticMethodDef;
        let registry = TypeRegistry::new()
            .with_class(ClassDef {
                fqn: "aws.s3.Bucket".into(),
                concrete: false,
                constructor: None,
                static_methods: vec![StaticMethodDef {
                    name: "fromBucketName".into(),
                    return_fqn: "aws.s3.IBucket".into(),
                    parameters: vec![Parameter::required("name", TypeRef::Primitive("string".into()))],
                }],
                static_properties: vec![],
                // The declaring class's own ancestors must NOT receive this source.
                ancestors: vec!["aws.Resource".into()],
            })
            .with_class(ClassDef {
                fqn: "aws.s3.IBucket".into(),
                concrete: false,
                constructor: None,
                static_methods: vec![],
                static_properties: vec![],
                ancestors: vec!["aws.IResource".into()],
            });
        let biaser = Biaser::with_defaults();
        let model = extract_distributions(&registry, &biaser).unwrap();
        assert!(model.lookup_fqn("aws.s3.IBucket").is_some());
        assert!(model.lookup_fqn("aws.IResource").is_some());
        assert!(model.lookup_fqn("aws.Resource").is_none());
    }

    #[test]
    fn optional_parameter_gets_no_value_as_first_alternative() {
        let registry = TypeRegistry::new().with_class(ClassDef {
            fqn: "m.Thing".into(),
            concrete: true,
            constructor: Some(vec![Parameter::optional("count", TypeRef::Primitive("number".into()))]),
            static_methods: vec![],
            static_properties: vec![],
            ancestors: vec![],
        });
        let biaser = Biaser::empty();
        let model = extract_distributions(&registry, &biaser).unwrap();
        if let Some([FqnSource::ClassInstantiation { parameters, .. }]) = model.lookup_fqn("m.Thing") {
            let dist = model.lookup_dist(&parameters[0].dist).unwrap();
            assert_eq!(dist[0], ValueSource::NoValue);
        } else {
            panic!("expected one class instantiation source");
        }
    }

    #[test]
    fn data_interface_becomes_value_object_filed_under_supers() {
        let registry = TypeRegistry::new().with_interface(InterfaceDef {
            fqn: "m.BucketProps".into(),
            data: true,
            fields: vec![Parameter::required("name", TypeRef::Primitive("string".into()))],
            super_interfaces: vec!["m.ResourceProps".into()],
        });
        let biaser = Biaser::empty();
        let model = extract_distributions(&registry, &biaser).unwrap();
        assert!(model.lookup_fqn("m.BucketProps").is_some());
        assert!(model.lookup_fqn("m.ResourceProps").is_some());
    }

    #[test]
    fn non_data_interface_contributes_nothing() {
        let registry = TypeRegistry::new().with_interface(InterfaceDef {
            fqn: "m.Taggable".into(),
            data: false,
            fields: vec![],
            super_interfaces: vec![],
        });
        let biaser = Biaser::empty();
        let model = extract_distributions(&registry, &biaser).unwrap();
        assert!(model.lookup_fqn("m.Taggable").is_none());
    }

    #[test]
    fn enum_members_become_static_property_sources() {
        let registry = TypeRegistry::new().with_enum(EnumDef {
            fqn: "m.Color".into(),
            members: vec!["RED".into(), "BLUE".into()],
        });
        let biaser = Biaser::empty();
        let model = extract_distributions(&registry, &biaser).unwrap();
        let sources = model.lookup_fqn("m.Color").unwrap();
        assert_eq!(sources.len(), 2);
        assert!(matches!(sources[0], FqnSource::StaticPropertyAccess { .. }));
    }

    #[test]
    fn array_of_fqn_resolves_through_one_level_of_indirection() {
        let registry = TypeRegistry::new().with_class(ClassDef {
            fqn: "m.List".into(),
            concrete: true,
            constructor: Some(vec![Parameter::required(
                "items",
                TypeRef::ArrayOf(Box::new(TypeRef::Fqn("m.Item".into()))),
            )]),
            static_methods: vec![],
            static_properties: vec![],
            ancestors: vec![],
        });
        let biaser = Biaser::empty();
        let mut model = extract_distributions(&registry, &biaser).unwrap();
        model.add_fqn_source(
            "m.Item",
            FqnSource::ClassInstantiation {
                class_fqn: "m.Item".into(),
                parameters: vec![],
            },
        );
        if let Some([FqnSource::ClassInstantiation { parameters, .. }]) = model.lookup_fqn("m.List") {
            let resolved = model.resolve(&parameters[0].dist).unwrap();
            assert!(matches!(resolved[0], ResolvedSource::Array(_)));
        } else {
            panic!("expected one class instantiation source");
        }
    }
}
