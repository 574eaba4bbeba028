// SPDX-License-Identifier: Apache-2.0

//! The Distribution Model: a content-addressed registry of value sources,
//! keyed by the hash of their content, with idempotent recording.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{ProgspaceError, Result};
use crate::value::Value;

/// Fully-qualified type name, `module.submodule.Name`.
pub type Fqn = String;

/// Content-address of a [`ValueDistribution`]: a truncated hash of its
/// canonical JSON form, hex-encoded. See DESIGN.md for why 64 bits was
/// chosen over the full hash width.
pub type DistId = String;

/// A stable handle into [`DistributionModel::distributions`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DistRef(pub DistId);

/// One formal parameter of a constructor or static method: its name plus
/// the distribution describing every value it could be called with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSource {
    pub name: String,
    pub dist: DistRef,
}

/// One way to produce a value of some FQN: a constructor call, a static
/// method call, a static property read, or a struct literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FqnSource {
    ClassInstantiation {
        /// The concrete class being instantiated — may differ from the
        /// fqn this source is filed under when contributed by a subtype
        /// to a supertype/interface's source list.
        class_fqn: Fqn,
        parameters: Vec<ParameterSource>,
    },
    StaticMethodCall {
        /// FQN of the class declaring the static method.
        declaring_fqn: Fqn,
        static_method: String,
        target_fqn: Fqn,
        parameters: Vec<ParameterSource>,
    },
    StaticPropertyAccess {
        declaring_fqn: Fqn,
        static_property: String,
        target_fqn: Fqn,
    },
    ValueObject {
        struct_fqn: Fqn,
        fields: IndexMap<String, DistRef>,
    },
}

/// One alternative inside a [`ValueDistribution`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ValueSource {
    /// Indirection: splat-unioned with `fqnSources[fqn]` on resolution.
    FqnRef(Fqn),
    /// `name` is one of `string`, `number`, `boolean`, `date`, `json`, `any`.
    Primitive(String),
    NoValue,
    Array(DistRef),
    Map(DistRef),
    Constant(Value),
    Custom(String),
}

/// An ordered list of alternative [`ValueSource`]s. Content-addressed: two
/// bit-identical distributions collapse to one [`DistId`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueDistribution(pub Vec<ValueSource>);

/// A fully-resolved alternative: `FqnRef`s have been splatted into the
/// `FqnSource`s they point at, so every element here is directly
/// constructible by the generator without another indirection. Produced
/// only by [`DistributionModel::resolve`].
#[derive(Debug, Clone)]
pub enum ResolvedSource {
    ClassInstantiation {
        class_fqn: Fqn,
        parameters: Vec<ParameterSource>,
    },
    StaticMethodCall {
        declaring_fqn: Fqn,
        static_method: String,
        target_fqn: Fqn,
        parameters: Vec<ParameterSource>,
    },
    StaticPropertyAccess {
        declaring_fqn: Fqn,
        static_property: String,
        target_fqn: Fqn,
    },
    ValueObject {
        struct_fqn: Fqn,
        fields: IndexMap<String, DistRef>,
    },
    Primitive(String),
    NoValue,
    Array(DistRef),
    Map(DistRef),
    Constant(Value),
    Custom(String),
}

/// The content-addressed registry: `fqnSources` maps every FQN to its ways
/// of being produced; `distributions` is the content-addressed table of
/// alternative sources referenced from parameters, struct fields, array and
/// map element types.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionModel {
    pub fqn_sources: IndexMap<Fqn, Vec<FqnSource>>,
    pub distributions: IndexMap<DistId, ValueDistribution>,
}

impl DistributionModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `source` as one more way to produce `fqn`. Order is preserved:
    /// later calls append, which is what gives later-declared alternatives
    /// lower priority in the minimal generator, which picks the first
    /// alternative that succeeds.
    pub fn add_fqn_source(&mut self, fqn: impl Into<Fqn>, source: FqnSource) {
        self.fqn_sources.entry(fqn.into()).or_default().push(source);
    }

    /// Content-addresses `dist`, inserting it if new. Returns the existing
    /// ref if an identical distribution was already recorded (idempotent).
    /// Fails with [`ProgspaceError::HashCollision`] if the computed id is
    /// already bound to a *different* distribution.
    pub fn record_distribution(&mut self, dist: ValueDistribution) -> Result<DistRef> {
        let id = hash_distribution(&dist);
        match self.distributions.get(&id) {
            Some(existing) if existing == &dist => {
                trace!(dist_id = %id, "distribution already recorded (idempotent)");
            }
            Some(_) => return Err(ProgspaceError::HashCollision(id)),
            None => {
                self.distributions.insert(id.clone(), dist);
            }
        }
        Ok(DistRef(id))
    }

    pub fn lookup_dist(&self, r: &DistRef) -> Option<&[ValueSource]> {
        self.distributions.get(&r.0).map(|d| d.0.as_slice())
    }

    pub fn lookup_fqn(&self, fqn: &str) -> Option<&[FqnSource]> {
        self.fqn_sources.get(fqn).map(|v| v.as_slice())
    }

    /// Splats `FqnRef`s into the target fqn's `FqnSource`s and returns the
    /// ordered, fully-resolved alternative list. `sourceIndex` on any
    /// `DistPtr` produced while iterating this list is simply the index
    /// into the returned `Vec`.
    pub fn resolve(&self, r: &DistRef) -> Result<Vec<ResolvedSource>> {
        let sources = self
            .lookup_dist(r)
            .ok_or_else(|| ProgspaceError::NoSourcesInDistribution(r.0.clone()))?;
        let mut resolved = Vec::new();
        for source in sources {
            match source {
                ValueSource::FqnRef(fqn) => {
                    let fqn_sources = self
                        .lookup_fqn(fqn)
                        .ok_or_else(|| ProgspaceError::ModelNotFound(fqn.clone()))?;
                    for fs in fqn_sources {
                        resolved.push(resolved_from_fqn_source(fs));
                    }
                }
                ValueSource::Primitive(name) => resolved.push(ResolvedSource::Primitive(name.clone())),
                ValueSource::NoValue => resolved.push(ResolvedSource::NoValue),
                ValueSource::Array(d) => resolved.push(ResolvedSource::Array(d.clone())),
                ValueSource::Map(d) => resolved.push(ResolvedSource::Map(d.clone())),
                ValueSource::Constant(v) => resolved.push(ResolvedSource::Constant(v.clone())),
                ValueSource::Custom(name) => resolved.push(ResolvedSource::Custom(name.clone())),
            }
        }
        if resolved.is_empty() {
            return Err(ProgspaceError::NoSourcesInDistribution(r.0.clone()));
        }
        Ok(resolved)
    }
}

fn resolved_from_fqn_source(fs: &FqnSource) -> ResolvedSource {
    match fs.clone() {
        FqnSource::ClassInstantiation {
            class_fqn,
            parameters,
        } => ResolvedSource::ClassInstantiation {
            class_fqn,
            parameters,
        },
        FqnSource::StaticMethodCall {
            declaring_fqn,
            static_method,
            target_fqn,
            parameters,
        } => ResolvedSource::StaticMethodCall {
            declaring_fqn,
            static_method,
            target_fqn,
            parameters,
        },
        FqnSource::StaticPropertyAccess {
            declaring_fqn,
            static_property,
            target_fqn,
        } => ResolvedSource::StaticPropertyAccess {
            declaring_fqn,
            static_property,
            target_fqn,
        },
        FqnSource::ValueObject { struct_fqn, fields } => {
            ResolvedSource::ValueObject { struct_fqn, fields }
        }
    }
}

fn hash_distribution(dist: &ValueDistribution) -> DistId {
    let canonical = serde_json::to_vec(dist).expect("ValueDistribution always serializes");
    let mut hasher = DefaultHasher::new();
    canonical.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}
