// SPDX-License-Identifier: Apache-2.0

//! The Biaser: a policy hook that rewrites an `FqnSource`'s parameters
//! given position context, before it is recorded.
//!
//! Exposed as a capability set keyed by name, so embedders can register
//! additional domain-specific policies alongside the defaults.

use crate::registry::model::{DistributionModel, FqnSource, ParameterSource, ValueSource};
use crate::value::{DistPtr, Primitive, Value};

/// One named bias policy. `bias` is pure with respect to its own inputs
/// but may call into the model to record new distributions for the
/// rewritten source to reference.
pub trait BiasPolicy {
    fn name(&self) -> &'static str;
    fn bias(&self, source: FqnSource, model: &mut DistributionModel) -> FqnSource;
}

/// Ordered chain of bias policies, applied in registration order. Each
/// policy sees the output of the previous one.
pub struct Biaser {
    policies: Vec<Box<dyn BiasPolicy>>,
}

impl Biaser {
    pub fn empty() -> Self {
        Biaser {
            policies: Vec::new(),
        }
    }

    /// The out-of-the-box policies: recognize "scope + id" constructor
    /// shapes and `*arn*`-named parameters.
    pub fn with_defaults() -> Self {
        let mut b = Self::empty();
        b.register(Box::new(ScopeIdBiaser));
        b.register(Box::new(ArnLikeNameBiaser));
        b
    }

    pub fn register(&mut self, policy: Box<dyn BiasPolicy>) {
        self.policies.push(policy);
    }

    pub fn bias(&self, source: FqnSource, model: &mut DistributionModel) -> FqnSource {
        self.policies
            .iter()
            .fold(source, |s, policy| policy.bias(s, model))
    }
}

/// Recognizes the common "construct" constructor shape: a first parameter
/// named `scope` gets the opaque `Custom("scope")` source, and if the
/// following parameter is named `id`, it gets `Custom("constructId")`.
struct ScopeIdBiaser;

impl BiasPolicy for ScopeIdBiaser {
    fn name(&self) -> &'static str {
        "scope_id"
    }

    fn bias(&self, source: FqnSource, model: &mut DistributionModel) -> FqnSource {
        match source {
            FqnSource::ClassInstantiation {
                class_fqn,
                mut parameters,
            } => {
                let scopes_first = parameters
                    .first()
                    .map(|p| p.name == "scope")
                    .unwrap_or(false);
                if scopes_first {
                    parameters[0].dist = custom_dist(model, "scope");
                    if let Some(second) = parameters.get_mut(1) {
                        if second.name == "id" {
                            second.dist = custom_dist(model, "constructId");
                        }
                    }
                }
                FqnSource::ClassInstantiation {
                    class_fqn,
                    parameters,
                }
            }
            other => other,
        }
    }
}

/// Any parameter whose name contains "arn" (case-insensitive) gets a
/// constant-string source instead of the generic primitive distribution,
/// since a freely-generated random string will never pass real ARN
/// validation in the host library.
struct ArnLikeNameBiaser;

impl BiasPolicy for ArnLikeNameBiaser {
    fn name(&self) -> &'static str {
        "arn_name_hint"
    }

    fn bias(&self, source: FqnSource, model: &mut DistributionModel) -> FqnSource {
        match source {
            FqnSource::ClassInstantiation {
                class_fqn,
                mut parameters,
            } => {
                bias_arn_params(&mut parameters, model);
                FqnSource::ClassInstantiation {
                    class_fqn,
                    parameters,
                }
            }
            FqnSource::StaticMethodCall {
                declaring_fqn,
                static_method,
                target_fqn,
                mut parameters,
            } => {
                bias_arn_params(&mut parameters, model);
                FqnSource::StaticMethodCall {
                    declaring_fqn,
                    static_method,
                    target_fqn,
                    parameters,
                }
            }
            other => other,
        }
    }
}

fn bias_arn_params(parameters: &mut [ParameterSource], model: &mut DistributionModel) {
    for p in parameters.iter_mut() {
        if p.name.to_ascii_lowercase().contains("arn") {
            let constant = Value::PrimitiveValue {
                dist_ptr: DistPtr {
                    dist_id: String::new(),
                    source_index: 0,
                },
                payload: Primitive::String(
                    "arn:partition:service:region:account-id:resource-id".to_string(),
                ),
            };
            p.dist = model
                .record_distribution(crate::registry::model::ValueDistribution(vec![
                    ValueSource::Constant(constant),
                ]))
                .expect("constant distribution always records");
        }
    }
}

fn custom_dist(
    model: &mut DistributionModel,
    name: &'static str,
) -> crate::registry::model::DistRef {
    model
        .record_distribution(crate::registry::model::ValueDistribution(vec![
            ValueSource::Custom(name.to_string()),
        ]))
        .expect("custom distribution always records")
}
