// SPDX-License-Identifier: Apache-2.0

//! The Evaluator: runs a discretized statement list against a real host
//! library (spec §4.8). The reflection mechanism that actually resolves an
//! FQN to a callable is out of scope for this crate — [`HostLibrary`] is
//! the seam an embedder plugs a concrete binding into.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::discretize::Statement;
use crate::error::{ProgspaceError, Result};
use crate::value::{Primitive, Value};

/// An opaque result of running one statement against the host library: a
/// constructed object, a returned value, or nothing (a void static call).
/// The evaluator never inspects this; it only stores and retrieves it by
/// variable name for later statements to pass along.
#[derive(Debug, Clone)]
pub enum HostArtifact {
    Object(serde_json::Value),
    Primitive(Primitive),
    Array(Vec<HostArtifact>),
    Map(IndexMap<String, HostArtifact>),
    Void,
}

/// Abstracts the host library's reflection surface: resolving an FQN to a
/// constructible class or an invocable static member, and invoking it with
/// already-evaluated arguments. An embedder implements this against
/// whatever real class library the generated program targets.
pub trait HostLibrary {
    fn instantiate(&self, fqn: &str, arguments: &[HostArtifact]) -> Result<HostArtifact>;
    fn call_static_method(
        &self,
        fqn: &str,
        method: &str,
        arguments: &[HostArtifact],
    ) -> Result<HostArtifact>;
    fn read_static_property(&self, fqn: &str, property: &str) -> Result<HostArtifact>;
    /// The root object a `ScopeValue` placeholder resolves to, e.g. the
    /// enclosing app/stack the host library expects every construct to be
    /// parented under.
    fn root_scope(&self) -> HostArtifact;
}

/// Runs a discretized program against a [`HostLibrary`]. One `Evaluator`
/// instance is scoped to a single run: variables bind exactly once.
pub struct Evaluator<'h> {
    host: &'h dyn HostLibrary,
    variables: HashMap<String, HostArtifact>,
}

impl<'h> Evaluator<'h> {
    pub fn new(host: &'h dyn HostLibrary) -> Self {
        Evaluator {
            host,
            variables: HashMap::new(),
        }
    }

    /// Runs every statement in order, returning the artifact produced by
    /// the final one.
    pub fn run(&mut self, statements: Vec<Statement>) -> Result<HostArtifact> {
        let mut last = HostArtifact::Void;
        for statement in statements {
            last = match statement {
                Statement::Assignment { name, value } => {
                    let artifact = self.eval(&value)?;
                    self.bind(name, artifact.clone())?;
                    artifact
                }
                Statement::Expression(value) => self.eval(&value)?,
            };
        }
        Ok(last)
    }

    fn bind(&mut self, name: String, artifact: HostArtifact) -> Result<()> {
        if self.variables.contains_key(&name) {
            return Err(ProgspaceError::VariableAlreadyBound(name));
        }
        self.variables.insert(name, artifact);
        Ok(())
    }

    fn lookup(&self, name: &str) -> Result<HostArtifact> {
        self.variables
            .get(name)
            .cloned()
            .ok_or_else(|| ProgspaceError::UnboundVariable(name.to_string()))
    }

    fn eval(&mut self, value: &Value) -> Result<HostArtifact> {
        match value {
            Value::ClassInstantiation {
                fqn, arguments, ..
            } => {
                let args = self.eval_all(arguments)?;
                self.host.instantiate(fqn, &args)
            }
            Value::StaticMethodCall {
                fqn,
                static_method,
                arguments,
                ..
            } => {
                let args = self.eval_all(arguments)?;
                self.host.call_static_method(fqn, static_method, &args)
            }
            Value::StaticPropertyAccess {
                fqn,
                static_property,
                ..
            } => self.host.read_static_property(fqn, static_property),
            Value::StructLiteral { entries, .. } | Value::MapLiteral { entries, .. } => {
                let mut out = IndexMap::new();
                for (k, v) in entries {
                    out.insert(k.clone(), self.eval(v)?);
                }
                Ok(HostArtifact::Map(out))
            }
            Value::ArrayValue { elements, .. } => {
                let items = elements
                    .iter()
                    .map(|e| self.eval(e))
                    .collect::<Result<Vec<_>>>()?;
                Ok(HostArtifact::Array(items))
            }
            Value::PrimitiveValue { payload, .. } => Ok(HostArtifact::Primitive(payload.clone())),
            Value::ScopeValue { .. } => Ok(self.host.root_scope()),
            Value::Variable { name } => self.lookup(name),
            Value::NoValue { .. } => Err(ProgspaceError::NoValueAtEval {
                context: "a NoValue placeholder reached the evaluator directly".to_string(),
            }),
        }
    }

    fn eval_all(&mut self, values: &[Value]) -> Result<Vec<HostArtifact>> {
        // An optional trailing argument that the generator/mutator left as
        // `NoValue` is simply omitted from the call rather than evaluated;
        // only a `NoValue` reached through a non-trailing or otherwise
        // directly-evaluated position is a generator bug (handled by the
        // `NoValueAtEval` arm above).
        values
            .iter()
            .take_while(|v| !v.is_no_value())
            .map(|v| self.eval(v))
            .collect()
    }
}
