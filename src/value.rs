// SPDX-License-Identifier: Apache-2.0

//! The Value IR: a tagged-variant expression tree with structural equality
//! and a diagnostic pretty-printer.
//!
//! Every variant except [`Value::Variable`] carries a [`DistPtr`] recording
//! which distribution and which alternative inside it produced the node.
//! The mutator uses this to find "sibling" alternatives.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::registry::model::{DistId, Fqn};

/// Identifies the distribution and chosen alternative that produced a
/// `Value` node. Stable across a single generation/mutation run; used only
/// to locate siblings, never interpreted by the evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistPtr {
    pub dist_id: DistId,
    pub source_index: usize,
}

/// A primitive payload. `number` is modeled as `i64` (the minimal generator
/// only ever produces small integers, and the mutator's arithmetic family
/// stays integral so structural equality and hashing remain exact); `date`
/// is Unix milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "primitiveKind", content = "value", rename_all = "camelCase")]
pub enum Primitive {
    String(String),
    Number(i64),
    Boolean(bool),
    Date(i64),
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::String(s) => write!(f, "{s:?}"),
            Primitive::Number(n) => write!(f, "{n}"),
            Primitive::Boolean(b) => write!(f, "{b}"),
            Primitive::Date(ms) => write!(f, "Date({ms})"),
        }
    }
}

/// The expression IR. See module docs for an overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Value {
    ClassInstantiation {
        dist_ptr: DistPtr,
        fqn: Fqn,
        parameter_names: Vec<String>,
        arguments: Vec<Value>,
    },
    StaticMethodCall {
        dist_ptr: DistPtr,
        /// FQN of the class declaring the static method.
        fqn: Fqn,
        static_method: String,
        /// FQN of the declared return type.
        target_fqn: Fqn,
        parameter_names: Vec<String>,
        arguments: Vec<Value>,
    },
    StaticPropertyAccess {
        dist_ptr: DistPtr,
        fqn: Fqn,
        static_property: String,
        target_fqn: Fqn,
    },
    StructLiteral {
        dist_ptr: DistPtr,
        fqn: Fqn,
        entries: IndexMap<String, Value>,
    },
    MapLiteral {
        dist_ptr: DistPtr,
        entries: IndexMap<String, Value>,
    },
    ArrayValue {
        dist_ptr: DistPtr,
        elements: Vec<Value>,
    },
    PrimitiveValue {
        dist_ptr: DistPtr,
        payload: Primitive,
    },
    /// Explicit absence; legal only in argument/field positions for
    /// optional parameters.
    NoValue { dist_ptr: DistPtr },
    /// Opaque placeholder for a host-provided root object.
    ScopeValue { dist_ptr: DistPtr },
    /// Reference to an earlier extracted binding. Only present after
    /// statement discretization; deliberately has no `DistPtr`, so it is
    /// excluded from sibling-switching.
    Variable { name: String },
}

impl Value {
    pub fn dist_ptr(&self) -> Option<&DistPtr> {
        match self {
            Value::ClassInstantiation { dist_ptr, .. }
            | Value::StaticMethodCall { dist_ptr, .. }
            | Value::StaticPropertyAccess { dist_ptr, .. }
            | Value::StructLiteral { dist_ptr, .. }
            | Value::MapLiteral { dist_ptr, .. }
            | Value::ArrayValue { dist_ptr, .. }
            | Value::PrimitiveValue { dist_ptr, .. }
            | Value::NoValue { dist_ptr }
            | Value::ScopeValue { dist_ptr } => Some(dist_ptr),
            Value::Variable { .. } => None,
        }
    }

    pub fn is_no_value(&self) -> bool {
        matches!(self, Value::NoValue { .. })
    }

    pub fn is_compound(&self) -> bool {
        matches!(
            self,
            Value::ClassInstantiation { .. } | Value::StaticMethodCall { .. }
        )
    }

    /// Diagnostic pretty-printer: a source-like rendering, not used for
    /// evaluation. Matches CLI verbosity level 2 ("full artifact dumps").
    pub fn pretty(&self) -> String {
        let mut out = String::new();
        self.write_pretty(&mut out);
        out
    }

    fn write_pretty(&self, out: &mut String) {
        match self {
            Value::ClassInstantiation {
                fqn, arguments, ..
            } => {
                out.push_str("new ");
                out.push_str(fqn);
                out.push('(');
                write_args(out, arguments);
                out.push(')');
            }
            Value::StaticMethodCall {
                fqn,
                static_method,
                arguments,
                ..
            } => {
                out.push_str(fqn);
                out.push('.');
                out.push_str(static_method);
                out.push('(');
                write_args(out, arguments);
                out.push(')');
            }
            Value::StaticPropertyAccess {
                fqn,
                static_property,
                ..
            } => {
                out.push_str(fqn);
                out.push('.');
                out.push_str(static_property);
            }
            Value::StructLiteral { entries, .. } => {
                out.push('{');
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(k);
                    out.push_str(": ");
                    v.write_pretty(out);
                }
                out.push('}');
            }
            Value::MapLiteral { entries, .. } => {
                out.push_str("map{");
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(k);
                    out.push_str(": ");
                    v.write_pretty(out);
                }
                out.push('}');
            }
            Value::ArrayValue { elements, .. } => {
                out.push('[');
                write_args(out, elements);
                out.push(']');
            }
            Value::PrimitiveValue { payload, .. } => {
                out.push_str(&payload.to_string());
            }
            Value::NoValue { .. } => out.push_str("<novalue>"),
            Value::ScopeValue { .. } => out.push_str("<scope>"),
            Value::Variable { name } => out.push_str(name),
        }
    }
}

fn write_args(out: &mut String, args: &[Value]) {
    for (i, a) in args.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        a.write_pretty(out);
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pretty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ptr(i: usize) -> DistPtr {
        DistPtr {
            dist_id: "d0".to_string(),
            source_index: i,
        }
    }

    #[test]
    fn equal_values_compare_equal() {
        let a = Value::PrimitiveValue {
            dist_ptr: ptr(0),
            payload: Primitive::String("x".into()),
        };
        let b = a.clone();
        assert_eq!(a, b);
    }

    #[test]
    fn pretty_prints_nested_instantiation() {
        let inner = Value::ClassInstantiation {
            dist_ptr: ptr(0),
            fqn: "M.Inner".into(),
            parameter_names: vec![],
            arguments: vec![],
        };
        let outer = Value::ClassInstantiation {
            dist_ptr: ptr(0),
            fqn: "M.Outer".into(),
            parameter_names: vec!["inner".into()],
            arguments: vec![inner],
        };
        assert_eq!(outer.pretty(), "new M.Outer(new M.Inner())");
    }

    #[test]
    fn round_trip_json() {
        let v = Value::StructLiteral {
            dist_ptr: ptr(2),
            fqn: "M.Props".into(),
            entries: IndexMap::from([(
                "name".to_string(),
                Value::PrimitiveValue {
                    dist_ptr: ptr(0),
                    payload: Primitive::String("hi".into()),
                },
            )]),
        };
        let json = serde_json::to_string(&v).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v, back);
    }
}
