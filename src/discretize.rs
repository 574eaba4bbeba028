// SPDX-License-Identifier: Apache-2.0

//! Statement discretization: flattens a nested [`Value`] tree into an
//! ordered list of [`Statement`]s, extracting every nested
//! `ClassInstantiation`/`StaticMethodCall` into a named binding.
//!
//! This is the boundary between the expression IR the Generator/Mutator
//! operate on and the statement-oriented form the Evaluator actually runs:
//! real host libraries are invoked through assignment statements, not
//! through arbitrarily deep nested constructor calls.

use crate::value::Value;

/// One discretized statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `let <name> = <value>;` — `value` is never itself a
    /// `ClassInstantiation`/`StaticMethodCall` with nested instantiations;
    /// those were already extracted into earlier `Assignment`s and replaced
    /// here with `Value::Variable` references.
    Assignment { name: String, value: Value },
    /// A bare expression with no binding, used only for the final
    /// statement when nothing downstream needs to reference its result.
    Expression(Value),
}

/// Flattens `root` into a sequence of statements, in evaluation order.
pub fn discretize(root: Value) -> Vec<Statement> {
    let mut statements = Vec::new();
    let mut counters = std::collections::HashMap::new();
    let top = extract(root, &mut statements, &mut counters);
    collapse_tail(&mut statements, top);
    statements
}

/// Recursively extracts nested instantiations from `value`'s children,
/// emitting an `Assignment` for each and returning a `Value::Variable` (or,
/// for non-instantiation leaves, the value unchanged) that the caller can
/// embed in its own constructor arguments in place of the original.
fn extract(
    value: Value,
    statements: &mut Vec<Statement>,
    counters: &mut std::collections::HashMap<String, usize>,
) -> Value {
    match value {
        Value::ClassInstantiation {
            dist_ptr,
            fqn,
            parameter_names,
            arguments,
        } => {
            let arguments = arguments
                .into_iter()
                .map(|a| extract(a, statements, counters))
                .collect();
            bind(
                Value::ClassInstantiation {
                    dist_ptr,
                    fqn: fqn.clone(),
                    parameter_names,
                    arguments,
                },
                &fqn,
                statements,
                counters,
            )
        }
        Value::StaticMethodCall {
            dist_ptr,
            fqn,
            static_method,
            target_fqn,
            parameter_names,
            arguments,
        } => {
            let arguments = arguments
                .into_iter()
                .map(|a| extract(a, statements, counters))
                .collect();
            bind(
                Value::StaticMethodCall {
                    dist_ptr,
                    fqn,
                    static_method,
                    target_fqn: target_fqn.clone(),
                    parameter_names,
                    arguments,
                },
                &target_fqn,
                statements,
                counters,
            )
        }
        Value::StructLiteral {
            dist_ptr,
            fqn,
            entries,
        } => {
            let entries = entries
                .into_iter()
                .map(|(k, v)| (k, extract(v, statements, counters)))
                .collect();
            Value::StructLiteral {
                dist_ptr,
                fqn,
                entries,
            }
        }
        Value::MapLiteral { dist_ptr, entries } => {
            let entries = entries
                .into_iter()
                .map(|(k, v)| (k, extract(v, statements, counters)))
                .collect();
            Value::MapLiteral { dist_ptr, entries }
        }
        Value::ArrayValue { dist_ptr, elements } => {
            let elements = elements
                .into_iter()
                .map(|e| extract(e, statements, counters))
                .collect();
            Value::ArrayValue { dist_ptr, elements }
        }
        leaf => leaf,
    }
}

/// Emits `built` as its own `Assignment` and returns a `Variable`
/// referencing it, unless `built` is itself the very first thing ever
/// extracted (the eventual top-level statement), which is left untouched
/// here and only turned into a statement by the top-level [`discretize`]
/// call — extraction only ever runs on *children*, so every call into
/// `bind` is for a nested occurrence and always gets its own binding.
fn bind(
    built: Value,
    fqn: &str,
    statements: &mut Vec<Statement>,
    counters: &mut std::collections::HashMap<String, usize>,
) -> Value {
    let base = lcfirst(simple_name(fqn));
    let n = counters.entry(base.clone()).or_insert(1);
    let name = format!("{base}{n}");
    *n += 1;
    statements.push(Statement::Assignment { name: name.clone(), value: built });
    Value::Variable { name }
}

fn simple_name(fqn: &str) -> &str {
    fqn.rsplit('.').next().unwrap_or(fqn)
}

fn lcfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// The final extracted assignment, if it directly defines `top` with no
/// further use, is collapsed back into a bare `Expression`: the generated
/// program's last line is the object under test, not an unused variable.
fn collapse_tail(statements: &mut Vec<Statement>, top: Value) {
    match top {
        Value::Variable { name } => {
            if let Some(Statement::Assignment { name: last_name, .. }) = statements.last() {
                if *last_name == name {
                    if let Some(Statement::Assignment { value, .. }) = statements.pop() {
                        statements.push(Statement::Expression(value));
                    }
                    return;
                }
            }
            statements.push(Statement::Expression(Value::Variable { name }));
        }
        other => statements.push(Statement::Expression(other)),
    }
}
