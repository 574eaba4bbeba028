// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

use crate::registry::model::{DistId, Fqn};

/// Error taxonomy for the whole crate. Every fallible public API returns
/// `Result<T, ProgspaceError>`.
#[derive(Debug, Error)]
pub enum ProgspaceError {
    /// An FQN was looked up in `fqnSources` and is not present. Non-fatal
    /// when merely checking resolvability, fatal when asked to build that
    /// specific FQN as a top-level target.
    #[error("no distribution sources registered for fqn `{0}`")]
    ModelNotFound(Fqn),

    /// A distribution resolved to an empty alternative list.
    #[error("no values in distribution `{0}`")]
    NoSourcesInDistribution(DistId),

    /// Two distinct `ValueDistribution`s hashed to the same `DistId`.
    #[error(
        "hash collision on distribution id `{0}`: stored distribution is not bit-identical to the inserted one; widen the hash"
    )]
    HashCollision(DistId),

    /// A `Custom(name)` source referenced a name with no registered plug-in.
    #[error("no custom distribution registered under name `{0}`")]
    UnknownCustomDistribution(String),

    /// The host library raised while evaluating a statement.
    #[error("evaluation failed: {cause}")]
    EvaluationFailure { cause: String },

    /// The generator produced a `NoValue` in a position that the evaluator
    /// was asked to evaluate directly; indicates a generator bug, never a
    /// user-facing condition.
    #[error("no-value cannot be evaluated (generator bug) at {context}")]
    NoValueAtEval { context: String },

    /// A variable was referenced before being bound, or bound twice.
    #[error("variable `{0}` is unbound")]
    UnboundVariable(String),

    #[error("variable `{0}` is already bound")]
    VariableAlreadyBound(String),

    /// Every alternative in a distribution recursed back onto itself; the
    /// generator had no base case to fall back on. This is the only
    /// externally visible trace of `RecursionBroken` (spec §7): internally
    /// each recursive attempt is silently retried with the next sibling.
    #[error("no options left for fqn `{0}`: every alternative recurses")]
    NoOptionsLeft(Fqn),
}

pub type Result<T> = std::result::Result<T, ProgspaceError>;
