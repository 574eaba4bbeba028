// SPDX-License-Identifier: Apache-2.0

//! A program-space exploration engine: given a registry of a host class
//! library's constructible shapes, build the smallest valid expression for
//! a target type, explore its neighborhood via single-point mutation, and
//! (optionally) run the result against the real library.
//!
//! The four moving pieces, wired together by this crate root:
//!
//! - [`registry`] turns a normalized type registry into a content-addressed
//!   [`registry::model::DistributionModel`] (the Distribution Extractor,
//!   biased by [`biaser::Biaser`]).
//! - [`generator::Generator`] builds the smallest [`value::Value`] for a
//!   target FQN.
//! - [`mutator::Mutator`] samples single-point edits of an existing value
//!   via the immutable [`zipper::Zipper`].
//! - [`discretize`] flattens a value into statements, which
//!   [`evaluator::Evaluator`] can run against a [`evaluator::HostLibrary`].

pub mod biaser;
pub mod custom;
pub mod discretize;
pub mod error;
pub mod evaluator;
pub mod generator;
pub mod mutator;
pub mod random;
pub mod registry;
pub mod value;
pub mod zipper;

pub use biaser::Biaser;
pub use custom::{CustomDistributionRegistry, DEFAULT_CUSTOM_DISTRIBUTIONS};
pub use discretize::{discretize, Statement};
pub use error::{ProgspaceError, Result};
pub use evaluator::{Evaluator, HostArtifact, HostLibrary};
pub use generator::Generator;
pub use mutator::Mutator;
pub use random::Random;
pub use registry::extractor::extract_distributions;
pub use registry::model::DistributionModel;
pub use registry::typeinfo::TypeRegistry;
pub use value::Value;
pub use zipper::Zipper;
