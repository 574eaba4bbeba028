// SPDX-License-Identifier: Apache-2.0

//! The type-registry input contract and the distribution model derived
//! from it (spec §3, §4.1, §4.4).

pub mod extractor;
pub mod model;
pub mod typeinfo;
