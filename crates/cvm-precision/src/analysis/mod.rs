// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Analysis passes over formulas

mod free_variables;
mod logical_simplification;

pub use free_variables::free_variables;
pub use logical_simplification::simplify;
