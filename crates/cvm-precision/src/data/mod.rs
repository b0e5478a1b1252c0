// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Core data structures for the precision model
//!
//! Terms and formulas are owned values; nodes are built from them and never mutated.
//! Nothing in this module talks to the solver.

pub mod formula;
pub mod interval;
pub mod node;
pub mod term;

/// Bit width of every solver-level integer. This is headroom so that intermediate
/// arithmetic cannot wrap inside the solver; it is not a modeled precision.
pub const SOLVER_WIDTH: u32 = 64;

/// Largest precision any modeled quantity may declare.
pub const MAX_PRECISION: i64 = 32;

/// Operand precision limit for subtraction and multiplication.
pub const NARROW_PRECISION: i64 = 16;

/// Destination name used by an assigning add when none is configured.
pub const DEFAULT_ADD_DESTINATION: &str = "add";

/// Destination name used by a clip when none is configured.
pub const DEFAULT_CLIP_DESTINATION: &str = "clip";

/// Largest magnitude of a clip bound.
pub const INT32_MAX: i64 = i32::MAX as i64;

/// Name of the free precision variable attached to a value named `name`.
pub(crate) fn precision_name(name: &str) -> String {
    format!("p_{name}")
}

/// Name of the free variable standing for a clip bound, e.g. `clip_min`.
pub(crate) fn bound_name(destination: &str, bound: &str) -> String {
    format!("{destination}_{bound}")
}
