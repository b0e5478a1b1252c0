// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! CVM precision model
//!
//! Symbolic operator graphs over fixed-width scalar arithmetic. Every node tracks a
//! value term and a precision (bit-width) term, exposes the structural constraints
//! it may assume (`cstr`) and the overflow assertion it must satisfy (`asrt`), and
//! the proof driver checks `cstr => asrt` with Z3.

mod data;
mod error;
pub mod analysis;
pub mod config;
pub mod graph;
pub mod prove;
pub mod registry;
pub mod smt;

// Symbolic terms and formulas (from data/term.rs, data/formula.rs)
pub use data::term::{ArithOp, Term};
pub use data::formula::{CmpOp, Formula};

// Range helpers (from data/interval.rs)
pub use data::interval::{bit_range, in_closed_interval, within_precision};

// Operator graph (from data/node.rs)
pub use data::node::{AddConfig, ClipConfig, Node, NodeKind, VarConfig};

// Domain constants (from data/mod.rs)
pub use data::{
    DEFAULT_ADD_DESTINATION, DEFAULT_CLIP_DESTINATION, INT32_MAX, MAX_PRECISION, NARROW_PRECISION,
    SOLVER_WIDTH,
};

pub use error::ConstructionError;

pub use config::{ConfigError, ProverConfig};
pub use graph::{GraphError, ModelGraph};
pub use prove::{prove, prove_model, ProofOutcome};
pub use registry::{lookup, registered_ops, OpAttrs, OpKind};
pub use smt::{Counterexample, SolverBackend, SolverVerdict, Z3Backend};
