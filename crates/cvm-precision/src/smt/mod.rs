// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! SMT solving for precision formulas
//!
//! This module is the only place that talks to Z3:
//! - Translation from terms and formulas to Z3 bit-vector ASTs
//! - The solver boundary used by the proof driver

mod backend;
mod translate;

pub use backend::{Counterexample, SolverBackend, SolverVerdict, Z3Backend};
pub use translate::{default_config, new_context, SmtContext};
