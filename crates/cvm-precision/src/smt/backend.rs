// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Solver boundary

use super::translate::{new_context, SmtContext};
use crate::analysis::free_variables;
use crate::{Formula, ProverConfig};
use std::collections::BTreeMap;
use z3::{SatResult, Solver};

/// Variable bindings witnessing a satisfiable formula
pub type Counterexample = BTreeMap<String, i64>;

/// Result of a satisfiability check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverVerdict {
    Unsat,
    /// Satisfiable, with a binding for every free variable of the formula
    Sat(Counterexample),
    /// The solver gave up, with its reason when it reported one
    Unknown(Option<String>),
}

/// A satisfiability checker for formulas.
///
/// Each call runs in an isolated context: nothing asserted by one check is visible
/// to another.
pub trait SolverBackend {
    fn check(&self, formula: &Formula) -> SolverVerdict;
}

/// Z3-backed solver boundary
#[derive(Debug, Clone, Default)]
pub struct Z3Backend {
    timeout_ms: Option<u64>,
}

impl Z3Backend {
    /// Backend without a timeout
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout_ms: u64) -> Self {
        Self {
            timeout_ms: Some(timeout_ms),
        }
    }

    pub fn from_config(config: &ProverConfig) -> Self {
        Self {
            timeout_ms: config.timeout_ms,
        }
    }

    pub fn timeout_ms(&self) -> Option<u64> {
        self.timeout_ms
    }
}

impl SolverBackend for Z3Backend {
    fn check(&self, formula: &Formula) -> SolverVerdict {
        let ctx = new_context(self.timeout_ms);
        let mut smt = SmtContext::new(&ctx);
        let assertion = smt.translate_formula(formula);

        let solver = Solver::new(&ctx);
        solver.assert(&assertion);
        log::debug!("checking {} free variables", free_variables(formula).len());

        match solver.check() {
            SatResult::Unsat => SolverVerdict::Unsat,
            SatResult::Unknown => SolverVerdict::Unknown(solver.get_reason_unknown()),
            SatResult::Sat => {
                let bindings = match solver.get_model() {
                    Some(model) => smt.evaluate(&model, &free_variables(formula)),
                    None => {
                        log::warn!("solver reported sat without a model");
                        Counterexample::new()
                    }
                };
                SolverVerdict::Sat(bindings)
            }
        }
    }
}
