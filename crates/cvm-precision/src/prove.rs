// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Proof driver
//!
//! A statement is proved by asking the solver for a model of its negation: no model
//! means the statement holds for every assignment of its free variables.

use crate::smt::{Counterexample, SolverBackend, SolverVerdict};
use crate::{Formula, Node};
use std::fmt::{Display, Formatter};

/// Result of proving a statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofOutcome {
    /// The statement holds for every assignment
    Deterministic,
    /// The model's constraints are contradictory, so the assertion holds vacuously
    VacuouslyDeterministic,
    /// An assignment violating the statement exists
    Undeterministic { counterexample: Counterexample },
    /// The solver could not decide
    Inconclusive { reason: Option<String> },
}

impl ProofOutcome {
    /// Whether the statement was shown to hold
    pub fn is_proved(&self) -> bool {
        matches!(
            self,
            ProofOutcome::Deterministic | ProofOutcome::VacuouslyDeterministic
        )
    }

    pub fn counterexample(&self) -> Option<&Counterexample> {
        match self {
            ProofOutcome::Undeterministic { counterexample } => Some(counterexample),
            _ => None,
        }
    }
}

impl Display for ProofOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ProofOutcome::Deterministic => write!(f, "Success: The model is deterministic"),
            ProofOutcome::VacuouslyDeterministic => write!(
                f,
                "Model cannot be satisfied, so it's proved to be deterministic"
            ),
            ProofOutcome::Undeterministic { counterexample } => {
                write!(f, "Error: The model is undeterministic")?;
                for (name, value) in counterexample {
                    write!(f, "\n{name} = {value}")?;
                }
                Ok(())
            }
            ProofOutcome::Inconclusive { reason } => {
                write!(f, "Error: The model cannot be proved to be deterministic")?;
                if let Some(reason) = reason {
                    write!(f, " ({reason})")?;
                }
                Ok(())
            }
        }
    }
}

/// Prove that `statement` holds for every assignment of its free variables.
pub fn prove(statement: &Formula, backend: &dyn SolverBackend) -> ProofOutcome {
    let negated = !statement.clone();
    let outcome = match backend.check(&negated) {
        SolverVerdict::Unsat => ProofOutcome::Deterministic,
        SolverVerdict::Sat(counterexample) => ProofOutcome::Undeterministic { counterexample },
        SolverVerdict::Unknown(reason) => ProofOutcome::Inconclusive { reason },
    };
    log::debug!("{}", outcome);
    outcome
}

/// Prove that a node's structural constraints imply its overflow assertion.
///
/// Contradictory constraints are detected first and reported without proving the
/// implication.
pub fn prove_model(node: &Node, backend: &dyn SolverBackend, show_props: bool) -> ProofOutcome {
    let cstr = node.cstr();
    if show_props {
        log::info!("Assumption: \n{cstr}\n");
    }
    if let SolverVerdict::Unsat = backend.check(&cstr) {
        let outcome = ProofOutcome::VacuouslyDeterministic;
        log::debug!("{}", outcome);
        return outcome;
    }

    let asrt = node.asrt();
    if show_props {
        log::info!("Assertion: \n{asrt}\n");
    }
    prove(&cstr.implies(asrt), backend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Term;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays canned verdicts and records every formula it was asked about
    struct ScriptedBackend {
        verdicts: RefCell<VecDeque<SolverVerdict>>,
        seen: RefCell<Vec<Formula>>,
    }

    impl ScriptedBackend {
        fn new(verdicts: impl IntoIterator<Item = SolverVerdict>) -> Self {
            Self {
                verdicts: RefCell::new(verdicts.into_iter().collect()),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl SolverBackend for ScriptedBackend {
        fn check(&self, formula: &Formula) -> SolverVerdict {
            self.seen.borrow_mut().push(formula.clone());
            self.verdicts
                .borrow_mut()
                .pop_front()
                .expect("unexpected solver call")
        }
    }

    #[test]
    fn prove_negates_the_statement() {
        let statement = Term::var("x").le(Term::var("x"));
        let backend = ScriptedBackend::new([SolverVerdict::Unsat]);
        assert_eq!(prove(&statement, &backend), ProofOutcome::Deterministic);
        assert_eq!(backend.seen.borrow()[0], !statement);
    }

    #[test]
    fn sat_surfaces_the_counterexample() {
        let cex: Counterexample = [("x".to_string(), 7)].into_iter().collect();
        let backend = ScriptedBackend::new([SolverVerdict::Sat(cex.clone())]);
        let outcome = prove(&Term::var("x").lt(5i64), &backend);
        assert!(!outcome.is_proved());
        assert_eq!(outcome.counterexample(), Some(&cex));
        assert_eq!(
            outcome.to_string(),
            "Error: The model is undeterministic\nx = 7"
        );
    }

    #[test]
    fn unknown_is_never_success() {
        let backend = ScriptedBackend::new([SolverVerdict::Unknown(Some("timeout".into()))]);
        let outcome = prove(&Formula::truth(), &backend);
        assert!(!outcome.is_proved());
        assert_eq!(
            outcome,
            ProofOutcome::Inconclusive {
                reason: Some("timeout".into())
            }
        );
    }

    #[test]
    fn contradictory_constraints_return_early() {
        let node = Node::var("a");
        let backend = ScriptedBackend::new([SolverVerdict::Unsat]);
        let outcome = prove_model(&node, &backend, false);
        assert_eq!(outcome, ProofOutcome::VacuouslyDeterministic);
        assert!(outcome.is_proved());
        assert_eq!(backend.seen.borrow().len(), 1);
        assert_eq!(backend.seen.borrow()[0], node.cstr());
    }

    #[test]
    fn satisfiable_constraints_prove_the_implication() {
        let node = (Node::var("a") + Node::var("b")).unwrap();
        let backend = ScriptedBackend::new([
            SolverVerdict::Sat(Counterexample::new()),
            SolverVerdict::Unsat,
        ]);
        let outcome = prove_model(&node, &backend, true);
        assert_eq!(outcome, ProofOutcome::Deterministic);

        let seen = backend.seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1], !node.cstr().implies(node.asrt()));
    }

    #[test]
    fn unknown_constraint_check_still_proves() {
        let node = Node::var("a");
        let backend = ScriptedBackend::new([SolverVerdict::Unknown(None), SolverVerdict::Unsat]);
        assert_eq!(
            prove_model(&node, &backend, false),
            ProofOutcome::Deterministic
        );
    }
}
