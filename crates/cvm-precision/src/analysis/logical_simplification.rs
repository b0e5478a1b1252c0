// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Logical simplification pass for formulas.
//!
//! Simplifies boolean structure using algebraic rules, bottom-up. Terms are left
//! untouched apart from comparisons whose operands are identical or both literals.
//!
//! Simplifications include:
//! - Double negation: ¬¬x → x
//! - Boolean identity: true ∧ x → x, false ∨ x → x, false ∧ x → false
//! - Flattening of nested conjunctions and disjunctions, dropping duplicates
//! - Implication: true ⇒ x → x, false ⇒ x → true, x ⇒ true → true, x ⇒ false → ¬x
//! - Reflexive comparisons: x == x → true, x <= x → true, x < x → false

use crate::{CmpOp, Formula, Term};
use itertools::Itertools;

/// Simplify a formula while preserving its meaning.
pub fn simplify(formula: Formula) -> Formula {
    match formula {
        Formula::Const(_) => formula,
        Formula::And(items) => simplify_and(items),
        Formula::Or(items) => simplify_or(items),
        Formula::Not(inner) => simplify_not(simplify(*inner)),
        Formula::Implies(lhs, rhs) => simplify_implies(simplify(*lhs), simplify(*rhs)),
        Formula::Cmp { op, lhs, rhs } => simplify_cmp(op, lhs, rhs),
    }
}

fn simplify_and(items: Vec<Formula>) -> Formula {
    let items: Vec<Formula> = items.into_iter().map(simplify).collect();
    if items.iter().any(Formula::is_false) {
        return Formula::falsity();
    }
    let flat = Formula::all(items);
    match flat {
        Formula::And(conjuncts) => Formula::And(conjuncts.into_iter().unique().collect()),
        other => other,
    }
}

fn simplify_or(items: Vec<Formula>) -> Formula {
    let items: Vec<Formula> = items.into_iter().map(simplify).collect();
    if items.iter().any(Formula::is_true) {
        return Formula::truth();
    }
    let flat = Formula::any(items);
    match flat {
        Formula::Or(disjuncts) => Formula::Or(disjuncts.into_iter().unique().collect()),
        other => other,
    }
}

fn simplify_not(inner: Formula) -> Formula {
    match inner {
        // ¬true → false, ¬false → true
        Formula::Const(b) => Formula::Const(!b),
        // ¬¬x → x
        Formula::Not(x) => *x,
        other => !other,
    }
}

fn simplify_implies(lhs: Formula, rhs: Formula) -> Formula {
    match (lhs, rhs) {
        (Formula::Const(true), rhs) => rhs,
        (Formula::Const(false), _) | (_, Formula::Const(true)) => Formula::truth(),
        (lhs, Formula::Const(false)) => simplify_not(lhs),
        (lhs, rhs) => lhs.implies(rhs),
    }
}

fn simplify_cmp(op: CmpOp, lhs: Term, rhs: Term) -> Formula {
    if let (Some(l), Some(r)) = (lhs.as_const(), rhs.as_const()) {
        return Formula::Const(match op {
            CmpOp::Eq => l == r,
            CmpOp::Lt => l < r,
            CmpOp::Le => l <= r,
        });
    }
    if lhs == rhs {
        return Formula::Const(op != CmpOp::Lt);
    }
    Formula::Cmp { op, lhs, rhs }
}
