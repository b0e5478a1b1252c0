// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use crate::{Formula, Term};
use std::collections::BTreeSet;

/// Names of all free variables in a formula, sorted.
pub fn free_variables(formula: &Formula) -> BTreeSet<String> {
    let mut vars = BTreeSet::new();
    collect_formula(formula, &mut vars);
    vars
}

fn collect_formula(formula: &Formula, vars: &mut BTreeSet<String>) {
    match formula {
        Formula::Const(_) => {}
        Formula::And(items) | Formula::Or(items) => {
            for item in items {
                collect_formula(item, vars);
            }
        }
        Formula::Not(inner) => collect_formula(inner, vars),
        Formula::Implies(lhs, rhs) => {
            collect_formula(lhs, vars);
            collect_formula(rhs, vars);
        }
        Formula::Cmp { lhs, rhs, .. } => {
            collect_term(lhs, vars);
            collect_term(rhs, vars);
        }
    }
}

fn collect_term(term: &Term, vars: &mut BTreeSet<String>) {
    match term {
        Term::Var(name) => {
            vars.insert(name.clone());
        }
        Term::Const(_) => {}
        Term::BinOp { lhs, rhs, .. } => {
            collect_term(lhs, vars);
            collect_term(rhs, vars);
        }
        Term::Neg(operand) | Term::BitLength(operand) => collect_term(operand, vars),
        Term::Ite {
            cond,
            then_branch,
            else_branch,
        } => {
            collect_formula(cond, vars);
            collect_term(then_branch, vars);
            collect_term(else_branch, vars);
        }
    }
}
