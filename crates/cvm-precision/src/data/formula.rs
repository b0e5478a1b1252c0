// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use crate::data::term::Term;
use itertools::Itertools;
use std::fmt;
use std::ops;

/// Boolean formula over symbolic terms
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Formula {
    Const(bool),
    And(Vec<Formula>),
    Or(Vec<Formula>),
    Not(Box<Formula>),
    Implies(Box<Formula>, Box<Formula>),
    /// Signed comparison of two terms
    Cmp { op: CmpOp, lhs: Term, rhs: Term },
}

/// Comparison operators. Greater-than forms are stored with swapped operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Eq,
    Lt,
    Le,
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
        }
    }
}

impl Formula {
    pub fn truth() -> Self {
        Formula::Const(true)
    }

    pub fn falsity() -> Self {
        Formula::Const(false)
    }

    pub fn is_true(&self) -> bool {
        matches!(self, Formula::Const(true))
    }

    pub fn is_false(&self) -> bool {
        matches!(self, Formula::Const(false))
    }

    /// Conjunction of any number of formulas.
    ///
    /// Nested conjunctions are flattened, `true` conjuncts are dropped and a `false`
    /// conjunct makes the whole conjunction `false`. An empty conjunction is `true`
    /// and a single conjunct is returned as-is.
    pub fn all(items: impl IntoIterator<Item = Formula>) -> Formula {
        let mut conjuncts = Vec::new();
        for item in items {
            match item {
                Formula::Const(true) => {}
                Formula::Const(false) => return Formula::falsity(),
                Formula::And(inner) => conjuncts.extend(inner),
                other => conjuncts.push(other),
            }
        }
        match conjuncts.len() {
            0 => Formula::truth(),
            1 => conjuncts.remove(0),
            _ => Formula::And(conjuncts),
        }
    }

    /// Disjunction of any number of formulas, dual of [`Formula::all`].
    pub fn any(items: impl IntoIterator<Item = Formula>) -> Formula {
        let mut disjuncts = Vec::new();
        for item in items {
            match item {
                Formula::Const(false) => {}
                Formula::Const(true) => return Formula::truth(),
                Formula::Or(inner) => disjuncts.extend(inner),
                other => disjuncts.push(other),
            }
        }
        match disjuncts.len() {
            0 => Formula::falsity(),
            1 => disjuncts.remove(0),
            _ => Formula::Or(disjuncts),
        }
    }

    pub fn implies(self, consequent: Formula) -> Formula {
        Formula::Implies(Box::new(self), Box::new(consequent))
    }
}

impl ops::Not for Formula {
    type Output = Formula;

    fn not(self) -> Formula {
        Formula::Not(Box::new(self))
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formula::Const(b) => write!(f, "{b}"),
            Formula::And(items) if items.is_empty() => write!(f, "true"),
            Formula::And(items) => write!(f, "({})", items.iter().join(" && ")),
            Formula::Or(items) if items.is_empty() => write!(f, "false"),
            Formula::Or(items) => write!(f, "({})", items.iter().join(" || ")),
            Formula::Not(inner) => write!(f, "!{inner}"),
            Formula::Implies(lhs, rhs) => write!(f, "({lhs} => {rhs})"),
            Formula::Cmp { op, lhs, rhs } => write!(f, "({lhs} {} {rhs})", op.symbol()),
        }
    }
}
