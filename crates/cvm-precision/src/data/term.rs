// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use crate::data::formula::{CmpOp, Formula};
use std::fmt;
use std::ops;
use std::rc::Rc;

/// Symbolic integer term over the 64-bit solver domain.
///
/// Subterms are reference counted: derived terms reuse their operands' terms, so a
/// value feeding several nodes is stored once.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// Free variable
    Var(String),

    /// Integer literal
    Const(i64),

    /// Binary arithmetic
    BinOp {
        op: ArithOp,
        lhs: Rc<Term>,
        rhs: Rc<Term>,
    },

    /// Two's complement negation
    Neg(Rc<Term>),

    /// Number of significant bits of a non-negative term below `2^32`; 0 for 0
    BitLength(Rc<Term>),

    /// Conditional term: if cond then then_branch else else_branch
    Ite {
        cond: Rc<Formula>,
        then_branch: Rc<Term>,
        else_branch: Rc<Term>,
    },
}

/// Arithmetic operations on terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    /// Signed division, truncating toward zero
    Div,
    Shl,
}

impl ArithOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Shl => "<<",
        }
    }
}

impl Term {
    pub fn var(name: impl Into<String>) -> Self {
        Term::Var(name.into())
    }

    pub fn constant(value: i64) -> Self {
        Term::Const(value)
    }

    fn binop(op: ArithOp, lhs: Term, rhs: Term) -> Self {
        Term::BinOp {
            op,
            lhs: Rc::new(lhs),
            rhs: Rc::new(rhs),
        }
    }

    pub fn shl(self, amount: impl Into<Term>) -> Self {
        Term::binop(ArithOp::Shl, self, amount.into())
    }

    /// Raw signed division. Division by zero is left to the solver's semantics;
    /// use [`Term::safe_div`] when the divisor may be zero.
    pub fn sdiv(self, divisor: impl Into<Term>) -> Self {
        Term::binop(ArithOp::Div, self, divisor.into())
    }

    /// Signed division that yields 0 when the divisor is 0.
    pub fn safe_div(self, divisor: impl Into<Term>) -> Self {
        let divisor = divisor.into();
        Term::ite(
            divisor.clone().eq_to(0i64),
            Term::constant(0),
            self.sdiv(divisor),
        )
    }

    pub fn ite(cond: Formula, then_branch: Term, else_branch: Term) -> Self {
        Term::Ite {
            cond: Rc::new(cond),
            then_branch: Rc::new(then_branch),
            else_branch: Rc::new(else_branch),
        }
    }

    /// Signed maximum, expressed as `if a > b then a else b`.
    pub fn max(a: Term, b: Term) -> Self {
        Term::ite(a.clone().gt(b.clone()), a, b)
    }

    /// Signed minimum, expressed as `if a > b then b else a`.
    pub fn min(a: Term, b: Term) -> Self {
        Term::ite(a.clone().gt(b.clone()), b, a)
    }

    pub fn abs(self) -> Self {
        Term::ite(self.clone().ge(0i64), self.clone(), -self)
    }

    pub fn bit_length(self) -> Self {
        Term::BitLength(Rc::new(self))
    }

    pub fn as_var(&self) -> Option<&str> {
        match self {
            Term::Var(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_const(&self) -> Option<i64> {
        match self {
            Term::Const(value) => Some(*value),
            _ => None,
        }
    }

    fn cmp(op: CmpOp, lhs: Term, rhs: Term) -> Formula {
        Formula::Cmp { op, lhs, rhs }
    }

    pub fn eq_to(self, rhs: impl Into<Term>) -> Formula {
        Term::cmp(CmpOp::Eq, self, rhs.into())
    }

    pub fn lt(self, rhs: impl Into<Term>) -> Formula {
        Term::cmp(CmpOp::Lt, self, rhs.into())
    }

    pub fn le(self, rhs: impl Into<Term>) -> Formula {
        Term::cmp(CmpOp::Le, self, rhs.into())
    }

    /// `self > rhs`, stored as `rhs < self`
    pub fn gt(self, rhs: impl Into<Term>) -> Formula {
        Term::cmp(CmpOp::Lt, rhs.into(), self)
    }

    /// `self >= rhs`, stored as `rhs <= self`
    pub fn ge(self, rhs: impl Into<Term>) -> Formula {
        Term::cmp(CmpOp::Le, rhs.into(), self)
    }
}

impl From<i64> for Term {
    fn from(value: i64) -> Self {
        Term::Const(value)
    }
}

impl ops::Add for Term {
    type Output = Term;

    fn add(self, rhs: Term) -> Term {
        Term::binop(ArithOp::Add, self, rhs)
    }
}

impl ops::Add<i64> for Term {
    type Output = Term;

    fn add(self, rhs: i64) -> Term {
        Term::binop(ArithOp::Add, self, Term::Const(rhs))
    }
}

impl ops::Sub for Term {
    type Output = Term;

    fn sub(self, rhs: Term) -> Term {
        Term::binop(ArithOp::Sub, self, rhs)
    }
}

impl ops::Sub<i64> for Term {
    type Output = Term;

    fn sub(self, rhs: i64) -> Term {
        Term::binop(ArithOp::Sub, self, Term::Const(rhs))
    }
}

impl ops::Mul for Term {
    type Output = Term;

    fn mul(self, rhs: Term) -> Term {
        Term::binop(ArithOp::Mul, self, rhs)
    }
}

impl ops::Neg for Term {
    type Output = Term;

    fn neg(self) -> Term {
        Term::Neg(Rc::new(self))
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Var(name) => write!(f, "{name}"),
            Term::Const(value) => write!(f, "{value}"),
            Term::BinOp { op, lhs, rhs } => write!(f, "({lhs} {} {rhs})", op.symbol()),
            Term::Neg(operand) => write!(f, "-{operand}"),
            Term::BitLength(operand) => write!(f, "bits({operand})"),
            Term::Ite {
                cond,
                then_branch,
                else_branch,
            } => write!(f, "(if {cond} then {then_branch} else {else_branch})"),
        }
    }
}
