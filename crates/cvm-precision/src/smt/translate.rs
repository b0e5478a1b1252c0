// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Translation from terms and formulas to Z3 AST

use crate::{ArithOp, CmpOp, Formula, Term, SOLVER_WIDTH};
use std::collections::BTreeMap;
use z3::ast::{Ast, Bool, BV};
use z3::{Config, Context, Model};

/// Bit lengths are counted over the low 32 bits.
const BIT_LENGTH_LIMIT: u32 = 32;

/// SMT context for translating formulas to Z3
pub struct SmtContext<'ctx> {
    pub ctx: &'ctx Context,
    /// Free variables created so far (name -> Z3 constant)
    vars: BTreeMap<String, BV<'ctx>>,
}

impl<'ctx> SmtContext<'ctx> {
    pub fn new(ctx: &'ctx Context) -> Self {
        Self {
            ctx,
            vars: BTreeMap::new(),
        }
    }

    /// The bit-vector constant for a free variable, created on first use
    pub fn var(&mut self, name: &str) -> BV<'ctx> {
        let ctx = self.ctx;
        self.vars
            .entry(name.to_string())
            .or_insert_with(|| BV::new_const(ctx, name, SOLVER_WIDTH))
            .clone()
    }

    /// Translate a term to a 64-bit Z3 bit-vector.
    pub fn translate_term(&mut self, term: &Term) -> BV<'ctx> {
        match term {
            Term::Var(name) => self.var(name),
            Term::Const(value) => BV::from_i64(self.ctx, *value, SOLVER_WIDTH),
            Term::BinOp { op, lhs, rhs } => {
                let l = self.translate_term(lhs);
                let r = self.translate_term(rhs);
                match op {
                    ArithOp::Add => l.bvadd(&r),
                    ArithOp::Sub => l.bvsub(&r),
                    ArithOp::Mul => l.bvmul(&r),
                    ArithOp::Div => l.bvsdiv(&r),
                    ArithOp::Shl => l.bvshl(&r),
                }
            }
            Term::Neg(operand) => self.translate_term(operand).bvneg(),
            Term::BitLength(operand) => {
                let x = self.translate_term(operand);
                self.bit_length(&x)
            }
            Term::Ite {
                cond,
                then_branch,
                else_branch,
            } => {
                let c = self.translate_formula(cond);
                let t = self.translate_term(then_branch);
                let e = self.translate_term(else_branch);
                c.ite(&t, &e)
            }
        }
    }

    /// `sum(k in 0..32, 2^k <= x ? 1 : 0)`, the bit length of `x` for `0 <= x < 2^32`
    fn bit_length(&self, x: &BV<'ctx>) -> BV<'ctx> {
        let zero = BV::from_i64(self.ctx, 0, SOLVER_WIDTH);
        let one = BV::from_i64(self.ctx, 1, SOLVER_WIDTH);
        (0..BIT_LENGTH_LIMIT).fold(zero.clone(), |acc, k| {
            let power = BV::from_i64(self.ctx, 1i64 << k, SOLVER_WIDTH);
            acc.bvadd(&power.bvsle(x).ite(&one, &zero))
        })
    }

    /// Translate a formula to a Z3 boolean. Comparisons are signed.
    pub fn translate_formula(&mut self, formula: &Formula) -> Bool<'ctx> {
        match formula {
            Formula::Const(b) => Bool::from_bool(self.ctx, *b),
            Formula::And(items) => {
                let items: Vec<Bool<'ctx>> =
                    items.iter().map(|f| self.translate_formula(f)).collect();
                let refs: Vec<&Bool<'ctx>> = items.iter().collect();
                Bool::and(self.ctx, &refs)
            }
            Formula::Or(items) => {
                let items: Vec<Bool<'ctx>> =
                    items.iter().map(|f| self.translate_formula(f)).collect();
                let refs: Vec<&Bool<'ctx>> = items.iter().collect();
                Bool::or(self.ctx, &refs)
            }
            Formula::Not(inner) => self.translate_formula(inner).not(),
            Formula::Implies(lhs, rhs) => {
                let l = self.translate_formula(lhs);
                let r = self.translate_formula(rhs);
                l.implies(&r)
            }
            Formula::Cmp { op, lhs, rhs } => {
                let l = self.translate_term(lhs);
                let r = self.translate_term(rhs);
                match op {
                    CmpOp::Eq => l._eq(&r),
                    CmpOp::Lt => l.bvslt(&r),
                    CmpOp::Le => l.bvsle(&r),
                }
            }
        }
    }

    /// Evaluate the named variables in `model`, completing unconstrained ones.
    /// Values are read back as signed 64-bit integers.
    pub fn evaluate<'a>(
        &mut self,
        model: &Model<'ctx>,
        names: impl IntoIterator<Item = &'a String>,
    ) -> BTreeMap<String, i64> {
        let mut bindings = BTreeMap::new();
        for name in names {
            let var = self.var(name);
            match model.eval(&var, true).and_then(|v| v.as_u64()) {
                Some(raw) => {
                    bindings.insert(name.clone(), raw as i64);
                }
                None => log::debug!("no model value for {name}"),
            }
        }
        bindings
    }
}

/// Create a new Z3 config, with an optional timeout in milliseconds
pub fn default_config(timeout_ms: Option<u64>) -> Config {
    let mut cfg = Config::new();
    cfg.set_model_generation(true);
    if let Some(timeout) = timeout_ms {
        cfg.set_timeout_msec(timeout);
    }
    cfg
}

/// Create a new Z3 context
pub fn new_context(timeout_ms: Option<u64>) -> Context {
    Context::new(&default_config(timeout_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use z3::{SatResult, Solver};

    #[test]
    fn reuses_variables_by_name() {
        let ctx = new_context(None);
        let mut smt = SmtContext::new(&ctx);
        let first = smt.var("a");
        let second = smt.var("a");
        assert_eq!(first, second);
        assert_eq!(first.get_size(), SOLVER_WIDTH);
    }

    #[test]
    fn comparisons_are_signed() {
        let ctx = new_context(None);
        let mut smt = SmtContext::new(&ctx);
        let f = smt.translate_formula(&Term::constant(-1).lt(0i64));
        let solver = Solver::new(&ctx);
        solver.assert(&f.not());
        assert_eq!(solver.check(), SatResult::Unsat);
    }

    #[test]
    fn bit_length_counts_significant_bits() {
        let ctx = new_context(None);
        let mut smt = SmtContext::new(&ctx);
        for (value, bits) in [(0i64, 0i64), (1, 1), (5, 3), (255, 8), (256, 9), (2147483647, 31)] {
            let f = smt.translate_formula(&Term::constant(value).bit_length().eq_to(bits));
            let solver = Solver::new(&ctx);
            solver.assert(&f.not());
            assert_eq!(solver.check(), SatResult::Unsat, "bits({value}) != {bits}");
        }
    }

    #[test]
    fn negative_values_round_trip_through_the_model() {
        let ctx = new_context(None);
        let mut smt = SmtContext::new(&ctx);
        let f = smt.translate_formula(&Term::var("x").eq_to(-5i64));
        let solver = Solver::new(&ctx);
        solver.assert(&f);
        assert_eq!(solver.check(), SatResult::Sat);
        let model = solver.get_model().unwrap();
        let names = vec!["x".to_string()];
        let bindings = smt.evaluate(&model, &names);
        assert_eq!(bindings.get("x"), Some(&-5));
    }
}
