// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Range predicates shared by every node kind

use crate::data::formula::Formula;
use crate::data::term::Term;
use crate::data::MAX_PRECISION;

/// `lo <= x && x <= hi`
pub fn in_closed_interval(x: Term, lo: impl Into<Term>, hi: impl Into<Term>) -> Formula {
    Formula::all([x.clone().ge(lo), x.le(hi)])
}

/// Largest magnitude representable with `precision` bits in the symmetric
/// two's complement range: `(1 << (precision - 1)) - 1`.
pub fn bit_range(precision: Term) -> Term {
    Term::constant(1).shl(precision - 1) - 1
}

/// `precision ∈ [1, 32] && value ∈ [-range, range]`
pub fn within_precision(value: Term, precision: Term) -> Formula {
    let range = bit_range(precision.clone());
    Formula::all([
        in_closed_interval(precision, 1i64, MAX_PRECISION),
        in_closed_interval(value, -range.clone(), range),
    ])
}
