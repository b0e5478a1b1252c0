// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Node construction errors

use thiserror::Error;

/// A node could not be constructed. These indicate a defect in how a graph was
/// assembled, never a property of the modeled arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    #[error("operator {op} only accepts nodes as inputs, input {position} is a {found}")]
    InvalidChildType {
        op: &'static str,
        position: usize,
        found: String,
    },

    #[error("operator {op} expects {expected} inputs, got {actual}")]
    ArityMismatch {
        op: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("operator {op} did not set a value in its derivation")]
    MissingValue { op: &'static str },

    #[error("operator {op} did not set a precision in its derivation")]
    MissingPrecision { op: &'static str },

    #[error("operator {op} requires attribute `{attribute}`")]
    MissingAttribute {
        op: &'static str,
        attribute: &'static str,
    },

    #[error("operator {op} does not accept attribute `{attribute}`")]
    UnexpectedAttribute {
        op: &'static str,
        attribute: &'static str,
    },

    #[error("operator {op}: attribute `{attribute}` = {value} is outside [-2147483647, 2147483647]")]
    AttributeOutOfRange {
        op: &'static str,
        attribute: &'static str,
        value: i64,
    },

    #[error("operator {op}: variable `{name}` is already introduced by another node")]
    NameCollision { op: &'static str, name: String },
}
