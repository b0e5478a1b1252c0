// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Operator registry
//!
//! Maps canonical operator names to the closed set of node kinds. The table is built
//! once on first use and never changes afterwards.

use crate::data::node::{AddConfig, ClipConfig, Node, NodeKind, VarConfig};
use crate::error::ConstructionError;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Registered operator kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OpKind {
    Var,
    ScalarAdd,
    ScalarSub,
    ScalarMul,
    ScalarDiv,
    Clip,
}

impl OpKind {
    pub const ALL: [OpKind; 6] = [
        OpKind::Var,
        OpKind::ScalarAdd,
        OpKind::ScalarSub,
        OpKind::ScalarMul,
        OpKind::ScalarDiv,
        OpKind::Clip,
    ];

    /// Canonical registry name
    pub fn name(self) -> &'static str {
        match self {
            OpKind::Var => "var",
            OpKind::ScalarAdd => "scalar_add",
            OpKind::ScalarSub => "scalar_sub",
            OpKind::ScalarMul => "scalar_mul",
            OpKind::ScalarDiv => "scalar_div",
            OpKind::Clip => "clip",
        }
    }

    /// Number of child nodes the operator takes
    pub fn arity(self) -> usize {
        match self {
            OpKind::Var => 0,
            OpKind::Clip => 1,
            OpKind::ScalarAdd | OpKind::ScalarSub | OpKind::ScalarMul | OpKind::ScalarDiv => 2,
        }
    }

    /// Build the typed node configuration from loosely typed attributes.
    pub fn configure(self, attrs: &OpAttrs) -> Result<NodeKind, ConstructionError> {
        let op = self.name();
        if self != OpKind::Var && attrs.precision.is_some() {
            return Err(ConstructionError::UnexpectedAttribute {
                op,
                attribute: "precision",
            });
        }
        if self != OpKind::ScalarAdd && attrs.assign {
            return Err(ConstructionError::UnexpectedAttribute {
                op,
                attribute: "assign",
            });
        }
        if !matches!(self, OpKind::ScalarAdd | OpKind::Clip) && attrs.destination.is_some() {
            return Err(ConstructionError::UnexpectedAttribute {
                op,
                attribute: "destination",
            });
        }
        if self != OpKind::Clip {
            for (attribute, value) in [("a_min", attrs.a_min), ("a_max", attrs.a_max)] {
                if value.is_some() {
                    return Err(ConstructionError::UnexpectedAttribute { op, attribute });
                }
            }
        }

        Ok(match self {
            OpKind::Var => {
                let name = attrs.name.clone().ok_or(ConstructionError::MissingAttribute {
                    op,
                    attribute: "name",
                })?;
                NodeKind::Var(VarConfig {
                    name,
                    precision: attrs.precision,
                })
            }
            OpKind::ScalarAdd => NodeKind::Add(AddConfig {
                destination: attrs.destination.clone(),
                assign: attrs.assign,
            }),
            OpKind::ScalarSub => NodeKind::Sub,
            OpKind::ScalarMul => NodeKind::Mul,
            OpKind::ScalarDiv => NodeKind::Div,
            OpKind::Clip => NodeKind::Clip(ClipConfig {
                destination: attrs.destination.clone(),
                a_min: attrs.a_min,
                a_max: attrs.a_max,
            }),
        })
    }

    /// Construct a node of this kind.
    pub fn construct(
        self,
        children: Vec<Rc<Node>>,
        attrs: &OpAttrs,
    ) -> Result<Node, ConstructionError> {
        Node::new(self.configure(attrs)?, children)
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Attributes for constructing a node by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpAttrs {
    /// Variable name (`var` only)
    pub name: Option<String>,
    /// Fixed precision (`var` only)
    pub precision: Option<u32>,
    /// Assign mode (`scalar_add` only)
    pub assign: bool,
    /// Destination (`scalar_add` in assign mode, `clip`)
    pub destination: Option<String>,
    /// Lower clip bound (`clip` only)
    pub a_min: Option<i64>,
    /// Upper clip bound (`clip` only)
    pub a_max: Option<i64>,
}

impl OpAttrs {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

static REGISTRY: Lazy<BTreeMap<&'static str, OpKind>> = Lazy::new(|| {
    let table: BTreeMap<_, _> = OpKind::ALL.iter().map(|op| (op.name(), *op)).collect();
    debug_assert_eq!(table.len(), OpKind::ALL.len(), "duplicate operator name");
    log::debug!("operator registry: {:?}", table.keys().collect::<Vec<_>>());
    table
});

/// Look up an operator kind by its registered name.
pub fn lookup(name: &str) -> Option<OpKind> {
    REGISTRY.get(name).copied()
}

/// All registered operators, ordered by name.
pub fn registered_ops() -> impl Iterator<Item = (&'static str, OpKind)> {
    REGISTRY.iter().map(|(name, op)| (*name, *op))
}
