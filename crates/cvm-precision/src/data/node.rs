// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Operator graph nodes
//!
//! A node is an immutable value: its children, the value and precision terms its
//! kind derives from them, and (for an assigning add or a clip) the derived terms the
//! destination is bound to. `cstr` and `asrt` are computed on demand by a post-order
//! walk over the children.
//!
//! Children are shared, so a node used as input by several parents is stored once.
//! Every node also records which node introduced each free variable of its
//! constraints; two different nodes may never introduce the same name.

use crate::data::formula::Formula;
use crate::data::interval::{in_closed_interval, within_precision};
use crate::data::term::Term;
use crate::data::{
    bound_name, precision_name, DEFAULT_ADD_DESTINATION, DEFAULT_CLIP_DESTINATION, INT32_MAX,
    MAX_PRECISION, NARROW_PRECISION,
};
use crate::error::ConstructionError;
use crate::registry::OpKind;
use std::collections::BTreeMap;
use std::ops;
use std::rc::Rc;

/// Configuration of a variable leaf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarConfig {
    pub name: String,
    /// Fixed precision; `None` leaves it as the free variable `p_<name>`
    pub precision: Option<u32>,
}

/// Configuration of a scalar add
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddConfig {
    /// Destination name used in assign mode, `add` when unset
    pub destination: Option<String>,
    /// Store the result into fresh destination variables bound by equality
    pub assign: bool,
}

impl AddConfig {
    pub fn assign_to(destination: impl Into<String>) -> Self {
        Self {
            destination: Some(destination.into()),
            assign: true,
        }
    }
}

/// Configuration of a clip. The result is always stored into destination variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipConfig {
    /// Destination name, `clip` when unset
    pub destination: Option<String>,
    /// Fixed lower bound; `None` leaves it as the free variable `<destination>_min`
    pub a_min: Option<i64>,
    /// Fixed upper bound; `None` leaves it as the free variable `<destination>_max`
    pub a_max: Option<i64>,
}

impl ClipConfig {
    pub fn bounded(a_min: i64, a_max: i64) -> Self {
        Self {
            destination: None,
            a_min: Some(a_min),
            a_max: Some(a_max),
        }
    }

    pub fn destination(&self) -> &str {
        self.destination
            .as_deref()
            .unwrap_or(DEFAULT_CLIP_DESTINATION)
    }

    fn bound(&self, fixed: Option<i64>, suffix: &str) -> Term {
        match fixed {
            Some(value) => Term::constant(value),
            None => Term::var(bound_name(self.destination(), suffix)),
        }
    }

    pub fn lower(&self) -> Term {
        self.bound(self.a_min, "min")
    }

    pub fn upper(&self) -> Term {
        self.bound(self.a_max, "max")
    }
}

/// Node kinds with their per-kind configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Var(VarConfig),
    Add(AddConfig),
    Sub,
    Mul,
    /// Safe division: the quotient is 0 when the divisor is 0
    Div,
    Clip(ClipConfig),
}

impl NodeKind {
    pub fn op(&self) -> OpKind {
        match self {
            NodeKind::Var(_) => OpKind::Var,
            NodeKind::Add(_) => OpKind::ScalarAdd,
            NodeKind::Sub => OpKind::ScalarSub,
            NodeKind::Mul => OpKind::ScalarMul,
            NodeKind::Div => OpKind::ScalarDiv,
            NodeKind::Clip(_) => OpKind::Clip,
        }
    }

    fn validate(&self) -> Result<(), ConstructionError> {
        if let NodeKind::Clip(config) = self {
            for (attribute, bound) in [("a_min", config.a_min), ("a_max", config.a_max)] {
                if let Some(value) = bound.filter(|v| !(-INT32_MAX..=INT32_MAX).contains(v)) {
                    return Err(ConstructionError::AttributeOutOfRange {
                        op: self.op().name(),
                        attribute,
                        value,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Derived terms an assigned destination is constrained equal to
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Binding {
    value: Term,
    precision: Term,
}

/// What introduced a free variable into a node's constraints
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Origin {
    /// Value of a variable leaf with the given fixed precision
    Leaf(Option<u32>),
    /// Free precision of the named variable leaf
    LeafPrecision(String),
    /// Destination or free bound of an assigning node with this binding
    Assigned(Binding),
}

/// Free variable names and their origins
pub(crate) type Scope = BTreeMap<String, Origin>;

/// Record `name` in `scope`, rejecting it if another origin already claims it.
fn declare(
    scope: &mut Scope,
    op: &'static str,
    name: &str,
    origin: &Origin,
) -> Result<(), ConstructionError> {
    match scope.get(name) {
        Some(existing) if existing != origin => Err(ConstructionError::NameCollision {
            op,
            name: name.to_string(),
        }),
        Some(_) => Ok(()),
        None => {
            scope.insert(name.to_string(), origin.clone());
            Ok(())
        }
    }
}

/// Output of a kind's derivation step, checked before a node is built
#[derive(Debug, Default)]
struct Forward {
    value: Option<Term>,
    precision: Option<Term>,
    assigned: Option<Binding>,
}

impl Forward {
    fn derived(value: Term, precision: Term) -> Self {
        Self {
            value: Some(value),
            precision: Some(precision),
            assigned: None,
        }
    }

    /// Store the derived terms into the destination `name` and `p_<name>`.
    fn assigned(name: &str, value: Term, precision: Term) -> Self {
        Self {
            value: Some(Term::var(name)),
            precision: Some(Term::var(precision_name(name))),
            assigned: Some(Binding { value, precision }),
        }
    }

    fn finish(
        self,
        kind: NodeKind,
        children: Vec<Rc<Node>>,
        scope: Scope,
    ) -> Result<Node, ConstructionError> {
        let op = kind.op().name();
        let value = self.value.ok_or(ConstructionError::MissingValue { op })?;
        let precision = self
            .precision
            .ok_or(ConstructionError::MissingPrecision { op })?;
        Ok(Node {
            kind,
            children,
            value,
            precision,
            assigned: self.assigned,
            scope,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    kind: NodeKind,
    children: Vec<Rc<Node>>,
    value: Term,
    precision: Term,
    assigned: Option<Binding>,
    scope: Scope,
}

impl Node {
    /// Construct a node of `kind` over `children`.
    ///
    /// Checks the input count against the kind's arity and the kind's attributes,
    /// runs the kind's derivation and rejects the node if the derivation left the
    /// value or precision unset, or if a variable it introduces is already in use.
    pub fn new(kind: NodeKind, children: Vec<Rc<Node>>) -> Result<Node, ConstructionError> {
        let op = kind.op();
        if children.len() != op.arity() {
            return Err(ConstructionError::ArityMismatch {
                op: op.name(),
                expected: op.arity(),
                actual: children.len(),
            });
        }
        kind.validate()?;

        let forward = derive(&kind, &children);
        log::trace!("derived {} over {} inputs", op.name(), children.len());

        let mut scope = match &kind {
            NodeKind::Var(config) => leaf_scope(config),
            _ => Scope::new(),
        };
        for child in &children {
            child.declare_into(op.name(), &mut scope)?;
        }
        if let Some(binding) = &forward.assigned {
            let origin = Origin::Assigned(binding.clone());
            for name in introduced_names(&kind) {
                declare(&mut scope, op.name(), &name, &origin)?;
            }
        }
        forward.finish(kind, children, scope)
    }

    /// Variable with a free precision `p_<name>`
    pub fn var(name: impl Into<String>) -> Node {
        Node::leaf(VarConfig {
            name: name.into(),
            precision: None,
        })
    }

    /// Variable with a fixed precision
    pub fn var_with_precision(name: impl Into<String>, precision: u32) -> Node {
        Node::leaf(VarConfig {
            name: name.into(),
            precision: Some(precision),
        })
    }

    fn leaf(config: VarConfig) -> Node {
        let (value, precision) = derive_var(&config);
        let scope = leaf_scope(&config);
        Node {
            kind: NodeKind::Var(config),
            children: Vec::new(),
            value,
            precision,
            assigned: None,
            scope,
        }
    }

    pub fn scalar_add(a: Node, b: Node) -> Result<Node, ConstructionError> {
        Node::scalar_add_with(a, b, AddConfig::default())
    }

    pub fn scalar_add_with(a: Node, b: Node, config: AddConfig) -> Result<Node, ConstructionError> {
        Node::new(NodeKind::Add(config), vec![Rc::new(a), Rc::new(b)])
    }

    pub fn scalar_sub(a: Node, b: Node) -> Result<Node, ConstructionError> {
        Node::new(NodeKind::Sub, vec![Rc::new(a), Rc::new(b)])
    }

    pub fn scalar_mul(a: Node, b: Node) -> Result<Node, ConstructionError> {
        Node::new(NodeKind::Mul, vec![Rc::new(a), Rc::new(b)])
    }

    pub fn scalar_div(a: Node, b: Node) -> Result<Node, ConstructionError> {
        Node::new(NodeKind::Div, vec![Rc::new(a), Rc::new(b)])
    }

    pub fn clip(a: Node, config: ClipConfig) -> Result<Node, ConstructionError> {
        Node::new(NodeKind::Clip(config), vec![Rc::new(a)])
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn op_name(&self) -> &'static str {
        self.kind.op().name()
    }

    pub fn children(&self) -> &[Rc<Node>] {
        &self.children
    }

    pub fn value(&self) -> &Term {
        &self.value
    }

    pub fn precision(&self) -> &Term {
        &self.precision
    }

    /// Whether the node stores its result into fresh destination variables
    pub fn is_assigned(&self) -> bool {
        self.assigned.is_some()
    }

    /// Free variables of this node's constraints, sorted.
    pub fn free_names(&self) -> impl Iterator<Item = &str> {
        self.scope.keys().map(String::as_str)
    }

    /// Add this node's free variables to `scope` on behalf of `op`, failing on the
    /// first name another node already introduced.
    pub(crate) fn declare_into(
        &self,
        op: &'static str,
        scope: &mut Scope,
    ) -> Result<(), ConstructionError> {
        self.scope
            .iter()
            .try_for_each(|(name, origin)| declare(scope, op, name, origin))
    }

    /// Structural constraints: every child's `cstr` followed by this node's own.
    pub fn cstr(&self) -> Formula {
        self.compose(Node::cstr, self.local_cstr())
    }

    /// Overflow assertion: every child's `asrt` followed by this node's own
    /// precision bound. An add or a clip only asserts its own bound.
    pub fn asrt(&self) -> Formula {
        match self.kind {
            NodeKind::Add(_) | NodeKind::Clip(_) => self.local_asrt(),
            _ => self.compose(Node::asrt, self.local_asrt()),
        }
    }

    /// Post-order conjunction of `accessor` over the children with `local` last
    fn compose(&self, accessor: fn(&Node) -> Formula, local: Formula) -> Formula {
        Formula::all(
            self.children
                .iter()
                .map(|child| accessor(child))
                .chain(std::iter::once(local)),
        )
    }

    /// Equalities tying the destination to the derived terms, if assigned
    fn binding_cstr(&self) -> Formula {
        match &self.assigned {
            Some(binding) => Formula::all([
                self.value.clone().eq_to(binding.value.clone()),
                self.precision.clone().eq_to(binding.precision.clone()),
            ]),
            None => Formula::truth(),
        }
    }

    fn local_cstr(&self) -> Formula {
        match (&self.kind, self.children.as_slice()) {
            (NodeKind::Var(_), _) => within_precision(self.value.clone(), self.precision.clone()),
            (NodeKind::Add(_), [a, b]) => Formula::all([
                a.precision.clone().lt(MAX_PRECISION),
                b.precision.clone().lt(MAX_PRECISION),
                self.binding_cstr(),
            ]),
            (NodeKind::Sub | NodeKind::Mul, [a, b]) => Formula::all([
                in_closed_interval(a.precision.clone(), 1i64, NARROW_PRECISION),
                in_closed_interval(b.precision.clone(), 1i64, NARROW_PRECISION),
            ]),
            (NodeKind::Clip(config), [_]) => {
                let free_bounds = [(config.a_min, config.lower()), (config.a_max, config.upper())]
                    .into_iter()
                    .filter(|(fixed, _)| fixed.is_none())
                    .map(|(_, bound)| in_closed_interval(bound, -INT32_MAX, INT32_MAX));
                Formula::all(free_bounds.chain(std::iter::once(self.binding_cstr())))
            }
            _ => Formula::truth(),
        }
    }

    fn local_asrt(&self) -> Formula {
        within_precision(self.value.clone(), self.precision.clone())
    }

    /// Visit this node and all descendants, parents before children. A shared child
    /// is visited once per use.
    pub fn walk(&self, visit: &mut impl FnMut(&Node)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

fn derive_var(config: &VarConfig) -> (Term, Term) {
    let value = Term::var(config.name.as_str());
    let precision = match config.precision {
        Some(bits) => Term::constant(i64::from(bits)),
        None => Term::var(precision_name(&config.name)),
    };
    (value, precision)
}

/// A variable introduces its own name and, when not fixed, its precision
fn leaf_scope(config: &VarConfig) -> Scope {
    let mut scope = Scope::new();
    scope.insert(config.name.clone(), Origin::Leaf(config.precision));
    if config.precision.is_none() {
        scope.insert(
            precision_name(&config.name),
            Origin::LeafPrecision(config.name.clone()),
        );
    }
    scope
}

/// Names an assigning kind introduces: its destination pair and any free bounds
fn introduced_names(kind: &NodeKind) -> Vec<String> {
    match kind {
        NodeKind::Add(config) => {
            let destination = config
                .destination
                .as_deref()
                .unwrap_or(DEFAULT_ADD_DESTINATION);
            vec![destination.to_string(), precision_name(destination)]
        }
        NodeKind::Clip(config) => {
            let destination = config.destination();
            let mut names = vec![destination.to_string(), precision_name(destination)];
            for bound in [config.lower(), config.upper()] {
                if let Some(name) = bound.as_var() {
                    names.push(name.to_string());
                }
            }
            names
        }
        _ => Vec::new(),
    }
}

/// Kind-specific derivation of value and precision from the children
fn derive(kind: &NodeKind, children: &[Rc<Node>]) -> Forward {
    match (kind, children) {
        (NodeKind::Var(config), []) => {
            let (value, precision) = derive_var(config);
            Forward::derived(value, precision)
        }
        (NodeKind::Add(config), [a, b]) => {
            let value = a.value.clone() + b.value.clone();
            let precision = Term::max(a.precision.clone(), b.precision.clone()) + 1;
            if config.assign {
                let destination = config
                    .destination
                    .as_deref()
                    .unwrap_or(DEFAULT_ADD_DESTINATION);
                Forward::assigned(destination, value, precision)
            } else {
                Forward::derived(value, precision)
            }
        }
        (NodeKind::Sub, [a, b]) => Forward::derived(
            a.value.clone() - b.value.clone(),
            Term::max(a.precision.clone(), b.precision.clone()) + 1,
        ),
        (NodeKind::Mul, [a, b]) => Forward::derived(
            a.value.clone() * b.value.clone(),
            a.precision.clone() + b.precision.clone(),
        ),
        (NodeKind::Div, [a, b]) => {
            Forward::derived(a.value.clone().safe_div(b.value.clone()), a.precision.clone())
        }
        (NodeKind::Clip(config), [a]) => {
            let (lower, upper) = (config.lower(), config.upper());
            let value = Term::max(Term::min(a.value.clone(), upper.clone()), lower.clone());
            let range = Term::max(lower.abs(), upper.abs());
            Forward::assigned(config.destination(), value, range.bit_length() + 1)
        }
        _ => Forward::default(),
    }
}

macro_rules! node_operator {
    ($trait:ident, $method:ident, $ctor:ident) => {
        impl ops::$trait for Node {
            type Output = Result<Node, ConstructionError>;

            fn $method(self, rhs: Node) -> Self::Output {
                Node::$ctor(self, rhs)
            }
        }

        impl ops::$trait for &Node {
            type Output = Result<Node, ConstructionError>;

            fn $method(self, rhs: &Node) -> Self::Output {
                Node::$ctor(self.clone(), rhs.clone())
            }
        }
    };
}

node_operator!(Add, add, scalar_add);
node_operator!(Sub, sub, scalar_sub);
node_operator!(Mul, mul, scalar_mul);
node_operator!(Div, div, scalar_div);
