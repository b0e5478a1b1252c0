// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Model graphs described in TOML
//!
//! Nodes are declared in order and instantiated through the operator registry.
//! Inputs name earlier nodes; a node used by several others is shared, not copied.
//! No two nodes of a graph may introduce the same free variable:
//!
//! ```toml
//! root = "c"
//!
//! [[node]]
//! name = "a"
//! op = "var"
//! precision = 8
//!
//! [[node]]
//! name = "b"
//! op = "var"
//!
//! [[node]]
//! name = "c"
//! op = "scalar_add"
//! inputs = ["a", "b"]
//! assign = true
//! ```

use crate::data::node::Scope;
use crate::error::ConstructionError;
use crate::registry::{lookup, OpAttrs, OpKind};
use crate::Node;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("node `{node}` uses unknown operator `{op}`")]
    UnknownOperator { node: String, op: String },

    #[error("node `{node}` references undefined node `{input}`")]
    UnknownNode { node: String, input: String },

    #[error("node `{0}` is declared more than once")]
    DuplicateNode(String),

    #[error("graph declares no nodes")]
    Empty,

    #[error("root `{0}` is not a declared node")]
    UnknownRoot(String),

    #[error("node `{node}`: {source}")]
    Construction {
        node: String,
        #[source]
        source: ConstructionError,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GraphFile {
    root: Option<String>,
    #[serde(default)]
    node: Vec<NodeDecl>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NodeDecl {
    name: String,
    op: String,
    #[serde(default)]
    inputs: Vec<toml::Value>,
    precision: Option<u32>,
    #[serde(default)]
    assign: bool,
    destination: Option<String>,
    a_min: Option<i64>,
    a_max: Option<i64>,
}

impl NodeDecl {
    fn attrs(&self, op: OpKind) -> OpAttrs {
        // Assigning nodes store into variables named after the node unless told otherwise.
        let destination = match (&self.destination, op) {
            (Some(destination), _) => Some(destination.clone()),
            (None, OpKind::ScalarAdd) if self.assign => Some(self.name.clone()),
            (None, OpKind::Clip) => Some(self.name.clone()),
            (None, _) => None,
        };
        OpAttrs {
            name: (op == OpKind::Var).then(|| self.name.clone()),
            precision: self.precision,
            assign: self.assign,
            destination,
            a_min: self.a_min,
            a_max: self.a_max,
        }
    }
}

/// A named collection of nodes with a distinguished root
#[derive(Debug, Clone)]
pub struct ModelGraph {
    nodes: BTreeMap<String, Rc<Node>>,
    order: Vec<String>,
    root: String,
}

impl ModelGraph {
    pub fn from_toml_str(source: &str) -> Result<Self, GraphError> {
        let file: GraphFile = toml::from_str(source)?;
        Self::build(file)
    }

    pub fn load(path: &Path) -> Result<Self, GraphError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    fn build(file: GraphFile) -> Result<Self, GraphError> {
        let mut nodes: BTreeMap<String, Rc<Node>> = BTreeMap::new();
        let mut order = Vec::with_capacity(file.node.len());
        let mut names = Scope::new();

        for decl in &file.node {
            if nodes.contains_key(&decl.name) {
                return Err(GraphError::DuplicateNode(decl.name.clone()));
            }
            let op = lookup(&decl.op).ok_or_else(|| GraphError::UnknownOperator {
                node: decl.name.clone(),
                op: decl.op.clone(),
            })?;
            let construction = |source| GraphError::Construction {
                node: decl.name.clone(),
                source,
            };

            let mut children = Vec::with_capacity(decl.inputs.len());
            for (position, input) in decl.inputs.iter().enumerate() {
                let toml::Value::String(input) = input else {
                    return Err(construction(ConstructionError::InvalidChildType {
                        op: op.name(),
                        position,
                        found: input.type_str().to_string(),
                    }));
                };
                let child = nodes.get(input).ok_or_else(|| GraphError::UnknownNode {
                    node: decl.name.clone(),
                    input: input.clone(),
                })?;
                children.push(Rc::clone(child));
            }

            let node = op
                .construct(children, &decl.attrs(op))
                .map_err(construction)?;
            node.declare_into(op.name(), &mut names)
                .map_err(construction)?;
            log::debug!("built node `{}` ({})", decl.name, op);
            nodes.insert(decl.name.clone(), Rc::new(node));
            order.push(decl.name.clone());
        }

        let root = match file.root {
            Some(root) if nodes.contains_key(&root) => root,
            Some(root) => return Err(GraphError::UnknownRoot(root)),
            None => order.last().cloned().ok_or(GraphError::Empty)?,
        };

        Ok(Self { nodes, order, root })
    }

    pub fn root_name(&self) -> &str {
        &self.root
    }

    pub fn root(&self) -> &Node {
        &self.nodes[&self.root]
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name).map(Rc::as_ref)
    }

    /// Re-root the graph at another declared node.
    pub fn with_root(mut self, name: &str) -> Result<Self, GraphError> {
        if !self.nodes.contains_key(name) {
            return Err(GraphError::UnknownRoot(name.to_string()));
        }
        self.root = name.to_string();
        Ok(self)
    }

    /// Node names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AddConfig, ClipConfig, Term};

    const ADD_GRAPH: &str = r#"
[[node]]
name = "a"
op = "var"

[[node]]
name = "b"
op = "var"
precision = 8

[[node]]
name = "c"
op = "scalar_add"
inputs = ["a", "b"]
"#;

    #[test]
    fn builds_in_declaration_order() {
        let graph = ModelGraph::from_toml_str(ADD_GRAPH).unwrap();
        assert_eq!(graph.names().collect::<Vec<_>>(), ["a", "b", "c"]);
        assert_eq!(graph.root_name(), "c");
        assert_eq!(graph.node("b").unwrap().precision(), &Term::constant(8));

        let direct =
            Node::scalar_add(Node::var("a"), Node::var_with_precision("b", 8)).unwrap();
        assert_eq!(graph.root(), &direct);
    }

    #[test]
    fn assign_defaults_destination_to_node_name() {
        let source = ADD_GRAPH.to_string() + "assign = true\n";
        let graph = ModelGraph::from_toml_str(&source).unwrap();
        let direct = Node::scalar_add_with(
            Node::var("a"),
            Node::var_with_precision("b", 8),
            AddConfig::assign_to("c"),
        )
        .unwrap();
        assert_eq!(graph.root(), &direct);
    }

    #[test]
    fn explicit_root_and_reroot() {
        let source = format!("root = \"a\"\n{ADD_GRAPH}");
        let graph = ModelGraph::from_toml_str(&source).unwrap();
        assert_eq!(graph.root_name(), "a");
        let graph = graph.with_root("c").unwrap();
        assert_eq!(graph.root().op_name(), "scalar_add");
        assert!(matches!(
            graph.with_root("z"),
            Err(GraphError::UnknownRoot(name)) if name == "z"
        ));
    }

    #[test]
    fn non_node_input_is_invalid_child_type() {
        let source = r#"
[[node]]
name = "a"
op = "var"

[[node]]
name = "c"
op = "scalar_add"
inputs = ["a", 3]
"#;
        let err = ModelGraph::from_toml_str(source).unwrap_err();
        let GraphError::Construction { node, source } = err else {
            panic!("expected a construction error, got {err}");
        };
        assert_eq!(node, "c");
        assert_eq!(
            source,
            ConstructionError::InvalidChildType {
                op: "scalar_add",
                position: 1,
                found: "integer".to_string(),
            }
        );
    }

    #[test]
    fn reports_graph_defects() {
        let unknown_op = "[[node]]\nname = \"a\"\nop = \"scalar_pow\"\n";
        assert!(matches!(
            ModelGraph::from_toml_str(unknown_op),
            Err(GraphError::UnknownOperator { .. })
        ));

        let unknown_input = "[[node]]\nname = \"c\"\nop = \"scalar_sub\"\ninputs = [\"a\", \"b\"]\n";
        assert!(matches!(
            ModelGraph::from_toml_str(unknown_input),
            Err(GraphError::UnknownNode { input, .. }) if input == "a"
        ));

        let duplicate = "[[node]]\nname = \"a\"\nop = \"var\"\n[[node]]\nname = \"a\"\nop = \"var\"\n";
        assert!(matches!(
            ModelGraph::from_toml_str(duplicate),
            Err(GraphError::DuplicateNode(name)) if name == "a"
        ));

        assert!(matches!(ModelGraph::from_toml_str(""), Err(GraphError::Empty)));
    }

    #[test]
    fn arity_is_checked() {
        let source = "[[node]]\nname = \"a\"\nop = \"var\"\n[[node]]\nname = \"n\"\nop = \"scalar_mul\"\ninputs = [\"a\"]\n";
        let err = ModelGraph::from_toml_str(source).unwrap_err();
        assert!(matches!(
            err,
            GraphError::Construction {
                source: ConstructionError::ArityMismatch { expected: 2, actual: 1, .. },
                ..
            }
        ));
    }

    #[test]
    fn destination_may_not_reuse_a_declared_variable() {
        let source = r#"
[[node]]
name = "a"
op = "var"

[[node]]
name = "b"
op = "var"

[[node]]
name = "c"
op = "scalar_add"
inputs = ["a", "b"]
assign = true
destination = "a"
"#;
        let err = ModelGraph::from_toml_str(source).unwrap_err();
        assert!(matches!(
            err,
            GraphError::Construction {
                node,
                source: ConstructionError::NameCollision { name, .. },
            } if node == "c" && name == "a"
        ));
    }

    #[test]
    fn variable_may_not_be_named_after_another_precision() {
        // The two nodes are never combined; the names still clash in the graph.
        let source = "[[node]]\nname = \"a\"\nop = \"var\"\n[[node]]\nname = \"p_a\"\nop = \"var\"\n";
        let err = ModelGraph::from_toml_str(source).unwrap_err();
        assert!(matches!(
            err,
            GraphError::Construction {
                node,
                source: ConstructionError::NameCollision { name, .. },
            } if node == "p_a" && name == "p_a"
        ));
    }

    #[test]
    fn clip_destination_defaults_to_node_name() {
        let source = r#"
[[node]]
name = "x"
op = "var"

[[node]]
name = "y"
op = "clip"
inputs = ["x"]
a_min = -10
a_max = 10
"#;
        let graph = ModelGraph::from_toml_str(source).unwrap();
        let direct = Node::clip(
            Node::var("x"),
            ClipConfig {
                destination: Some("y".to_string()),
                ..ClipConfig::bounded(-10, 10)
            },
        )
        .unwrap();
        assert_eq!(graph.root(), &direct);
        assert_eq!(graph.root().value(), &Term::var("y"));
    }

    #[test]
    fn reused_inputs_are_shared() {
        let mut source = String::from("[[node]]\nname = \"x0\"\nop = \"var\"\nprecision = 1\n");
        for i in 1..=64 {
            source += &format!(
                "[[node]]\nname = \"x{i}\"\nop = \"scalar_add\"\ninputs = [\"x{prev}\", \"x{prev}\"]\n",
                prev = i - 1
            );
        }
        let graph = ModelGraph::from_toml_str(&source).unwrap();
        assert_eq!(graph.root_name(), "x64");

        let root = graph.root();
        assert!(Rc::ptr_eq(&root.children()[0], &root.children()[1]));
        let x63 = graph.node("x63").unwrap();
        assert!(std::ptr::eq(root.children()[0].as_ref(), x63));
    }
}
