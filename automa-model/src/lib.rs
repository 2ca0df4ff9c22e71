//! automa-model: the diagram document edited by AUTOMA.
//!
//! Design rules:
//! - Nodes and transitions are addressed by stable uuid ids, never by index.
//! - Every removal hands back enough to restore the exact previous state.
//! - The document is plain serde data; saving it is a JSON dump.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

pub mod diagram;
pub mod document;

pub use diagram::{Diagram, RemovedNode, RemovedTransition};
pub use document::{load_diagram, save_diagram, DIAGRAM_FILE_EXT};

/// Schema version written into saved diagrams.
pub const DIAGRAM_SCHEMA_VERSION: &str = "1.0";

/// Stable identifier of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub Uuid);

impl NodeId {
    pub fn new() -> Self {
        NodeId(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node:{}", self.0)
    }
}

/// Stable identifier of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitionId(pub Uuid);

impl TransitionId {
    pub fn new() -> Self {
        TransitionId(Uuid::new_v4())
    }
}

impl Default for TransitionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transition:{}", self.0)
    }
}

/// Canvas position in logical pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Round to the nearest multiple of `grid`. A non-positive grid is ignored.
    pub fn snapped(self, grid: f32) -> Self {
        if !(grid > 0.0) {
            return self;
        }
        Self {
            x: (self.x / grid).round() * grid,
            y: (self.y / grid).round() * grid,
        }
    }
}

/// A state of the automaton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub position: Point,
    #[serde(default)]
    pub accepting: bool,
}

impl Node {
    pub fn new(label: impl Into<String>, position: Point) -> Self {
        Self {
            id: NodeId::new(),
            label: label.into(),
            position,
            accepting: false,
        }
    }
}

/// One symbol of a transition label. The empty symbol is the epsilon move.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(pub String);

impl Token {
    pub fn new(symbol: impl Into<String>) -> Self {
        Token(symbol.into())
    }

    pub fn epsilon() -> Self {
        Token(String::new())
    }

    pub fn is_epsilon(&self) -> bool {
        self.0.is_empty()
    }

    pub fn symbol(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_epsilon() {
            f.write_str("ε")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// A directed edge between two nodes, labelled by its tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub id: TransitionId,
    pub source: NodeId,
    pub dest: NodeId,
    #[serde(default)]
    pub tokens: Vec<Token>,
}

impl Transition {
    pub fn new(source: NodeId, dest: NodeId) -> Self {
        Self {
            id: TransitionId::new(),
            source,
            dest,
            tokens: vec![],
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.dest
    }

    /// Label text as drawn next to the arrow.
    pub fn label(&self) -> String {
        self.tokens
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// True if this transition joins the same two nodes as `other`, in either direction.
    pub fn connects_same_nodes(&self, other: &Transition) -> bool {
        (self.source == other.source && self.dest == other.dest)
            || (self.source == other.dest && self.dest == other.source)
    }
}

/// How the canvas should route a transition's arrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeShape {
    /// Source and destination are the same node.
    SelfLoop,
    /// The only transition between its two nodes.
    Straight,
    /// Shares its node pair with another transition, so it bends to stay readable.
    Curved,
}

/// Errors raised by diagram edits.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiagramError {
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("unknown transition: {0}")]
    UnknownTransition(TransitionId),

    #[error("node already exists: {0}")]
    DuplicateNode(NodeId),

    #[error("transition already exists: {0}")]
    DuplicateTransition(TransitionId),

    #[error("transition {transition} already has token `{token}`")]
    DuplicateToken {
        transition: TransitionId,
        token: String,
    },

    #[error("transition {transition} has no token `{token}`")]
    UnknownToken {
        transition: TransitionId,
        token: String,
    },

    #[error("transition {transition} points at missing node {node}")]
    DanglingEndpoint {
        transition: TransitionId,
        node: NodeId,
    },
}
