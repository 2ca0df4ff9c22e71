// The diagram document: nodes, transitions and their tokens.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::{
    DiagramError, EdgeShape, Node, NodeId, Point, Token, Transition, TransitionId,
    DIAGRAM_SCHEMA_VERSION,
};

/// A node taken out of the diagram, together with everything needed to put it back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovedNode {
    pub index: usize,
    pub node: Node,
    pub was_initial: bool,
    /// Incident transitions, in ascending order of their former index.
    pub transitions: Vec<RemovedTransition>,
}

/// A transition taken out of the diagram and its former position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovedTransition {
    pub index: usize,
    pub transition: Transition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagram {
    pub diagram_id: Uuid,
    pub schema_version: String,
    pub nodes: Vec<Node>,
    pub transitions: Vec<Transition>,
    #[serde(default)]
    pub initial: Option<NodeId>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Default for Diagram {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagram {
    pub fn new() -> Self {
        let diagram_id = Uuid::new_v4();
        info!("Creating new diagram {}", diagram_id);
        Self {
            diagram_id,
            schema_version: DIAGRAM_SCHEMA_VERSION.to_string(),
            nodes: vec![],
            transitions: vec![],
            initial: None,
            notes: None,
        }
    }

    // Nodes

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, DiagramError> {
        self.nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(DiagramError::UnknownNode(id))
    }

    fn node_index(&self, id: NodeId) -> Result<usize, DiagramError> {
        self.nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or(DiagramError::UnknownNode(id))
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Create a node and return its id.
    pub fn add_node(&mut self, label: impl Into<String>, position: Point) -> NodeId {
        let node = Node::new(label, position);
        let id = node.id;
        debug!("Adding node {} '{}' at {:?}", id, node.label, position);
        self.nodes.push(node);
        id
    }

    /// Insert a fully formed node, keeping its id.
    pub fn insert_node(&mut self, node: Node) -> Result<(), DiagramError> {
        if self.contains_node(node.id) {
            warn!("Refusing to insert duplicate node {}", node.id);
            return Err(DiagramError::DuplicateNode(node.id));
        }
        debug!("Inserting node {} '{}'", node.id, node.label);
        self.nodes.push(node);
        Ok(())
    }

    /// Remove a node and every transition touching it.
    pub fn remove_node(&mut self, id: NodeId) -> Result<RemovedNode, DiagramError> {
        let index = self.node_index(id)?;

        let mut transitions = vec![];
        let mut kept = Vec::with_capacity(self.transitions.len());
        for (i, t) in self.transitions.drain(..).enumerate() {
            if t.source == id || t.dest == id {
                transitions.push(RemovedTransition {
                    index: i,
                    transition: t,
                });
            } else {
                kept.push(t);
            }
        }
        self.transitions = kept;

        let node = self.nodes.remove(index);
        let was_initial = self.initial == Some(id);
        if was_initial {
            self.initial = None;
        }

        debug!(
            "Removed node {} with {} incident transition(s)",
            id,
            transitions.len()
        );
        Ok(RemovedNode {
            index,
            node,
            was_initial,
            transitions,
        })
    }

    /// Undo a [`Diagram::remove_node`], restoring positions in both lists.
    pub fn restore_node(&mut self, removed: RemovedNode) -> Result<(), DiagramError> {
        let RemovedNode {
            index,
            node,
            was_initial,
            transitions,
        } = removed;
        let id = node.id;
        if self.contains_node(id) {
            return Err(DiagramError::DuplicateNode(id));
        }
        // Nothing is inserted until every incident transition is known to fit.
        for removed in &transitions {
            self.check_insertable_with(&removed.transition, Some(id))?;
        }

        let index = index.min(self.nodes.len());
        self.nodes.insert(index, node);
        if was_initial {
            self.initial = Some(id);
        }
        for removed in transitions {
            let at = removed.index.min(self.transitions.len());
            self.transitions.insert(at, removed.transition);
        }
        debug!("Restored node {} at index {}", id, index);
        Ok(())
    }

    /// Move a node, returning where it was.
    pub fn move_node(&mut self, id: NodeId, to: Point) -> Result<Point, DiagramError> {
        let node = self.node_mut(id)?;
        let from = std::mem::replace(&mut node.position, to);
        trace!("Moved node {} from {:?} to {:?}", id, from, to);
        Ok(from)
    }

    /// Relabel a node, returning the old label.
    pub fn rename_node(
        &mut self,
        id: NodeId,
        label: impl Into<String>,
    ) -> Result<String, DiagramError> {
        let node = self.node_mut(id)?;
        let before = std::mem::replace(&mut node.label, label.into());
        debug!("Renamed node {} from '{}' to '{}'", id, before, node.label);
        Ok(before)
    }

    /// Mark a node as accepting or not, returning the previous flag.
    pub fn set_accepting(&mut self, id: NodeId, accepting: bool) -> Result<bool, DiagramError> {
        let node = self.node_mut(id)?;
        let before = std::mem::replace(&mut node.accepting, accepting);
        debug!("Node {} accepting: {} -> {}", id, before, accepting);
        Ok(before)
    }

    /// Make `id` the initial node (or clear it with `None`), returning the previous one.
    pub fn set_initial(&mut self, id: Option<NodeId>) -> Result<Option<NodeId>, DiagramError> {
        if let Some(id) = id {
            if !self.contains_node(id) {
                return Err(DiagramError::UnknownNode(id));
            }
        }
        let before = std::mem::replace(&mut self.initial, id);
        debug!("Initial node {:?} -> {:?}", before, id);
        Ok(before)
    }

    // Transitions

    pub fn transition(&self, id: TransitionId) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.id == id)
    }

    fn transition_mut(&mut self, id: TransitionId) -> Result<&mut Transition, DiagramError> {
        self.transitions
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(DiagramError::UnknownTransition(id))
    }

    pub fn contains_transition(&self, id: TransitionId) -> bool {
        self.transition(id).is_some()
    }

    /// Connect two existing nodes and return the new transition's id.
    pub fn add_transition(
        &mut self,
        source: NodeId,
        dest: NodeId,
    ) -> Result<TransitionId, DiagramError> {
        let transition = Transition::new(source, dest);
        let id = transition.id;
        self.insert_transition(transition)?;
        Ok(id)
    }

    /// Append a fully formed transition, keeping its id.
    pub fn insert_transition(&mut self, transition: Transition) -> Result<(), DiagramError> {
        self.check_insertable(&transition)?;
        debug!(
            "Inserting transition {} ({} -> {})",
            transition.id, transition.source, transition.dest
        );
        self.transitions.push(transition);
        Ok(())
    }

    pub fn remove_transition(
        &mut self,
        id: TransitionId,
    ) -> Result<RemovedTransition, DiagramError> {
        let index = self
            .transitions
            .iter()
            .position(|t| t.id == id)
            .ok_or(DiagramError::UnknownTransition(id))?;
        let transition = self.transitions.remove(index);
        debug!("Removed transition {}", id);
        Ok(RemovedTransition { index, transition })
    }

    /// Undo a [`Diagram::remove_transition`], putting it back where it was.
    pub fn restore_transition(&mut self, removed: RemovedTransition) -> Result<(), DiagramError> {
        self.check_insertable(&removed.transition)?;
        let index = removed.index.min(self.transitions.len());
        debug!("Restoring transition {} at index {}", removed.transition.id, index);
        self.transitions.insert(index, removed.transition);
        Ok(())
    }

    fn check_insertable(&self, transition: &Transition) -> Result<(), DiagramError> {
        self.check_insertable_with(transition, None)
    }

    /// Like [`Diagram::check_insertable`], treating `incoming` as an existing node.
    fn check_insertable_with(
        &self,
        transition: &Transition,
        incoming: Option<NodeId>,
    ) -> Result<(), DiagramError> {
        if self.contains_transition(transition.id) {
            warn!("Refusing duplicate transition {}", transition.id);
            return Err(DiagramError::DuplicateTransition(transition.id));
        }
        for node in [transition.source, transition.dest] {
            if Some(node) != incoming && !self.contains_node(node) {
                warn!(
                    "Transition {} references missing node {}",
                    transition.id, node
                );
                return Err(DiagramError::DanglingEndpoint {
                    transition: transition.id,
                    node,
                });
            }
        }
        Ok(())
    }

    // Tokens

    /// Append a token to a transition's label. Each symbol may appear once.
    pub fn add_token(&mut self, id: TransitionId, token: Token) -> Result<(), DiagramError> {
        let index = self.transition(id).map(|t| t.tokens.len()).unwrap_or(0);
        self.insert_token_at(id, index, token)
    }

    /// Insert a token at `index` (clamped to the label length).
    pub fn insert_token_at(
        &mut self,
        id: TransitionId,
        index: usize,
        token: Token,
    ) -> Result<(), DiagramError> {
        let transition = self.transition_mut(id)?;
        if transition.tokens.contains(&token) {
            return Err(DiagramError::DuplicateToken {
                transition: id,
                token: token.0,
            });
        }
        let index = index.min(transition.tokens.len());
        transition.tokens.insert(index, token);
        trace!("Transition {} label is now '{}'", id, transition.label());
        Ok(())
    }

    /// Remove a token, returning the index it occupied.
    pub fn remove_token(&mut self, id: TransitionId, token: &Token) -> Result<usize, DiagramError> {
        let transition = self.transition_mut(id)?;
        let index = transition
            .tokens
            .iter()
            .position(|t| t == token)
            .ok_or_else(|| DiagramError::UnknownToken {
                transition: id,
                token: token.0.clone(),
            })?;
        transition.tokens.remove(index);
        trace!("Transition {} label is now '{}'", id, transition.label());
        Ok(index)
    }

    // Queries

    /// Transitions leaving `source` and arriving at `dest`.
    pub fn transitions_between(
        &self,
        source: NodeId,
        dest: NodeId,
    ) -> impl Iterator<Item = &Transition> + '_ {
        self.transitions
            .iter()
            .filter(move |t| t.source == source && t.dest == dest)
    }

    /// Transitions with `node` as either endpoint.
    pub fn incident(&self, node: NodeId) -> impl Iterator<Item = &Transition> + '_ {
        self.transitions
            .iter()
            .filter(move |t| t.source == node || t.dest == node)
    }

    pub fn label(&self, id: TransitionId) -> Option<String> {
        self.transition(id).map(Transition::label)
    }

    /// Routing hint for the canvas.
    pub fn edge_shape(&self, id: TransitionId) -> Option<EdgeShape> {
        let transition = self.transition(id)?;
        if transition.is_self_loop() {
            return Some(EdgeShape::SelfLoop);
        }
        let shared = self
            .transitions
            .iter()
            .any(|other| other.id != id && other.connects_same_nodes(transition));
        Some(if shared {
            EdgeShape::Curved
        } else {
            EdgeShape::Straight
        })
    }

    /// Whether another node carries the same label as `id`.
    pub fn label_conflicts(&self, id: NodeId) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        self.nodes
            .iter()
            .any(|other| other.id != id && other.label == node.label)
    }

    /// Check referential integrity, e.g. after loading from disk.
    pub fn validate(&self) -> Result<(), DiagramError> {
        for (i, node) in self.nodes.iter().enumerate() {
            if self.nodes[..i].iter().any(|n| n.id == node.id) {
                return Err(DiagramError::DuplicateNode(node.id));
            }
        }
        for (i, t) in self.transitions.iter().enumerate() {
            if self.transitions[..i].iter().any(|o| o.id == t.id) {
                return Err(DiagramError::DuplicateTransition(t.id));
            }
            for node in [t.source, t.dest] {
                if !self.contains_node(node) {
                    return Err(DiagramError::DanglingEndpoint {
                        transition: t.id,
                        node,
                    });
                }
            }
        }
        if let Some(initial) = self.initial {
            if !self.contains_node(initial) {
                return Err(DiagramError::UnknownNode(initial));
            }
        }
        Ok(())
    }
}
