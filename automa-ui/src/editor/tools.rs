// Tool palette and selection state for the diagram editor.

use automa_model::{Diagram, NodeId, TransitionId};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// What a click on the canvas does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    #[default]
    Select,
    AddNode,
    AddTransition,
    AddToken,
}

impl Tool {
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Select => "Select",
            Tool::AddNode => "Add node",
            Tool::AddTransition => "Add transition",
            Tool::AddToken => "Add token",
        }
    }

    /// Whether the canvas should show a tentative arrow while this tool is active.
    pub fn draws_tentative_arrow(&self) -> bool {
        matches!(self, Tool::AddTransition)
    }
}

/// Currently selected diagram objects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    nodes: Vec<NodeId>,
    transitions: Vec<TransitionId>,
}

impl Selection {
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn transitions(&self) -> &[TransitionId] {
        &self.transitions
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.transitions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len() + self.transitions.len()
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    pub fn contains_transition(&self, id: TransitionId) -> bool {
        self.transitions.contains(&id)
    }

    /// Select a node. Without `additive` everything else is deselected first.
    pub fn select_node(&mut self, id: NodeId, additive: bool) {
        if !additive {
            self.clear();
        }
        if !self.nodes.contains(&id) {
            self.nodes.push(id);
        }
        trace!("Selected {} ({} object(s) selected)", id, self.len());
    }

    pub fn select_transition(&mut self, id: TransitionId, additive: bool) {
        if !additive {
            self.clear();
        }
        if !self.transitions.contains(&id) {
            self.transitions.push(id);
        }
        trace!("Selected {} ({} object(s) selected)", id, self.len());
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.transitions.clear();
    }

    /// Forget ids that no longer exist in `diagram`, e.g. after an undo.
    pub fn prune(&mut self, diagram: &Diagram) {
        let before = self.len();
        self.nodes.retain(|id| diagram.contains_node(*id));
        self.transitions.retain(|id| diagram.contains_transition(*id));
        if self.len() != before {
            debug!("Pruned {} stale selection entries", before - self.len());
        }
    }
}
