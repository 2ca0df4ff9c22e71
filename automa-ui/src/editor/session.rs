//! The editing session.
//!
//! An [`Editor`] owns one diagram and the one history that edits it. The
//! front end forwards clicks and drags here; every change to the diagram goes
//! through [`Editor::perform`] so that it lands on the undo stack.

use std::path::Path;

use automa_core::{History, HistoryError, Listener, ListenerId};
use automa_model::{
    load_diagram, save_diagram, Diagram, DiagramError, Node, NodeId, Point, Token, Transition,
    TransitionId,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::canvas::{NodeAppearance, TransitionAppearance};
use super::commands::{self, EditAction, EditPayload};
use super::history::{HistoryWatch, ToolbarState};
use super::tools::{Selection, Tool};
use crate::config::EditorConfig;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Diagram(#[from] DiagramError),

    #[error("nothing is selected")]
    NothingSelected,
}

/// Result of a click forwarded from the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Nothing,
    Selected,
    Deselected,
    NodePlaced(NodeId),
    ConnectionStarted(NodeId),
    Connected(TransitionId),
    TokenEntryStarted(TransitionId),
}

pub struct Editor {
    diagram: Diagram,
    history: History<Diagram, EditPayload>,
    watch: HistoryWatch,
    tool: Tool,
    selection: Selection,
    /// Source node of a transition being drawn with [`Tool::AddTransition`].
    pending_source: Option<NodeId>,
    /// Transition whose label is being typed with [`Tool::AddToken`].
    token_target: Option<TransitionId>,
    config: EditorConfig,
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        Self::with_diagram(Diagram::new(), config)
    }

    /// Start a session on an existing document. The document counts as saved.
    pub fn with_diagram(diagram: Diagram, config: EditorConfig) -> Self {
        let mut history = History::new(config.history.clone());
        let watch = HistoryWatch::attach(&mut history);
        info!(
            "Editor session started on diagram {} ({} nodes)",
            diagram.diagram_id,
            diagram.nodes.len()
        );
        Self {
            diagram,
            history,
            watch,
            tool: Tool::default(),
            selection: Selection::default(),
            pending_source: None,
            token_target: None,
            config,
        }
    }

    /// Open a diagram file in a fresh session.
    pub fn open(path: impl AsRef<Path>, config: EditorConfig) -> anyhow::Result<Self> {
        let diagram = load_diagram(path)?;
        Ok(Self::with_diagram(diagram, config))
    }

    /// Write the diagram to `path` and mark the session clean.
    pub fn save(&mut self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        save_diagram(path, &self.diagram)?;
        self.watch.mark_saved(&self.history);
        Ok(())
    }

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    pub fn history(&self) -> &History<Diagram, EditPayload> {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    /// Apply an edit and record it.
    pub fn perform(&mut self, action: EditAction) -> Result<(), EditorError> {
        info!("{}", action.description());
        let discards_saved = self.watch.before_push(&self.history);
        self.history.push(action, &mut self.diagram)?;
        self.watch.after_push(discards_saved);
        self.prune();
        Ok(())
    }

    pub fn undo(&mut self) -> Result<bool, EditorError> {
        let undone = self.history.undo(&mut self.diagram)?;
        if undone {
            self.prune();
        }
        Ok(undone)
    }

    pub fn redo(&mut self) -> Result<bool, EditorError> {
        let redone = self.history.redo(&mut self.diagram)?;
        if redone {
            self.prune();
        }
        Ok(redone)
    }

    /// Forget selected or pending objects the last change removed.
    fn prune(&mut self) {
        self.selection.prune(&self.diagram);
        if matches!(self.pending_source, Some(id) if !self.diagram.contains_node(id)) {
            self.pending_source = None;
        }
        if let Some(id) = self.token_target {
            if !self.diagram.contains_transition(id) {
                debug!("Token entry on {} cancelled, transition is gone", id);
                self.token_target = None;
            }
        }
    }

    /// Drop all history; the current document becomes the saved baseline.
    pub fn clear_history(&mut self) {
        self.history.reset();
        self.watch.mark_saved(&self.history);
    }

    pub fn mark_saved(&mut self) {
        self.watch.mark_saved(&self.history);
    }

    pub fn is_dirty(&self) -> bool {
        self.watch.is_dirty(&self.history)
    }

    /// Bumped on every history change; the canvas repaints when it moves.
    pub fn revision(&self) -> u64 {
        self.watch.revision()
    }

    pub fn toolbar(&mut self) -> &ToolbarState {
        self.watch.toolbar(&self.history)
    }

    /// Let other UI parts (history panel, status bar) follow history changes.
    pub fn subscribe(&mut self, listener: Listener) -> ListenerId {
        self.history.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        if id == self.watch.listener() {
            warn!("Refusing to unsubscribe the editor's own history watch");
            return false;
        }
        self.history.unsubscribe(id)
    }

    // ------------------------------------------------------------------
    // Tools and selection
    // ------------------------------------------------------------------

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn set_tool(&mut self, tool: Tool) {
        if tool != self.tool {
            debug!("Tool {} -> {}", self.tool.name(), tool.name());
            self.pending_source = None;
            self.token_target = None;
            self.tool = tool;
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn pending_source(&self) -> Option<NodeId> {
        self.pending_source
    }

    pub fn token_target(&self) -> Option<TransitionId> {
        self.token_target
    }

    pub fn select_node(&mut self, id: NodeId, additive: bool) -> Result<(), EditorError> {
        if !self.diagram.contains_node(id) {
            return Err(DiagramError::UnknownNode(id).into());
        }
        self.selection.select_node(id, additive);
        Ok(())
    }

    pub fn select_transition(
        &mut self,
        id: TransitionId,
        additive: bool,
    ) -> Result<(), EditorError> {
        if !self.diagram.contains_transition(id) {
            return Err(DiagramError::UnknownTransition(id).into());
        }
        self.selection.select_transition(id, additive);
        Ok(())
    }

    pub fn deselect_all(&mut self) {
        self.selection.clear();
    }

    /// Click on empty canvas.
    pub fn click_canvas(&mut self, at: Point) -> Result<ClickOutcome, EditorError> {
        match self.tool {
            Tool::AddNode => Ok(ClickOutcome::NodePlaced(self.place_node(at)?)),
            Tool::AddTransition if self.pending_source.is_some() => {
                debug!("Connection cancelled");
                self.pending_source = None;
                Ok(ClickOutcome::Nothing)
            }
            Tool::AddToken if self.token_target.is_some() => {
                debug!("Token entry cancelled");
                self.token_target = None;
                Ok(ClickOutcome::Nothing)
            }
            _ if !self.selection.is_empty() => {
                self.deselect_all();
                Ok(ClickOutcome::Deselected)
            }
            _ => Ok(ClickOutcome::Nothing),
        }
    }

    /// Click on a node. With [`Tool::AddTransition`] the first click picks the
    /// source and the second one the destination.
    pub fn click_node(&mut self, id: NodeId, additive: bool) -> Result<ClickOutcome, EditorError> {
        match self.tool {
            Tool::AddTransition => match self.pending_source.take() {
                Some(source) => Ok(ClickOutcome::Connected(self.connect(source, id)?)),
                None => {
                    if !self.diagram.contains_node(id) {
                        return Err(DiagramError::UnknownNode(id).into());
                    }
                    self.pending_source = Some(id);
                    Ok(ClickOutcome::ConnectionStarted(id))
                }
            },
            _ => {
                self.select_node(id, additive)?;
                Ok(ClickOutcome::Selected)
            }
        }
    }

    /// Click on a transition. With [`Tool::AddToken`] this opens token entry
    /// on it; finish with [`Editor::finish_token_entry`].
    pub fn click_transition(
        &mut self,
        id: TransitionId,
        additive: bool,
    ) -> Result<ClickOutcome, EditorError> {
        match self.tool {
            Tool::AddToken => {
                if !self.diagram.contains_transition(id) {
                    return Err(DiagramError::UnknownTransition(id).into());
                }
                debug!("Token entry started on {}", id);
                self.token_target = Some(id);
                Ok(ClickOutcome::TokenEntryStarted(id))
            }
            _ => {
                self.select_transition(id, additive)?;
                Ok(ClickOutcome::Selected)
            }
        }
    }

    // ------------------------------------------------------------------
    // Gestures
    // ------------------------------------------------------------------

    fn snap(&self, at: Point) -> Point {
        if self.config.snap_to_grid {
            at.snapped(self.config.grid_size)
        } else {
            at
        }
    }

    /// First `<prefix><n>` label not used by any node.
    fn next_label(&self) -> String {
        let prefix = &self.config.node_label_prefix;
        (0u32..)
            .map(|n| format!("{prefix}{n}"))
            .find(|label| self.diagram.nodes.iter().all(|node| &node.label != label))
            .unwrap_or_else(|| prefix.clone())
    }

    /// Add a node with an automatic label at `at` (snapped to the grid if enabled).
    pub fn place_node(&mut self, at: Point) -> Result<NodeId, EditorError> {
        let node = Node::new(self.next_label(), self.snap(at));
        let id = node.id;
        self.perform(commands::insert_node(node))?;
        Ok(id)
    }

    /// Finish a drag. Returns `false` if the node did not actually move.
    pub fn drag_node(&mut self, id: NodeId, to: Point) -> Result<bool, EditorError> {
        let from = self
            .diagram
            .node(id)
            .ok_or(DiagramError::UnknownNode(id))?
            .position;
        let to = self.snap(to);
        if from == to {
            debug!("Drag of {} ended where it started", id);
            return Ok(false);
        }
        self.perform(commands::move_node(id, from, to))?;
        Ok(true)
    }

    pub fn rename_node(&mut self, id: NodeId, label: impl Into<String>) -> Result<(), EditorError> {
        self.perform(commands::rename_node(id, label))
    }

    pub fn toggle_accepting(&mut self, id: NodeId) -> Result<(), EditorError> {
        let accepting = self
            .diagram
            .node(id)
            .ok_or(DiagramError::UnknownNode(id))?
            .accepting;
        self.perform(commands::set_accepting(id, !accepting))
    }

    pub fn make_initial(&mut self, id: Option<NodeId>) -> Result<(), EditorError> {
        self.perform(commands::set_initial(id))
    }

    pub fn connect(&mut self, source: NodeId, dest: NodeId) -> Result<TransitionId, EditorError> {
        let transition = Transition::new(source, dest);
        let id = transition.id;
        self.perform(commands::insert_transition(transition))?;
        Ok(id)
    }

    /// Append a symbol to a transition label. An empty symbol adds epsilon.
    pub fn type_token(
        &mut self,
        transition: TransitionId,
        symbol: &str,
    ) -> Result<(), EditorError> {
        self.perform(commands::add_token(transition, Token::new(symbol.trim())))
    }

    /// Commit the symbol typed after an [`Tool::AddToken`] click. Returns the
    /// transition that received it, or `None` if no entry was open.
    pub fn finish_token_entry(
        &mut self,
        symbol: &str,
    ) -> Result<Option<TransitionId>, EditorError> {
        let Some(transition) = self.token_target.take() else {
            return Ok(None);
        };
        self.type_token(transition, symbol)?;
        Ok(Some(transition))
    }

    pub fn erase_token(
        &mut self,
        transition: TransitionId,
        symbol: &str,
    ) -> Result<(), EditorError> {
        self.perform(commands::remove_token(transition, Token::new(symbol.trim())))
    }

    /// Delete everything selected, one undo step per object.
    /// Selected transitions are deleted before selected nodes.
    pub fn delete_selection(&mut self) -> Result<usize, EditorError> {
        if self.selection.is_empty() {
            warn!("Delete requested with nothing selected");
            return Err(EditorError::NothingSelected);
        }
        let transitions = self.selection.transitions().to_vec();
        let nodes = self.selection.nodes().to_vec();

        let mut deleted = 0;
        for id in transitions {
            if self.diagram.contains_transition(id) {
                self.perform(commands::delete_transition(id))?;
                deleted += 1;
            }
        }
        for id in nodes {
            if self.diagram.contains_node(id) {
                self.perform(commands::delete_node(id))?;
                deleted += 1;
            }
        }
        self.selection.clear();
        info!("Deleted {} object(s)", deleted);
        Ok(deleted)
    }

    // ------------------------------------------------------------------
    // Canvas queries
    // ------------------------------------------------------------------

    /// Nodes sharing a label with another node are drawn in the error colors.
    pub fn node_appearance(&self, id: NodeId) -> Option<NodeAppearance> {
        let node = self.diagram.node(id)?;
        let colors = &self.config.colors;
        if self.diagram.label_conflicts(id) {
            return Some(colors.error_node_appearance(node));
        }
        Some(colors.node_appearance(node, self.selection.contains_node(id)))
    }

    pub fn transition_appearance(&self, id: TransitionId) -> Option<TransitionAppearance> {
        let transition = self.diagram.transition(id)?;
        let shape = self.diagram.edge_shape(id)?;
        Some(self.config.colors.transition_appearance(
            transition,
            shape,
            self.selection.contains_transition(id),
        ))
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}
