// Editing commands: every gesture that changes the diagram becomes an EditAction.
//
// All commands share the same two effects, `forward` and `backward`, which
// dispatch on the payload variant. State that only exists once the edit has
// happened (a removed node, a previous label) is captured into the payload by
// `forward` and consumed by `backward`.

use anyhow::anyhow;
use automa_core::Action;
use automa_model::{
    Diagram, Node, NodeId, Point, RemovedNode, RemovedTransition, Token, Transition, TransitionId,
};
use tracing::trace;

/// An action over the diagram document.
pub type EditAction = Action<Diagram, EditPayload>;

/// Per-command state shared by the forward and backward effects.
#[derive(Debug, Clone, PartialEq)]
pub enum EditPayload {
    AddNode {
        node: Node,
    },
    DeleteNode {
        id: NodeId,
        removed: Option<RemovedNode>,
    },
    MoveNode {
        id: NodeId,
        from: Point,
        to: Point,
    },
    RenameNode {
        id: NodeId,
        label: String,
        before: Option<String>,
    },
    SetAccepting {
        id: NodeId,
        accepting: bool,
        before: Option<bool>,
    },
    SetInitial {
        id: Option<NodeId>,
        /// Outer `Option` is "captured yet", inner is the previous initial node.
        before: Option<Option<NodeId>>,
    },
    AddTransition {
        transition: Transition,
    },
    DeleteTransition {
        id: TransitionId,
        removed: Option<RemovedTransition>,
    },
    AddToken {
        transition: TransitionId,
        token: Token,
    },
    RemoveToken {
        transition: TransitionId,
        token: Token,
        index: Option<usize>,
    },
}

impl EditPayload {
    /// Short name shown in the history panel and toolbar tooltips.
    pub fn name(&self) -> &'static str {
        match self {
            EditPayload::AddNode { .. } => "Add node",
            EditPayload::DeleteNode { .. } => "Delete node",
            EditPayload::MoveNode { .. } => "Move node",
            EditPayload::RenameNode { .. } => "Rename node",
            EditPayload::SetAccepting { .. } => "Toggle accepting",
            EditPayload::SetInitial { .. } => "Set initial node",
            EditPayload::AddTransition { .. } => "Add transition",
            EditPayload::DeleteTransition { .. } => "Delete transition",
            EditPayload::AddToken { .. } => "Add token",
            EditPayload::RemoveToken { .. } => "Remove token",
        }
    }
}

fn edit(description: String, payload: EditPayload) -> EditAction {
    Action::new(payload.name(), description, forward, backward, payload)
}

pub fn add_node(label: impl Into<String>, at: Point) -> EditAction {
    insert_node(Node::new(label, at))
}

/// Add a node the caller built, so the caller knows its id up front.
pub fn insert_node(node: Node) -> EditAction {
    let description = format!(
        "Add node '{}' at ({}, {})",
        node.label, node.position.x, node.position.y
    );
    edit(description, EditPayload::AddNode { node })
}

pub fn delete_node(id: NodeId) -> EditAction {
    edit(
        format!("Delete {id} and its transitions"),
        EditPayload::DeleteNode { id, removed: None },
    )
}

pub fn move_node(id: NodeId, from: Point, to: Point) -> EditAction {
    edit(
        format!("Move {id} to ({}, {})", to.x, to.y),
        EditPayload::MoveNode { id, from, to },
    )
}

pub fn rename_node(id: NodeId, label: impl Into<String>) -> EditAction {
    let label = label.into();
    edit(
        format!("Rename {id} to '{label}'"),
        EditPayload::RenameNode {
            id,
            label,
            before: None,
        },
    )
}

pub fn set_accepting(id: NodeId, accepting: bool) -> EditAction {
    let verb = if accepting { "Mark" } else { "Unmark" };
    edit(
        format!("{verb} {id} as accepting"),
        EditPayload::SetAccepting {
            id,
            accepting,
            before: None,
        },
    )
}

pub fn set_initial(id: Option<NodeId>) -> EditAction {
    let description = match id {
        Some(id) => format!("Make {id} the initial node"),
        None => "Clear the initial node".to_string(),
    };
    edit(description, EditPayload::SetInitial { id, before: None })
}

pub fn add_transition(source: NodeId, dest: NodeId) -> EditAction {
    insert_transition(Transition::new(source, dest))
}

pub fn insert_transition(transition: Transition) -> EditAction {
    edit(
        format!("Connect {} to {}", transition.source, transition.dest),
        EditPayload::AddTransition { transition },
    )
}

pub fn delete_transition(id: TransitionId) -> EditAction {
    edit(
        format!("Delete {id}"),
        EditPayload::DeleteTransition { id, removed: None },
    )
}

pub fn add_token(transition: TransitionId, token: Token) -> EditAction {
    edit(
        format!("Add token '{token}' to {transition}"),
        EditPayload::AddToken { transition, token },
    )
}

pub fn remove_token(transition: TransitionId, token: Token) -> EditAction {
    edit(
        format!("Remove token '{token}' from {transition}"),
        EditPayload::RemoveToken {
            transition,
            token,
            index: None,
        },
    )
}

fn forward(diagram: &mut Diagram, payload: &mut EditPayload) -> anyhow::Result<()> {
    trace!("forward: {}", payload.name());
    match payload {
        EditPayload::AddNode { node } => diagram.insert_node(node.clone())?,
        EditPayload::DeleteNode { id, removed } => *removed = Some(diagram.remove_node(*id)?),
        EditPayload::MoveNode { id, to, .. } => {
            diagram.move_node(*id, *to)?;
        }
        EditPayload::RenameNode { id, label, before } => {
            *before = Some(diagram.rename_node(*id, label.clone())?)
        }
        EditPayload::SetAccepting {
            id,
            accepting,
            before,
        } => *before = Some(diagram.set_accepting(*id, *accepting)?),
        EditPayload::SetInitial { id, before } => *before = Some(diagram.set_initial(*id)?),
        EditPayload::AddTransition { transition } => {
            diagram.insert_transition(transition.clone())?
        }
        EditPayload::DeleteTransition { id, removed } => {
            *removed = Some(diagram.remove_transition(*id)?)
        }
        EditPayload::AddToken { transition, token } => {
            diagram.add_token(*transition, token.clone())?
        }
        EditPayload::RemoveToken {
            transition,
            token,
            index,
        } => *index = Some(diagram.remove_token(*transition, token)?),
    }
    Ok(())
}

fn backward(diagram: &mut Diagram, payload: &mut EditPayload) -> anyhow::Result<()> {
    trace!("backward: {}", payload.name());
    let name = payload.name();
    let not_applied = || anyhow!("'{name}' was reverted before it was applied");
    // Captured state stays in the payload until the diagram accepts it, so a
    // failed undo can be retried. The next forward overwrites it.
    match payload {
        EditPayload::AddNode { node } => {
            diagram.remove_node(node.id)?;
        }
        EditPayload::DeleteNode { removed, .. } => {
            diagram.restore_node(removed.clone().ok_or_else(not_applied)?)?
        }
        EditPayload::MoveNode { id, from, .. } => {
            diagram.move_node(*id, *from)?;
        }
        EditPayload::RenameNode { id, before, .. } => {
            diagram.rename_node(*id, before.clone().ok_or_else(not_applied)?)?;
        }
        EditPayload::SetAccepting { id, before, .. } => {
            diagram.set_accepting(*id, before.ok_or_else(not_applied)?)?;
        }
        EditPayload::SetInitial { before, .. } => {
            diagram.set_initial(before.ok_or_else(not_applied)?)?;
        }
        EditPayload::AddTransition { transition } => {
            diagram.remove_transition(transition.id)?;
        }
        EditPayload::DeleteTransition { removed, .. } => {
            diagram.restore_transition(removed.clone().ok_or_else(not_applied)?)?
        }
        EditPayload::AddToken { transition, token } => {
            diagram.remove_token(*transition, token)?;
        }
        EditPayload::RemoveToken {
            transition,
            token,
            index,
        } => {
            let index = index.ok_or_else(not_applied)?;
            diagram.insert_token_at(*transition, index, token.clone())?
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use automa_core::History;

    fn sample() -> (Diagram, NodeId, NodeId, TransitionId) {
        let mut d = Diagram::new();
        let a = d.add_node("q0", Point::new(0.0, 0.0));
        let b = d.add_node("q1", Point::new(100.0, 0.0));
        let t = d.add_transition(a, b).unwrap();
        d.add_token(t, Token::new("x")).unwrap();
        d.add_token(t, Token::new("y")).unwrap();
        (d, a, b, t)
    }

    /// Apply, undo, redo, undo: the document must land back where it started
    /// and the redo must reproduce the first application.
    fn assert_reversible(mut d: Diagram, action: EditAction) {
        let original = d.clone();
        let mut history = History::default();
        history.push(action, &mut d).unwrap();
        let applied = d.clone();
        assert_ne!(applied, original);

        history.undo(&mut d).unwrap();
        assert_eq!(d, original);
        history.redo(&mut d).unwrap();
        assert_eq!(d, applied);
        history.undo(&mut d).unwrap();
        assert_eq!(d, original);
    }

    #[test]
    fn test_add_node_keeps_id_across_redo() {
        let (d, _, _, _) = sample();
        let action = add_node("q2", Point::new(50.0, 50.0));
        let EditPayload::AddNode { node } = action.data() else {
            panic!("wrong payload");
        };
        let id = node.id;
        let mut d2 = d.clone();
        let mut history = History::default();
        history.push(action, &mut d2).unwrap();
        history.undo(&mut d2).unwrap();
        assert!(d2.node(id).is_none());
        history.redo(&mut d2).unwrap();
        assert_eq!(d2.node(id).unwrap().label, "q2");
        assert_reversible(d, add_node("q3", Point::default()));
    }

    #[test]
    fn test_delete_node_restores_transitions() {
        let (d, a, _, t) = sample();
        let mut d2 = d.clone();
        let mut history = History::default();
        history.push(delete_node(a), &mut d2).unwrap();
        assert!(d2.transition(t).is_none());
        history.undo(&mut d2).unwrap();
        assert_eq!(d2.label(t).unwrap(), "x,y");
        assert_reversible(d, delete_node(a));
    }

    #[test]
    fn test_node_property_commands() {
        let (d, a, b, _) = sample();
        assert_reversible(
            d.clone(),
            move_node(a, Point::new(0.0, 0.0), Point::new(5.0, 5.0)),
        );
        assert_reversible(d.clone(), rename_node(b, "accept"));
        assert_reversible(d.clone(), set_accepting(b, true));
        assert_reversible(d, set_initial(Some(a)));
    }

    #[test]
    fn test_set_initial_restores_previous() {
        let (mut d, a, b, _) = sample();
        d.set_initial(Some(a)).unwrap();
        let mut history = History::default();
        history.push(set_initial(Some(b)), &mut d).unwrap();
        assert_eq!(d.initial, Some(b));
        history.undo(&mut d).unwrap();
        assert_eq!(d.initial, Some(a));
    }

    #[test]
    fn test_transition_commands() {
        let (d, a, b, t) = sample();
        assert_reversible(d.clone(), add_transition(b, a));
        assert_reversible(d, delete_transition(t));
    }

    #[test]
    fn test_token_commands_keep_order() {
        let (d, _, _, t) = sample();
        let mut d2 = d.clone();
        let mut history = History::default();
        history.push(remove_token(t, Token::new("x")), &mut d2).unwrap();
        assert_eq!(d2.label(t).unwrap(), "y");
        history.undo(&mut d2).unwrap();
        assert_eq!(d2.label(t).unwrap(), "x,y");

        assert_reversible(d.clone(), add_token(t, Token::epsilon()));
        assert_reversible(d, remove_token(t, Token::new("y")));
    }

    #[test]
    fn test_failed_undo_can_be_retried() {
        let (mut d, a, _, _) = sample();
        let mut history = History::default();
        history.push(rename_node(a, "start"), &mut d).unwrap();

        let removed = d.remove_node(a).unwrap();
        assert!(history.undo(&mut d).is_err());
        assert_eq!(history.stack_location(), 0);

        d.restore_node(removed).unwrap();
        assert!(history.undo(&mut d).unwrap());
        assert_eq!(d.node(a).unwrap().label, "q0");
        assert!(history.redo(&mut d).unwrap());
        assert_eq!(d.node(a).unwrap().label, "start");
    }

    #[test]
    fn test_failed_node_restore_can_be_retried() {
        let (mut d, a, b, t) = sample();
        let mut history = History::default();
        history.push(delete_node(a), &mut d).unwrap();

        let removed_b = d.remove_node(b).unwrap();
        assert!(history.undo(&mut d).is_err());
        assert!(d.node(a).is_none());
        assert_eq!(history.stack_location(), 0);

        d.restore_node(removed_b).unwrap();
        assert!(history.undo(&mut d).unwrap());
        assert!(d.node(a).is_some());
        assert_eq!(d.label(t).unwrap(), "x,y");
        assert_eq!(history.stack_location(), -1);
    }

    #[test]
    fn test_failed_token_restore_can_be_retried() {
        let (mut d, _, _, t) = sample();
        let mut history = History::default();
        history.push(remove_token(t, Token::new("x")), &mut d).unwrap();

        d.add_token(t, Token::new("x")).unwrap();
        assert!(history.undo(&mut d).is_err());
        d.remove_token(t, &Token::new("x")).unwrap();
        assert!(history.undo(&mut d).unwrap());
        assert_eq!(d.label(t).unwrap(), "x,y");
    }

    #[test]
    fn test_failed_command_is_not_recorded() {
        let (mut d, _, _, t) = sample();
        let mut history = History::default();
        let err = history
            .push(add_token(t, Token::new("x")), &mut d)
            .unwrap_err();
        assert_eq!(err.action(), "Add token");
        assert!(history.is_empty());
        assert_eq!(d.label(t).unwrap(), "x,y");
    }
}
