// Undo/redo bookkeeping for the editor: toolbar state and the dirty indicator.
//
// Listeners take no arguments and run while the history is mutably borrowed,
// so the watcher's listener only flips a flag. The toolbar is rebuilt from the
// history the next time someone asks for it.

use std::cell::Cell;
use std::rc::Rc;

use automa_core::{History, ListenerId};
use tracing::{debug, trace};

/// What the undo/redo buttons and the title bar should show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolbarState {
    pub can_undo: bool,
    pub can_redo: bool,
    pub undo_tooltip: Option<String>,
    pub redo_tooltip: Option<String>,
    /// Full description of the next undo, shown on hover.
    pub undo_detail: Option<String>,
    pub redo_detail: Option<String>,
    pub dirty: bool,
}

/// Tracks history changes and the last saved position.
#[derive(Debug)]
pub struct HistoryWatch {
    stale: Rc<Cell<bool>>,
    revision: Rc<Cell<u64>>,
    listener: ListenerId,
    /// Undo depth at the last save. `None` once the saved state is unreachable.
    saved_depth: Option<usize>,
    toolbar: ToolbarState,
}

impl HistoryWatch {
    /// Subscribe to `history`. The current state counts as saved.
    pub fn attach<T, D>(history: &mut History<T, D>) -> Self {
        let stale = Rc::new(Cell::new(true));
        let revision = Rc::new(Cell::new(0));
        let (flag, counter) = (stale.clone(), revision.clone());
        let listener = history.on_change(move || {
            flag.set(true);
            counter.set(counter.get() + 1);
        });
        debug!("History watch attached as {:?}", listener);
        Self {
            stale,
            revision,
            listener,
            saved_depth: Some(history.undo_depth()),
            toolbar: ToolbarState::default(),
        }
    }

    pub fn listener(&self) -> ListenerId {
        self.listener
    }

    /// Number of history notifications seen so far.
    pub fn revision(&self) -> u64 {
        self.revision.get()
    }

    /// Call before pushing: a push from below the saved position discards it.
    pub fn before_push<T, D>(&self, history: &History<T, D>) -> bool {
        matches!(self.saved_depth, Some(saved) if saved > history.undo_depth())
    }

    /// Call after a successful push with the result of [`HistoryWatch::before_push`].
    pub fn after_push(&mut self, discarded_saved: bool) {
        if discarded_saved {
            debug!("Saved state dropped from the redo tail");
            self.saved_depth = None;
        }
    }

    pub fn mark_saved<T, D>(&mut self, history: &History<T, D>) {
        self.saved_depth = Some(history.undo_depth());
        self.stale.set(true);
        debug!("Marked saved at undo depth {}", history.undo_depth());
    }

    pub fn is_dirty<T, D>(&self, history: &History<T, D>) -> bool {
        self.saved_depth != Some(history.undo_depth())
    }

    /// Current toolbar state, rebuilt only if the history changed since last time.
    pub fn toolbar<T, D>(&mut self, history: &History<T, D>) -> &ToolbarState {
        if self.stale.replace(false) {
            trace!("Refreshing toolbar state");
            self.toolbar = ToolbarState {
                can_undo: history.can_undo(),
                can_redo: history.can_redo(),
                undo_tooltip: history.next_undo_name().map(|name| format!("Undo {name}")),
                redo_tooltip: history.next_redo_name().map(|name| format!("Redo {name}")),
                undo_detail: history.next_undo_description().map(str::to_owned),
                redo_detail: history.next_redo_description().map(str::to_owned),
                dirty: self.is_dirty(history),
            };
        }
        &self.toolbar
    }

    /// Stop listening. The history keeps working without the watch.
    pub fn detach<T, D>(self, history: &mut History<T, D>) {
        history.unsubscribe(self.listener);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use automa_core::Action;

    fn bump() -> Action<i32, ()> {
        Action::new(
            "Bump",
            "Add one",
            |n: &mut i32, _: &mut ()| {
                *n += 1;
                Ok(())
            },
            |n: &mut i32, _: &mut ()| {
                *n -= 1;
                Ok(())
            },
            (),
        )
    }

    fn push(watch: &mut HistoryWatch, history: &mut History<i32, ()>, n: &mut i32) {
        let discarded = watch.before_push(history);
        history.push(bump(), n).unwrap();
        watch.after_push(discarded);
    }

    #[test]
    fn test_toolbar_follows_history() {
        let mut history = History::default();
        let mut watch = HistoryWatch::attach(&mut history);
        let mut n = 0;

        assert_eq!(watch.toolbar(&history), &ToolbarState::default());

        push(&mut watch, &mut history, &mut n);
        let state = watch.toolbar(&history).clone();
        assert!(state.can_undo);
        assert!(!state.can_redo);
        assert_eq!(state.undo_tooltip.as_deref(), Some("Undo Bump"));
        assert!(state.dirty);

        history.undo(&mut n).unwrap();
        let state = watch.toolbar(&history).clone();
        assert!(!state.can_undo);
        assert!(state.can_redo);
        assert_eq!(state.redo_tooltip.as_deref(), Some("Redo Bump"));
        assert!(!state.dirty);
        assert_eq!(watch.revision(), 2);
    }

    #[test]
    fn test_saved_state_lost_when_redo_tail_discarded() {
        let mut history = History::default();
        let mut watch = HistoryWatch::attach(&mut history);
        let mut n = 0;

        push(&mut watch, &mut history, &mut n);
        push(&mut watch, &mut history, &mut n);
        watch.mark_saved(&history);
        assert!(!watch.is_dirty(&history));

        history.undo(&mut n).unwrap();
        assert!(watch.is_dirty(&history));
        push(&mut watch, &mut history, &mut n);

        // Same depth as the save, but a different action sits there now.
        assert_eq!(history.undo_depth(), 2);
        assert!(watch.is_dirty(&history));
    }

    #[test]
    fn test_detach_unsubscribes() {
        let mut history: History<i32, ()> = History::default();
        let watch = HistoryWatch::attach(&mut history);
        assert_eq!(history.listener_count(), 1);
        watch.detach(&mut history);
        assert_eq!(history.listener_count(), 0);
    }
}
