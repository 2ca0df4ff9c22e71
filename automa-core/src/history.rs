//! Linear undo/redo history for the diagram editor.
//!
//! [`History`] keeps every applied [`Action`] in one vector and a count of how
//! many of them are currently applied. Everything past that count is the redo
//! tail, which a new push throws away.
//!
//! ```text
//! push A, push B, push C       [A, B, C]   applied = 3  (cursor 2)
//! undo, undo                   [A, B, C]   applied = 1  (cursor 0)
//! push D                       [A, D]      applied = 2  (cursor 1)
//! ```
//!
//! # Invariants
//!
//! 1. `applied <= stack.len()`, so the cursor stays within `-1..=len - 1`.
//! 2. After a successful push, `applied == stack.len()`.
//! 3. Stack and cursor only change after the action's effect returned `Ok`.
//!    A failing effect leaves the history exactly as it was and no listener
//!    is notified.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::action::Action;

/// A zero-argument change observer.
pub type Listener = Rc<dyn Fn()>;

/// Handle returned by [`History::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Tunables for [`History`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Also notify listeners when undo/redo hit a history boundary.
    pub notify_on_noop: bool,
}

/// Failure of an action's effect, propagated unchanged to the caller.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("forward effect of `{action}` failed")]
    Forward {
        action: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("backward effect of `{action}` failed")]
    Backward {
        action: String,
        #[source]
        source: anyhow::Error,
    },
}

impl HistoryError {
    /// Name of the action whose effect failed.
    pub fn action(&self) -> &str {
        match self {
            HistoryError::Forward { action, .. } | HistoryError::Backward { action, .. } => action,
        }
    }
}

/// Cursor-addressed history of reversible actions over a target `T`.
pub struct History<T, D> {
    stack: Vec<Action<T, D>>,
    /// Number of applied actions; the cursor is `applied - 1`.
    applied: usize,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
    config: HistoryConfig,
}

impl<T, D> fmt::Debug for History<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("History")
            .field("len", &self.stack.len())
            .field("cursor", &self.stack_location())
            .field("listeners", &self.listeners.len())
            .field("config", &self.config)
            .finish()
    }
}

impl<T, D> Default for History<T, D> {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl<T, D> History<T, D> {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            stack: Vec::new(),
            applied: 0,
            listeners: Vec::new(),
            next_listener: 0,
            config,
        }
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Apply `action` to `target` and record it as the newest entry.
    ///
    /// Any redo tail is discarded. If the forward effect fails the action is
    /// dropped and the history is left untouched.
    pub fn push(&mut self, mut action: Action<T, D>, target: &mut T) -> Result<(), HistoryError> {
        trace!("Running forward effect of '{}' (push)", action.name());
        if let Err(source) = action.apply(target) {
            warn!("Forward effect of '{}' failed, not recorded", action.name());
            return Err(HistoryError::Forward {
                action: action.name().to_string(),
                source,
            });
        }

        let discarded = self.stack.len() - self.applied;
        if discarded > 0 {
            debug!("Discarding {} action(s) from the redo tail", discarded);
        }
        self.stack.truncate(self.applied);
        self.stack.push(action);
        self.applied = self.stack.len();

        debug!(
            "Pushed action, history length {} cursor {}",
            self.stack.len(),
            self.stack_location()
        );
        self.notify();
        Ok(())
    }

    /// Revert the most recently applied action.
    ///
    /// Returns `Ok(false)` when nothing is applied.
    pub fn undo(&mut self, target: &mut T) -> Result<bool, HistoryError> {
        let Some(index) = self.applied.checked_sub(1) else {
            debug!("Nothing to undo");
            self.notify_noop();
            return Ok(false);
        };

        let action = &mut self.stack[index];
        trace!("Running backward effect of '{}'", action.name());
        if let Err(source) = action.revert(target) {
            warn!("Backward effect of '{}' failed", action.name());
            return Err(HistoryError::Backward {
                action: action.name().to_string(),
                source,
            });
        }

        self.applied = index;
        debug!("Undo complete, cursor {}", self.stack_location());
        self.notify();
        Ok(true)
    }

    /// Re-apply the next action of the redo tail.
    ///
    /// Returns `Ok(false)` when the redo tail is empty.
    pub fn redo(&mut self, target: &mut T) -> Result<bool, HistoryError> {
        let index = self.applied;
        let Some(action) = self.stack.get_mut(index) else {
            debug!("Nothing to redo");
            self.notify_noop();
            return Ok(false);
        };

        trace!("Running forward effect of '{}' (redo)", action.name());
        if let Err(source) = action.apply(target) {
            warn!("Forward effect of '{}' failed during redo", action.name());
            return Err(HistoryError::Forward {
                action: action.name().to_string(),
                source,
            });
        }

        self.applied = index + 1;
        debug!("Redo complete, cursor {}", self.stack_location());
        self.notify();
        Ok(true)
    }

    /// Forget every action. Listeners stay subscribed and are not notified.
    pub fn reset(&mut self) {
        debug!("Resetting history ({} action(s))", self.stack.len());
        self.stack.clear();
        self.applied = 0;
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// All recorded actions in chronological order, including the redo tail.
    pub fn stack(&self) -> &[Action<T, D>] {
        &self.stack
    }

    /// Index of the most recently applied action, `-1` when none is applied.
    pub fn stack_location(&self) -> isize {
        self.applied as isize - 1
    }

    /// Same as [`History::stack_location`] without the sentinel.
    pub fn cursor(&self) -> Option<usize> {
        self.applied.checked_sub(1)
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.applied > 0
    }

    pub fn can_redo(&self) -> bool {
        self.applied < self.stack.len()
    }

    /// Number of actions that can be undone.
    pub fn undo_depth(&self) -> usize {
        self.applied
    }

    /// Number of actions that can be redone.
    pub fn redo_depth(&self) -> usize {
        self.stack.len() - self.applied
    }

    /// Name of the action the next undo would revert.
    pub fn next_undo_name(&self) -> Option<&str> {
        self.cursor().map(|index| self.stack[index].name())
    }

    /// Name of the action the next redo would re-apply.
    pub fn next_redo_name(&self) -> Option<&str> {
        self.stack.get(self.applied).map(Action::name)
    }

    /// Long description of the action the next undo would revert.
    pub fn next_undo_description(&self) -> Option<&str> {
        self.cursor().map(|index| self.stack[index].description())
    }

    pub fn next_redo_description(&self) -> Option<&str> {
        self.stack.get(self.applied).map(Action::description)
    }

    // ------------------------------------------------------------------
    // Listeners
    // ------------------------------------------------------------------

    /// Register a change observer.
    ///
    /// Subscribing a listener that is already registered returns its existing
    /// handle and does not add it twice.
    pub fn subscribe(&mut self, listener: Listener) -> ListenerId {
        if let Some((id, _)) = self
            .listeners
            .iter()
            .find(|(_, existing)| same_listener(existing, &listener))
        {
            trace!("Listener already subscribed as {:?}", id);
            return *id;
        }

        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, listener));
        debug!("Subscribed listener {:?}", id);
        id
    }

    /// Shorthand for subscribing a fresh closure.
    pub fn on_change(&mut self, listener: impl Fn() + 'static) -> ListenerId {
        self.subscribe(Rc::new(listener))
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        let removed = self.listeners.len() != before;
        if removed {
            debug!("Unsubscribed listener {:?}", id);
        }
        removed
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn notify(&self) {
        trace!("Notifying {} listener(s)", self.listeners.len());
        for (_, listener) in &self.listeners {
            listener();
        }
    }

    fn notify_noop(&self) {
        if self.config.notify_on_noop {
            self.notify();
        }
    }
}

// Compare data pointers only; vtable pointers for the same closure may differ
// between codegen units.
fn same_listener(a: &Listener, b: &Listener) -> bool {
    std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}
