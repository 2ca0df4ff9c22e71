//! automa-core: the action history engine behind the AUTOMA diagram editor.
//!
//! Design rules:
//! - Every mutating edit is an [`Action`] with a forward effect and its exact inverse.
//! - One [`History`] per editing session, owned by the editor and passed by reference.
//! - Stack and cursor change only after an effect succeeds.
//! - Listeners hear about every successful push, undo and redo.

pub mod action;
pub mod history;

pub use action::{Action, ActionBuilder, ActionError, Effect};
pub use history::{History, HistoryConfig, HistoryError, Listener, ListenerId};
