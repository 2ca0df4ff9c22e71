// Editor module for AUTOMA UI.

pub mod canvas;
pub mod commands;
pub mod history;
pub mod session;
pub mod tools;

pub use canvas::{ColorScheme, NodeAppearance, TransitionAppearance};
pub use commands::{EditAction, EditPayload};
pub use history::{HistoryWatch, ToolbarState};
pub use session::{ClickOutcome, Editor, EditorError};
pub use tools::{Selection, Tool};
