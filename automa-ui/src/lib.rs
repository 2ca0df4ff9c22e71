//! automa-ui: the interaction layer of the AUTOMA diagram editor.
//!
//! Rendering lives in the front end. This crate turns clicks, drags and key
//! presses into undoable edits and tells the front end what to draw.

pub mod config;
pub mod editor;

pub use config::{load_config, EditorConfig};
pub use editor::{ClickOutcome, Editor, EditorError, Tool, ToolbarState};

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` overrides the `info` default.
/// Calling it again is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
