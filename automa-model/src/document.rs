//! Diagram files.
//!
//! A saved diagram is the [`Diagram`] struct dumped as pretty JSON. Only the
//! document is written; edit history never leaves the session.

use anyhow::Context;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::Diagram;

/// File extension recommended for saved diagrams.
pub const DIAGRAM_FILE_EXT: &str = "automa.json";

/// Save a diagram to disk as pretty JSON.
pub fn save_diagram(path: impl AsRef<Path>, diagram: &Diagram) -> anyhow::Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        // fs::write does NOT create directories
        fs::create_dir_all(parent)
            .with_context(|| format!("create parent dir: {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(diagram).context("serialize diagram to json")?;
    fs::write(path, json).with_context(|| format!("write diagram file: {}", path.display()))?;
    info!(
        "Saved diagram {} ({} nodes, {} transitions) to {}",
        diagram.diagram_id,
        diagram.nodes.len(),
        diagram.transitions.len(),
        path.display()
    );
    Ok(())
}

/// Load a diagram from disk and check that its references line up.
pub fn load_diagram(path: impl AsRef<Path>) -> anyhow::Result<Diagram> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)
        .with_context(|| format!("read diagram file: {}", path.display()))?;
    let diagram: Diagram = serde_json::from_str(&data).context("parse diagram json")?;
    diagram
        .validate()
        .with_context(|| format!("invalid diagram in {}", path.display()))?;
    info!("Loaded diagram {} from {}", diagram.diagram_id, path.display());
    Ok(diagram)
}
