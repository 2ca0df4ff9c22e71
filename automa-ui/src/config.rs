//! Editor configuration.
//!
//! Loaded from a JSON file; every field is optional and falls back to its default.

use anyhow::Context;
use automa_core::HistoryConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::editor::ColorScheme;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub history: HistoryConfig,
    pub colors: ColorScheme,
    /// Grid spacing in logical pixels.
    pub grid_size: f32,
    pub snap_to_grid: bool,
    /// Prefix for automatically named nodes (`q0`, `q1`, ...).
    pub node_label_prefix: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history: HistoryConfig::default(),
            colors: ColorScheme::default(),
            grid_size: 20.0,
            snap_to_grid: true,
            node_label_prefix: "q".to_string(),
        }
    }
}

/// Load an editor config file.
pub fn load_config(path: impl AsRef<Path>) -> anyhow::Result<EditorConfig> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)
        .with_context(|| format!("read config file: {}", path.display()))?;
    let config: EditorConfig = serde_json::from_str(&data)
        .with_context(|| format!("parse config json: {}", path.display()))?;
    info!("Loaded editor config from {}", path.display());
    Ok(config)
}
