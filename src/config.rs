use crate::ir::Level;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Geometry shared by the style resolver and the layout engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub node_width: i64,
    pub horizontal_spacing: i64,
    pub original_y: i64,
    pub summary_y: i64,
    /// Band of depth-1 sections; deeper levels follow every `band_spacing`.
    pub first_band_y: i64,
    pub band_spacing: i64,
    pub min_height: i64,
    pub max_height: i64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 350,
            horizontal_spacing: 300,
            original_y: -800,
            summary_y: -400,
            first_band_y: 0,
            band_spacing: 400,
            min_height: 150,
            max_height: 400,
        }
    }
}

impl LayoutConfig {
    pub fn band_y(&self, level: Level) -> i64 {
        match level {
            Level::Original => self.original_y,
            Level::Summary => self.summary_y,
            Level::Band(depth) => self.first_band_y + (i64::from(depth) - 1) * self.band_spacing,
        }
    }

    /// Distance between neighbouring centres inside a sibling group.
    pub fn pitch(&self) -> i64 {
        self.node_width + self.horizontal_spacing
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub layout: LayoutConfig,
    /// Vault folder the breakdown notes live in. Derived from the original when unset.
    pub folder: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    node_width: Option<i64>,
    horizontal_spacing: Option<i64>,
    original_y: Option<i64>,
    summary_y: Option<i64>,
    first_band_y: Option<i64>,
    band_spacing: Option<i64>,
    min_height: Option<i64>,
    max_height: Option<i64>,
    folder: Option<String>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let parsed: ConfigFile = serde_json::from_str(&contents)
        .with_context(|| format!("parsing config {}", path.display()))?;
    apply_overrides(&mut config, parsed);
    tracing::debug!(path = %path.display(), "loaded config file");
    Ok(config)
}

fn apply_overrides(config: &mut Config, parsed: ConfigFile) {
    let layout = &mut config.layout;
    if let Some(v) = parsed.node_width {
        layout.node_width = v;
    }
    if let Some(v) = parsed.horizontal_spacing {
        layout.horizontal_spacing = v;
    }
    if let Some(v) = parsed.original_y {
        layout.original_y = v;
    }
    if let Some(v) = parsed.summary_y {
        layout.summary_y = v;
    }
    if let Some(v) = parsed.first_band_y {
        layout.first_band_y = v;
    }
    if let Some(v) = parsed.band_spacing {
        layout.band_spacing = v;
    }
    if let Some(v) = parsed.min_height {
        layout.min_height = v;
    }
    if let Some(v) = parsed.max_height {
        layout.max_height = v;
    }
    if let Some(v) = parsed.folder {
        config.folder = Some(v);
    }
}
