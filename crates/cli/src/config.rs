use anyhow::{Context, Result};
use refscope_extractor::ExtractorConfig;
use refscope_layout::{LayoutConfig, Size};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Settings file passed with `--config`.
///
/// ```toml
/// [extractor]
/// extensions = ["cs"]
///
/// [layout.grid]
/// padding = 15.0
///
/// [layout.force]
/// seed = 7
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub extractor: ExtractorConfig,
    pub layout: LayoutConfig,
}

impl FileConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: FileConfig = toml::from_str(&raw)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.extractor.validate()?;
        self.layout.validate()?;
        Ok(())
    }
}

/// Node sizes measured elsewhere: `{"Player": {"width": 180, "height": 90}, ...}`
pub fn load_sizes(path: &Path) -> Result<HashMap<String, Size>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read sizes {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid sizes file {}", path.display()))
}
