use crate::error::{ExtractError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for reference extraction and source enumeration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Pattern rules applied to every unit (empty = no references)
    pub rules: Vec<PatternRule>,

    /// Expand short names through the unit's using directives
    pub expand_aliases: bool,

    /// Files larger than this are skipped by the scanner
    pub max_file_size_bytes: u64,

    /// File extensions (without the dot) treated as source units
    pub extensions: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            rules: PatternRule::ALL.to_vec(),
            expand_aliases: true,
            max_file_size_bytes: 1_048_576,
            extensions: vec!["cs".to_string()],
        }
    }
}

impl ExtractorConfig {
    /// Config that only looks at field declarations
    pub fn fields_only() -> Self {
        Self {
            rules: vec![PatternRule::Fields],
            expand_aliases: false,
            ..Default::default()
        }
    }

    pub fn is_enabled(&self, rule: PatternRule) -> bool {
        self.rules.contains(&rule)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_file_size_bytes == 0 {
            return Err(ExtractError::invalid_config(
                "max_file_size_bytes must be > 0",
            ));
        }

        if self.extensions.iter().any(|ext| ext.trim().is_empty()) {
            return Err(ExtractError::invalid_config(
                "extensions must not contain empty entries",
            ));
        }

        if let Some(ext) = self.extensions.iter().find(|ext| ext.starts_with('.')) {
            return Err(ExtractError::invalid_config(format!(
                "extension {ext:?} must be given without the leading dot"
            )));
        }

        Ok(())
    }
}

/// Independent pattern rule whose matches are unioned into a unit's references
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternRule {
    /// Access-modifier prefixed field and property declarations
    Fields,

    /// Method return types and parameter types
    Methods,

    /// Base class and interface lists
    Inheritance,

    /// `x = new T(...)` constructions
    Instantiations,

    /// `[Name]` attribute usages
    Attributes,
}

impl PatternRule {
    pub const ALL: [PatternRule; 5] = [
        PatternRule::Fields,
        PatternRule::Methods,
        PatternRule::Inheritance,
        PatternRule::Instantiations,
        PatternRule::Attributes,
    ];
}
