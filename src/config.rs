//! YAML configuration for diagram generation.
//!
//! Every setting can also be given on the command line; CLI flags win over
//! the config file, which wins over the schema document's own `component`.

use crate::erd::{InferenceOptions, MatchPolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Implied-link inference settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Infer links from field names
    pub enabled: bool,
    /// Which candidate wins when several tables match: first, last
    pub policy: MatchPolicy,
    /// Only infer links for integer fields
    pub integer_only: bool,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            policy: MatchPolicy::default(),
            integer_only: false,
        }
    }
}

/// Complete YAML configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ErdConfig {
    /// Component path used to derive the table prefix (e.g. `mod/forum`)
    pub component: Option<String>,
    /// Explicit table prefix, overrides the component mapping
    pub prefix: Option<String>,
    /// Show field rows and field-level edges
    pub fields: bool,
    pub inference: InferenceConfig,
}

impl ErdConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: ErdConfig = serde_yaml_ng::from_str(&content)?;
        Ok(config)
    }

    pub fn inference_options(&self) -> InferenceOptions {
        InferenceOptions {
            enabled: self.inference.enabled,
            policy: self.inference.policy,
            integer_only: self.inference.integer_only,
        }
    }
}
