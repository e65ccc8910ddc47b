//! Configuration types for the server monitor
//!
//! These types define the structure of monitor configurations loaded from
//! TOML files:
//!
//! ```toml
//! [monitor]
//! max_dispatch_depth = 8
//! clear_on_stop = true
//!
//! [[triggers]]
//! name = "welcome"
//! kind = "player_joined"
//! command = "say Welcome {player}!"
//!
//! [[triggers]]
//! name = "crowd"
//! kind = "player_count"
//! parameters = ">= 10"
//! enabled = false
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

use crate::core::DEFAULT_MAX_DISPATCH_DEPTH;
use crate::triggers::TriggerConfig;

/// Errors loading a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for the monitor itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorSettings {
    /// Publishes nested deeper than this inside handlers are dropped
    #[serde(default = "default_max_dispatch_depth")]
    pub max_dispatch_depth: usize,

    /// Remove every player when the output stream ends
    #[serde(default = "default_true")]
    pub clear_on_stop: bool,
}

fn default_max_dispatch_depth() -> usize {
    DEFAULT_MAX_DISPATCH_DEPTH
}

fn default_true() -> bool {
    true
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            max_dispatch_depth: default_max_dispatch_depth(),
            clear_on_stop: true,
        }
    }
}

/// Top-level monitor configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default)]
    pub monitor: MonitorSettings,

    #[serde(default)]
    pub triggers: Vec<TriggerConfig>,
}

impl MonitorConfig {
    /// Parse and validate configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        log::debug!("Loading monitor configuration from {}", path.display());
        Self::from_toml(&content)
    }

    /// Serialize back to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Check structural rules that serde cannot express.
    ///
    /// Trigger parameters are validated later by the triggers themselves.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.monitor.max_dispatch_depth == 0 {
            return Err(ConfigError::Invalid(
                "max_dispatch_depth must be at least 1".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for trigger in &self.triggers {
            if trigger.name.trim().is_empty() {
                return Err(ConfigError::Invalid("trigger with empty name".to_string()));
            }
            if !seen.insert(trigger.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate trigger name: {}",
                    trigger.name
                )));
            }
        }
        Ok(())
    }

    /// Add a trigger definition
    pub fn with_trigger(mut self, trigger: TriggerConfig) -> Self {
        self.triggers.push(trigger);
        self
    }
}
