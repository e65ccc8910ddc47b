//! Trigger configuration types

use serde::{Deserialize, Serialize};

/// Built-in trigger variants that can be created from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    PlayerJoined,
    PlayerLeft,
    PlayerCount,
    ServerEmpty,
}

impl TriggerKind {
    /// Parse a kind from its configuration name
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "player_joined" | "joined" | "join" => Some(Self::PlayerJoined),
            "player_left" | "left" | "leave" => Some(Self::PlayerLeft),
            "player_count" | "count" => Some(Self::PlayerCount),
            "server_empty" | "empty" => Some(Self::ServerEmpty),
            _ => None,
        }
    }
}

/// Configuration for one trigger instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Unique name of this trigger
    pub name: String,

    /// Which built-in rule to use
    pub kind: TriggerKind,

    /// Rule-specific parameter string
    #[serde(default)]
    pub parameters: String,

    /// Whether the trigger should be subscribed after loading
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Console command template sent when the trigger fires
    #[serde(default)]
    pub command: Option<String>,
}

fn default_true() -> bool {
    true
}

impl TriggerConfig {
    /// Create an enabled configuration with no parameters
    pub fn new(name: impl Into<String>, kind: TriggerKind) -> Self {
        Self {
            name: name.into(),
            kind,
            parameters: String::new(),
            enabled: true,
            command: None,
        }
    }

    /// Set the parameter string
    pub fn with_parameters(mut self, parameters: impl Into<String>) -> Self {
        self.parameters = parameters.into();
        self
    }

    /// Set the console command template
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Mark the trigger as disabled
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}
