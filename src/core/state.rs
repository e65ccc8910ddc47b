//! Player and monitor state types

use serde::{Deserialize, Serialize};

/// A player currently connected to the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Name as reported by the server (case preserved)
    pub name: String,
    /// Remote address as reported on join
    pub address: String,
    /// Name with `§x` formatting codes removed
    pub display_name: String,
}

impl Player {
    /// Create a new player record
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        let name = name.into();
        let display_name = strip_formatting(&name);
        Self {
            name,
            address: address.into(),
            display_name,
        }
    }

    /// Registry key for a player name (names are case-insensitive)
    pub fn key_for(name: &str) -> String {
        name.trim().to_lowercase()
    }

    /// Registry key for this player
    pub fn key(&self) -> String {
        Self::key_for(&self.name)
    }

    /// A player needs a non-blank name to be tracked
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

fn strip_formatting(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars();
    while let Some(c) = chars.next() {
        if c == '§' {
            chars.next();
        } else {
            out.push(c);
        }
    }
    out
}

/// Counters for actions the registry ignored.
///
/// Duplicate joins and unknown leaves are not errors, but a steady climb
/// usually means the server output lost lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    /// Joins for a player who was already present
    pub suppressed_joins: u64,
    /// Leaves for a player who was not present
    pub suppressed_leaves: u64,
    /// Actions rejected as malformed (blank names)
    pub rejected: u64,
    /// Actions refused because handlers kept feeding actions back in
    #[serde(default)]
    pub feedback_loops: u64,
}

/// Snapshot of the monitor for display layers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorState {
    /// Whether the read loop is running
    pub running: bool,
    /// Players currently connected
    pub players: Vec<Player>,
    /// Names of enabled triggers
    pub enabled_triggers: Vec<String>,
    /// Registry counters
    #[serde(default)]
    pub stats: RegistryStats,
}

impl MonitorState {
    /// Check if a player is connected
    pub fn has_player(&self, name: &str) -> bool {
        let key = Player::key_for(name);
        self.players.iter().any(|p| p.key() == key)
    }
}
