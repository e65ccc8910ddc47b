//! Action type definitions

use serde::{Deserialize, Serialize};

/// A typed event extracted from a single console line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// A player connected
    Join { name: String, address: String },

    /// A player disconnected
    Leave { name: String },

    /// A player said something in chat
    Chat { name: String, message: String },

    /// The line carried nothing we recognize
    Unrecognized,
}

impl Action {
    /// Name of the player this action refers to, if any
    pub fn player_name(&self) -> Option<&str> {
        match self {
            Action::Join { name, .. } | Action::Leave { name } | Action::Chat { name, .. } => {
                Some(name)
            }
            Action::Unrecognized => None,
        }
    }

    /// Whether applying this action can change the player registry
    pub fn is_mutating(&self) -> bool {
        matches!(self, Action::Join { .. } | Action::Leave { .. })
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Action::Unrecognized)
    }
}
