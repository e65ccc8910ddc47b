//! Notifications emitted by the player registry

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use super::state::Player;

/// Kind of registry transition a notification describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Added,
    Removed,
    Changed,
}

impl NotificationKind {
    /// All kinds, in declaration order
    pub const ALL: [NotificationKind; 3] = [
        NotificationKind::Added,
        NotificationKind::Removed,
        NotificationKind::Changed,
    ];
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NotificationKind::Added => "added",
            NotificationKind::Removed => "removed",
            NotificationKind::Changed => "changed",
        };
        f.write_str(s)
    }
}

/// Event describing a committed registry transition
#[derive(Debug, Clone)]
pub struct Notification {
    /// What happened
    pub kind: NotificationKind,
    /// The player involved, if the transition concerns one
    pub player: Option<Player>,
    /// Live player count after the transition was committed
    pub player_count: usize,
    /// Per-registry sequence number, increasing with every transition
    pub sequence: u64,
    /// When the transition was committed
    pub timestamp: Instant,
}

impl Notification {
    /// Create a notification for a player that just joined
    pub fn added(player: Player, player_count: usize, sequence: u64) -> Self {
        Self::new(NotificationKind::Added, Some(player), player_count, sequence)
    }

    /// Create a notification for a player that just left
    pub fn removed(player: Player, player_count: usize, sequence: u64) -> Self {
        Self::new(NotificationKind::Removed, Some(player), player_count, sequence)
    }

    /// Create a notification of any kind
    pub fn new(
        kind: NotificationKind,
        player: Option<Player>,
        player_count: usize,
        sequence: u64,
    ) -> Self {
        Self {
            kind,
            player,
            player_count,
            sequence,
            timestamp: Instant::now(),
        }
    }

    /// Name of the player involved, or an empty string
    pub fn player_name(&self) -> &str {
        self.player.as_ref().map(|p| p.name.as_str()).unwrap_or("")
    }
}

/// Handle identifying one bus subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Allocate a process-unique id
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// Callback type for bus subscribers
pub type NotificationHandler = std::sync::Arc<dyn Fn(&Notification) + Send + Sync>;
