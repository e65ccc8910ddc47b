//! Registry of connected players
//!
//! The registry is the single owner of player state. Mutations happen under
//! one coarse lock; the resulting notification is published after the lock
//! is released, so handlers can query the registry (or apply further
//! actions) and always see the committed state.
//!
//! Sequence numbers are assigned under the lock, but publishing is not. With
//! several threads applying actions at once, observers may receive
//! notifications out of commit order and should order them by
//! [`Notification::sequence`]. A single producer always delivers in order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::bus::{self, NotificationBus};
use super::events::Notification;
use super::state::{Player, RegistryStats};
use crate::classifier::Action;

/// Why an action left the registry untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// `initialize` has not been called yet
    NotInitialized,
    /// Join for a player who is already present
    DuplicateJoin,
    /// Leave for a player who is not present
    UnknownLeave,
    /// Blank player name
    Malformed,
    /// Chat or unrecognized line
    NotMutating,
    /// Applied from a handler nested past the bus's dispatch depth limit
    FeedbackLoop,
}

/// Result of applying an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Added(Player),
    Removed(Player),
    Ignored(IgnoreReason),
}

impl ApplyOutcome {
    /// Whether the registry changed
    pub fn is_transition(&self) -> bool {
        !matches!(self, ApplyOutcome::Ignored(_))
    }
}

#[derive(Default)]
struct Counters {
    suppressed_joins: AtomicU64,
    suppressed_leaves: AtomicU64,
    rejected: AtomicU64,
    feedback_loops: AtomicU64,
}

/// Thread-safe mapping of lowercased player name to [`Player`]
pub struct PlayerRegistry {
    players: Mutex<HashMap<String, Player>>,
    bus: Arc<NotificationBus>,
    initialized: AtomicBool,
    /// Only advanced while `players` is locked
    sequence: AtomicU64,
    counters: Counters,
}

impl PlayerRegistry {
    /// Create a registry publishing to `bus`. Call [`initialize`](Self::initialize)
    /// before applying actions.
    pub fn new(bus: Arc<NotificationBus>) -> Self {
        Self {
            players: Mutex::new(HashMap::new()),
            bus,
            initialized: AtomicBool::new(false),
            sequence: AtomicU64::new(0),
            counters: Counters::default(),
        }
    }

    /// Establish an empty mapping and start accepting actions.
    ///
    /// Returns false (and does nothing) if already initialized.
    pub fn initialize(&self) -> bool {
        let mut players = self.players.lock();
        if self.initialized.load(Ordering::SeqCst) {
            return false;
        }
        players.clear();
        self.initialized.store(true, Ordering::SeqCst);
        log::info!("Player registry initialized");
        true
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// The bus this registry publishes to
    pub fn bus(&self) -> &Arc<NotificationBus> {
        &self.bus
    }

    /// Apply a classified action, publishing at most one notification.
    ///
    /// Never fails: duplicate joins, unknown leaves and malformed names are
    /// ignored and counted.
    pub fn apply(&self, action: &Action) -> ApplyOutcome {
        if !action.is_mutating() {
            return ApplyOutcome::Ignored(IgnoreReason::NotMutating);
        }

        if !self.is_initialized() {
            log::warn!("Player registry not initialized, ignoring {:?}", action);
            return ApplyOutcome::Ignored(IgnoreReason::NotInitialized);
        }

        // A transition is only committed if its notification can be delivered
        if self.bus.is_saturated() {
            self.counters.feedback_loops.fetch_add(1, Ordering::Relaxed);
            log::warn!(
                "Refusing {:?} at dispatch depth {} (feedback loop?)",
                action,
                bus::dispatch_depth()
            );
            return ApplyOutcome::Ignored(IgnoreReason::FeedbackLoop);
        }

        match action {
            Action::Join { name, address } => self.add(Player::new(name.as_str(), address.as_str())),
            Action::Leave { name } => self.remove(name),
            Action::Chat { .. } | Action::Unrecognized => {
                ApplyOutcome::Ignored(IgnoreReason::NotMutating)
            }
        }
    }

    fn add(&self, player: Player) -> ApplyOutcome {
        if !player.is_valid() {
            self.counters.rejected.fetch_add(1, Ordering::Relaxed);
            log::debug!("Rejected join with blank player name");
            return ApplyOutcome::Ignored(IgnoreReason::Malformed);
        }

        let notification = {
            let mut players = self.players.lock();
            let key = player.key();
            if players.contains_key(&key) {
                self.counters.suppressed_joins.fetch_add(1, Ordering::Relaxed);
                log::debug!("Ignoring duplicate join for {}", player.name);
                return ApplyOutcome::Ignored(IgnoreReason::DuplicateJoin);
            }
            players.insert(key, player.clone());
            let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
            Notification::added(player.clone(), players.len(), sequence)
        };

        log::info!(
            "Player joined: {} ({}) - {} online",
            player.name,
            player.address,
            notification.player_count
        );
        self.bus.publish(&notification);
        ApplyOutcome::Added(player)
    }

    fn remove(&self, name: &str) -> ApplyOutcome {
        let key = Player::key_for(name);
        if key.is_empty() {
            self.counters.rejected.fetch_add(1, Ordering::Relaxed);
            log::debug!("Rejected leave with blank player name");
            return ApplyOutcome::Ignored(IgnoreReason::Malformed);
        }

        let (player, notification) = {
            let mut players = self.players.lock();
            let Some(player) = players.remove(&key) else {
                self.counters.suppressed_leaves.fetch_add(1, Ordering::Relaxed);
                log::debug!("Ignoring leave for unknown player {}", name);
                return ApplyOutcome::Ignored(IgnoreReason::UnknownLeave);
            };
            let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
            let notification = Notification::removed(player.clone(), players.len(), sequence);
            (player, notification)
        };

        log::info!(
            "Player left: {} - {} online",
            player.name,
            notification.player_count
        );
        self.bus.publish(&notification);
        ApplyOutcome::Removed(player)
    }

    /// Remove every player, publishing a removal for each.
    ///
    /// Used when the server process stops without reporting leaves.
    pub fn clear(&self) -> usize {
        if self.bus.is_saturated() {
            self.counters.feedback_loops.fetch_add(1, Ordering::Relaxed);
            log::warn!("Refusing to clear registry at dispatch depth {}", bus::dispatch_depth());
            return 0;
        }

        let notifications: Vec<Notification> = {
            let mut players = self.players.lock();
            let mut drained: Vec<Player> = players.drain().map(|(_, p)| p).collect();
            drained.sort_by(|a, b| a.key().cmp(&b.key()));
            let total = drained.len();
            drained
                .into_iter()
                .enumerate()
                .map(|(i, player)| {
                    let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
                    Notification::removed(player, total - i - 1, sequence)
                })
                .collect()
        };

        if !notifications.is_empty() {
            log::info!("Cleared {} players from registry", notifications.len());
        }
        for notification in &notifications {
            self.bus.publish(notification);
        }
        notifications.len()
    }

    /// Snapshot of every connected player, sorted by key
    pub fn get_all(&self) -> Vec<Player> {
        let mut players: Vec<Player> = self.players.lock().values().cloned().collect();
        players.sort_by(|a, b| a.key().cmp(&b.key()));
        players
    }

    /// Case-insensitive lookup
    pub fn get_by_name(&self, name: &str) -> Option<Player> {
        self.players.lock().get(&Player::key_for(name)).cloned()
    }

    /// Number of connected players
    pub fn count(&self) -> usize {
        self.players.lock().len()
    }

    /// Counters for ignored actions
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            suppressed_joins: self.counters.suppressed_joins.load(Ordering::Relaxed),
            suppressed_leaves: self.counters.suppressed_leaves.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
            feedback_loops: self.counters.feedback_loops.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for PlayerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerRegistry")
            .field("players", &self.count())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
