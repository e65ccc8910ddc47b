//! In-process notification bus
//!
//! Subscribers register per [`NotificationKind`]. `publish` snapshots the
//! subscriber list, releases the lock and then dispatches on the calling
//! thread, so handlers may subscribe, unsubscribe or publish again without
//! deadlocking. Subscribers added during a dispatch do not see that
//! notification.

use std::cell::Cell;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::RwLock;

use super::events::{Notification, NotificationHandler, NotificationKind, SubscriberId};

/// Default limit on nested publishes from inside handlers
pub const DEFAULT_MAX_DISPATCH_DEPTH: usize = 8;

thread_local! {
    static DISPATCH_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Increments the thread's dispatch depth for the lifetime of a dispatch frame
struct DepthGuard;

impl DepthGuard {
    fn enter() -> Self {
        DISPATCH_DEPTH.with(|d| d.set(d.get() + 1));
        DepthGuard
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DISPATCH_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

/// How many dispatch frames the current thread is nested in
pub fn dispatch_depth() -> usize {
    DISPATCH_DEPTH.with(|d| d.get())
}

#[derive(Clone)]
enum Subscriber {
    Callback(NotificationHandler),
    Channel(Sender<Notification>),
}

#[derive(Clone)]
struct Entry {
    id: SubscriberId,
    subscriber: Subscriber,
}

/// Publish/subscribe register keyed by notification kind
pub struct NotificationBus {
    subscribers: RwLock<HashMap<NotificationKind, Vec<Entry>>>,
    max_depth: usize,
    suppressed_dispatches: AtomicU64,
}

impl NotificationBus {
    /// Create a bus with the default nesting limit
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DISPATCH_DEPTH)
    }

    /// Create a bus that drops publishes nested deeper than `max_depth`
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            max_depth: max_depth.max(1),
            suppressed_dispatches: AtomicU64::new(0),
        }
    }

    /// Register a callback for one kind of notification
    pub fn subscribe<F>(&self, kind: NotificationKind, handler: F) -> SubscriberId
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.subscribe_handler(kind, Arc::new(handler))
    }

    /// Register an already shared callback
    pub fn subscribe_handler(&self, kind: NotificationKind, handler: NotificationHandler) -> SubscriberId {
        self.insert(kind, Subscriber::Callback(handler))
    }

    /// Register a channel observer.
    ///
    /// Used to hand notifications to another execution context (a UI
    /// thread, say). Delivery never blocks the publisher. Dropping the
    /// receiver unsubscribes on the next publish.
    pub fn subscribe_channel(&self, kind: NotificationKind) -> (SubscriberId, Receiver<Notification>) {
        let (tx, rx) = unbounded();
        let id = self.insert(kind, Subscriber::Channel(tx));
        (id, rx)
    }

    fn insert(&self, kind: NotificationKind, subscriber: Subscriber) -> SubscriberId {
        let id = SubscriberId::next();
        self.subscribers
            .write()
            .entry(kind)
            .or_default()
            .push(Entry { id, subscriber });
        log::trace!("Bus: {} subscribed to {}", id, kind);
        id
    }

    /// Remove a subscription. Returns false if it was not registered.
    pub fn unsubscribe(&self, kind: NotificationKind, id: SubscriberId) -> bool {
        let mut subscribers = self.subscribers.write();
        let Some(entries) = subscribers.get_mut(&kind) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|e| e.id != id);
        let removed = entries.len() != before;
        if removed {
            log::trace!("Bus: {} unsubscribed from {}", id, kind);
        }
        removed
    }

    /// Number of current subscribers for a kind
    pub fn subscriber_count(&self, kind: NotificationKind) -> usize {
        self.subscribers.read().get(&kind).map_or(0, Vec::len)
    }

    /// Nesting limit for publishes from inside handlers
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Whether a publish from the current thread would be dropped
    pub fn is_saturated(&self) -> bool {
        dispatch_depth() >= self.max_depth
    }

    /// Publishes dropped because handlers kept re-publishing
    pub fn suppressed_dispatches(&self) -> u64 {
        self.suppressed_dispatches.load(Ordering::Relaxed)
    }

    /// Dispatch a notification to every current subscriber of its kind.
    ///
    /// Returns the number of subscribers it was handed to.
    pub fn publish(&self, notification: &Notification) -> usize {
        let depth = dispatch_depth();
        if depth >= self.max_depth {
            self.suppressed_dispatches.fetch_add(1, Ordering::Relaxed);
            log::warn!(
                "Bus: dropping {} notification for '{}' at dispatch depth {} (feedback loop?)",
                notification.kind,
                notification.player_name(),
                depth
            );
            return 0;
        }

        let snapshot: Vec<Entry> = match self.subscribers.read().get(&notification.kind) {
            Some(entries) if !entries.is_empty() => entries.clone(),
            _ => return 0,
        };

        let _guard = DepthGuard::enter();
        let mut closed = Vec::new();

        for entry in &snapshot {
            match &entry.subscriber {
                Subscriber::Callback(handler) => {
                    let result = panic::catch_unwind(AssertUnwindSafe(|| handler(notification)));
                    if result.is_err() {
                        log::error!("Bus: subscriber {} panicked handling {}", entry.id, notification.kind);
                    }
                }
                Subscriber::Channel(tx) => {
                    if tx.send(notification.clone()).is_err() {
                        closed.push(entry.id);
                    }
                }
            }
        }

        if !closed.is_empty() {
            if let Some(entries) = self.subscribers.write().get_mut(&notification.kind) {
                entries.retain(|e| !closed.contains(&e.id));
            }
            log::debug!("Bus: pruned {} closed channel observers", closed.len());
        }

        snapshot.len()
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NotificationBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let subscribers = self.subscribers.read();
        let counts: HashMap<_, _> = subscribers.iter().map(|(k, v)| (*k, v.len())).collect();
        f.debug_struct("NotificationBus")
            .field("subscribers", &counts)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}
