//! Core monitor abstractions
//!
//! This module contains the main types for tracking a running server:
//! - `PlayerRegistry` - Authoritative set of connected players
//! - `NotificationBus` - Publish/subscribe glue for registry transitions
//! - `ServerMonitor` - Owner that feeds server output through the pipeline
//! - `Notification` - Events emitted when the registry changes

mod bus;
mod events;
mod registry;
mod runner;
mod state;

pub use bus::{dispatch_depth, NotificationBus, DEFAULT_MAX_DISPATCH_DEPTH};
pub use events::{Notification, NotificationHandler, NotificationKind, SubscriberId};
pub use registry::{ApplyOutcome, IgnoreReason, PlayerRegistry};
pub use runner::ServerMonitor;
pub use state::{MonitorState, Player, RegistryStats};
