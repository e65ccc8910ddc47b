//! NYA Core Server Monitor
//!
//! Watches the console output of a running game server and keeps track of
//! who is connected:
//!
//! - `classifier` turns each output line into a typed [`Action`]
//! - `core` applies actions to the [`PlayerRegistry`] and publishes
//!   [`Notification`]s on the [`NotificationBus`]
//! - `triggers` subscribe to notifications and queue automation tasks
//!
//! [`ServerMonitor`] owns all of the above for one server process.
//!
//! ```no_run
//! use nyacore_servermon::{MonitorConfig, NotificationKind, ServerMonitor};
//!
//! let monitor = ServerMonitor::new(MonitorConfig::default())?;
//! let joins = monitor.observe(NotificationKind::Added);
//!
//! monitor.process_line("[INFO] Alice[/1.2.3.4] logged in");
//! assert_eq!(joins.recv().unwrap().player_name(), "Alice");
//! # Ok::<(), nyacore_servermon::ServermonError>(())
//! ```

pub mod classifier;
pub mod config;
pub mod core;
pub mod error;
pub mod triggers;

// Re-export commonly used types
pub use classifier::{classify, Action};
pub use config::{ConfigError, MonitorConfig, MonitorSettings};
pub use crate::core::{
    ApplyOutcome, MonitorState, Notification, NotificationBus, NotificationKind, Player,
    PlayerRegistry, RegistryStats, ServerMonitor, SubscriberId,
};
pub use error::{Result, ServermonError};
pub use triggers::{Task, TaskContext, TaskError, Trigger, TriggerConfig, TriggerKind, TriggerManager};
