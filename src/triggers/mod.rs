//! Automation triggers
//!
//! A trigger subscribes to one kind of registry notification and, when a
//! notification passes its rule, queues its task on the [`TaskExecutor`].

mod types;
mod config;
mod manager;
mod rule_trigger;
mod rules;
mod task;

pub use types::{ComparisonOp, Trigger, TriggerInfo, TriggerRule};
pub use config::{TriggerConfig, TriggerKind};
pub use manager::TriggerManager;
pub use rule_trigger::RuleTrigger;
pub use rules::{CountThreshold, PlayerCount, PlayerJoined, PlayerLeft, ServerEmpty};
pub use task::{
    ConsoleCommandTask, FnTask, LogTask, Task, TaskContext, TaskError, TaskExecutor, TaskJob,
    TaskSubmitter,
};
