//! Trigger type definitions

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::config::TriggerKind;
use super::task::Task;
use crate::core::{Notification, NotificationKind};

/// Comparison operators for trigger conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOp {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl ComparisonOp {
    /// Compare two values using this operator
    pub fn compare<T: PartialOrd>(&self, a: &T, b: &T) -> bool {
        match self {
            ComparisonOp::Equal => a == b,
            ComparisonOp::NotEqual => a != b,
            ComparisonOp::LessThan => a < b,
            ComparisonOp::LessThanOrEqual => a <= b,
            ComparisonOp::GreaterThan => a > b,
            ComparisonOp::GreaterThanOrEqual => a >= b,
        }
    }

    /// Parse an operator symbol such as `>=`
    pub fn from_symbol(s: &str) -> Option<Self> {
        match s {
            "==" | "=" => Some(ComparisonOp::Equal),
            "!=" => Some(ComparisonOp::NotEqual),
            "<" => Some(ComparisonOp::LessThan),
            "<=" => Some(ComparisonOp::LessThanOrEqual),
            ">" => Some(ComparisonOp::GreaterThan),
            ">=" => Some(ComparisonOp::GreaterThanOrEqual),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOp::Equal => "==",
            ComparisonOp::NotEqual => "!=",
            ComparisonOp::LessThan => "<",
            ComparisonOp::LessThanOrEqual => "<=",
            ComparisonOp::GreaterThan => ">",
            ComparisonOp::GreaterThanOrEqual => ">=",
        }
    }
}

/// Descriptive metadata shown by configuration editors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerInfo {
    /// Unique name of this trigger instance
    pub name: String,
    /// What the trigger reacts to
    pub description: String,
    /// Expected shape of the parameter string
    pub parameter_description: String,
}

/// A configurable binding from one notification kind to a task.
///
/// Triggers start disabled. While enabled they hold exactly one bus
/// subscription; `enabled` mirrors that subscription.
pub trait Trigger: Send + Sync {
    /// Name and descriptions
    fn info(&self) -> &TriggerInfo;

    /// Notification kind this trigger subscribes to
    fn kind(&self) -> NotificationKind;

    /// Built-in rule this trigger was created from
    fn trigger_kind(&self) -> TriggerKind;

    /// Task run when the trigger fires
    fn task(&self) -> &Arc<dyn Task>;

    /// Check a proposed parameter string without touching trigger state
    fn validate_input(&self, text: &str) -> bool;

    /// The currently loaded parameter string
    fn parameters(&self) -> String;

    /// Replace the parameter string.
    ///
    /// An enabled trigger is disabled, reloaded and re-enabled as one step,
    /// so no notification is ever matched against half-updated parameters.
    /// Does not re-validate; callers check with `validate_input` first.
    fn load(&self, parameters: &str);

    /// Subscribe to the bus. No-op if already enabled.
    fn enable(&self);

    /// Unsubscribe from the bus. No-op if already disabled.
    fn disable(&self);

    fn is_enabled(&self) -> bool;

    /// How many times this trigger has fired its task
    fn fire_count(&self) -> u64;
}

/// The part of a trigger that differs between variants: how parameters
/// parse and which notifications they select.
pub trait TriggerRule: Send + Sync + 'static {
    /// Parsed form of the parameter string
    type Params: Send + Sync + 'static;

    fn kind(&self) -> NotificationKind;

    fn trigger_kind(&self) -> TriggerKind;

    fn description(&self) -> &'static str;

    fn parameter_description(&self) -> &'static str;

    /// Parse a parameter string, `None` if it is invalid
    fn parse(&self, text: &str) -> Option<Self::Params>;

    /// Whether a notification of this rule's kind should fire the task
    fn matches(&self, params: &Self::Params, notification: &Notification) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_ops() {
        assert!(ComparisonOp::Equal.compare(&5, &5));
        assert!(!ComparisonOp::Equal.compare(&5, &6));
        assert!(ComparisonOp::LessThan.compare(&5, &6));
        assert!(ComparisonOp::GreaterThanOrEqual.compare(&5, &5));
    }

    #[test]
    fn test_symbol_round_trip() {
        for op in [
            ComparisonOp::Equal,
            ComparisonOp::NotEqual,
            ComparisonOp::LessThan,
            ComparisonOp::LessThanOrEqual,
            ComparisonOp::GreaterThan,
            ComparisonOp::GreaterThanOrEqual,
        ] {
            assert_eq!(ComparisonOp::from_symbol(op.symbol()), Some(op));
        }
        assert_eq!(ComparisonOp::from_symbol("=>"), None);
    }
}
