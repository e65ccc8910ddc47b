//! Built-in trigger rules

use super::config::TriggerKind;
use super::types::{ComparisonOp, TriggerRule};
use crate::core::{Notification, NotificationKind};

/// Accepts only a blank parameter string
fn parse_empty(text: &str) -> Option<()> {
    text.trim().is_empty().then_some(())
}

/// Fires whenever a player joins
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerJoined;

impl TriggerRule for PlayerJoined {
    type Params = ();

    fn kind(&self) -> NotificationKind {
        NotificationKind::Added
    }

    fn trigger_kind(&self) -> TriggerKind {
        TriggerKind::PlayerJoined
    }

    fn description(&self) -> &'static str {
        "Fires when a player joins the server"
    }

    fn parameter_description(&self) -> &'static str {
        "No parameters"
    }

    fn parse(&self, _text: &str) -> Option<()> {
        Some(())
    }

    fn matches(&self, _params: &(), _notification: &Notification) -> bool {
        true
    }
}

/// Fires whenever a player leaves
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerLeft;

impl TriggerRule for PlayerLeft {
    type Params = ();

    fn kind(&self) -> NotificationKind {
        NotificationKind::Removed
    }

    fn trigger_kind(&self) -> TriggerKind {
        TriggerKind::PlayerLeft
    }

    fn description(&self) -> &'static str {
        "Fires when a player leaves the server"
    }

    fn parameter_description(&self) -> &'static str {
        "No parameters"
    }

    fn parse(&self, _text: &str) -> Option<()> {
        Some(())
    }

    fn matches(&self, _params: &(), _notification: &Notification) -> bool {
        true
    }
}

/// Threshold parsed from `"<op> <n>"`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountThreshold {
    pub op: ComparisonOp,
    pub value: usize,
}

/// Fires on a join when the resulting player count satisfies a comparison
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerCount;

impl TriggerRule for PlayerCount {
    type Params = CountThreshold;

    fn kind(&self) -> NotificationKind {
        NotificationKind::Added
    }

    fn trigger_kind(&self) -> TriggerKind {
        TriggerKind::PlayerCount
    }

    fn description(&self) -> &'static str {
        "Fires when a join brings the player count to a threshold"
    }

    fn parameter_description(&self) -> &'static str {
        "Comparison and count, e.g. \">= 10\" (operators: == != < <= > >=)"
    }

    fn parse(&self, text: &str) -> Option<CountThreshold> {
        let text = text.trim();
        let split = text.find(|c: char| c.is_ascii_digit())?;
        let op = ComparisonOp::from_symbol(text[..split].trim())?;
        let value = text[split..].trim().parse().ok()?;
        Some(CountThreshold { op, value })
    }

    fn matches(&self, params: &CountThreshold, notification: &Notification) -> bool {
        params.op.compare(&notification.player_count, &params.value)
    }
}

/// Fires when the last player leaves
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerEmpty;

impl TriggerRule for ServerEmpty {
    type Params = ();

    fn kind(&self) -> NotificationKind {
        NotificationKind::Removed
    }

    fn trigger_kind(&self) -> TriggerKind {
        TriggerKind::ServerEmpty
    }

    fn description(&self) -> &'static str {
        "Fires when the last player leaves the server"
    }

    fn parameter_description(&self) -> &'static str {
        "No parameters"
    }

    fn parse(&self, text: &str) -> Option<()> {
        parse_empty(text)
    }

    fn matches(&self, _params: &(), notification: &Notification) -> bool {
        notification.player_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Player;

    fn added_with_count(count: usize) -> Notification {
        Notification::added(Player::new("Alice", "1.2.3.4"), count, 1)
    }

    #[test]
    fn test_parameterless_rules_accept_anything() {
        assert!(PlayerJoined.parse("").is_some());
        assert!(PlayerJoined.parse("whatever").is_some());
        assert!(PlayerLeft.parse("").is_some());
    }

    #[test]
    fn test_server_empty_rejects_parameters() {
        assert!(ServerEmpty.parse("  ").is_some());
        assert!(ServerEmpty.parse("5").is_none());
    }

    #[test]
    fn test_player_count_parse() {
        assert_eq!(
            PlayerCount.parse(">= 10"),
            Some(CountThreshold {
                op: ComparisonOp::GreaterThanOrEqual,
                value: 10
            })
        );
        assert_eq!(
            PlayerCount.parse("==3"),
            Some(CountThreshold {
                op: ComparisonOp::Equal,
                value: 3
            })
        );
        assert!(PlayerCount.parse("").is_none());
        assert!(PlayerCount.parse("10").is_none());
        assert!(PlayerCount.parse(">> 3").is_none());
        assert!(PlayerCount.parse(">= ten").is_none());
        assert!(PlayerCount.parse(">= 3 players").is_none());
    }

    #[test]
    fn test_player_count_matches() {
        let params = PlayerCount.parse(">= 2").unwrap();
        assert!(!PlayerCount.matches(&params, &added_with_count(1)));
        assert!(PlayerCount.matches(&params, &added_with_count(2)));
        assert!(PlayerCount.matches(&params, &added_with_count(5)));
    }

    #[test]
    fn test_server_empty_matches() {
        let left = |count| Notification::removed(Player::new("Bob", "x"), count, 1);
        assert!(ServerEmpty.matches(&(), &left(0)));
        assert!(!ServerEmpty.matches(&(), &left(1)));
    }
}
