//! Line patterns recognized by the classifier
//!
//! Patterns are tried most-specific first: join, leave, chat. Each one is
//! anchored at the start of the payload left after [`strip_prefix`], so a
//! chat message that merely mentions "logged in" is still chat.

use once_cell::sync::Lazy;
use regex::Regex;

use super::Action;

/// Optional date, optional time (which may be followed by a bare level word
/// such as `INFO`), then any number of bracketed tags such as `[INFO]` or
/// `[Server thread/INFO]:`
static PREFIX_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:\d{4}-\d{2}-\d{2}[ T])?(?:\d{2}:\d{2}:\d{2}(?:[.,]\d+)?\s*(?:(?:INFO|WARN|WARNING|SEVERE|ERROR|FATAL|DEBUG|TRACE|FINE)\b:?\s+)?)?(?:\[[^\]]*\]:?\s*)*(?::\s+)?",
    )
    .unwrap()
});

static JOIN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<name>[A-Za-z0-9_]{1,16}) ?\[/?(?P<address>[^\]]+)\] logged in\b").unwrap()
});

static LEAVE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<name>[A-Za-z0-9_]{1,16}) (?:left the game\s*$|lost connection\b)").unwrap()
});

static CHAT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<(?P<name>[^<>\s]{1,32})> ?(?P<message>.+)$").unwrap());

/// Strip log timestamps and level tags, returning the semantic payload
pub fn strip_prefix(line: &str) -> &str {
    match PREFIX_REGEX.find(line) {
        Some(m) => &line[m.end()..],
        None => line,
    }
}

/// Classify a single line of server output.
///
/// Never fails: anything without a recognizable payload is
/// [`Action::Unrecognized`].
pub fn classify(line: &str) -> Action {
    let payload = strip_prefix(line.trim_end());
    if payload.is_empty() {
        return Action::Unrecognized;
    }

    if let Some(caps) = JOIN_REGEX.captures(payload) {
        return Action::Join {
            name: caps["name"].to_string(),
            address: caps["address"].to_string(),
        };
    }

    if let Some(caps) = LEAVE_REGEX.captures(payload) {
        return Action::Leave {
            name: caps["name"].to_string(),
        };
    }

    if let Some(caps) = CHAT_REGEX.captures(payload) {
        return Action::Chat {
            name: caps["name"].to_string(),
            message: caps["message"].trim_end().to_string(),
        };
    }

    Action::Unrecognized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn join(name: &str, address: &str) -> Action {
        Action::Join {
            name: name.into(),
            address: address.into(),
        }
    }

    #[test]
    fn test_strip_prefix() {
        assert_eq!(strip_prefix("[INFO] Alice left the game"), "Alice left the game");
        assert_eq!(
            strip_prefix("[12:00:01] [Server thread/INFO]: <Alice> hi"),
            "<Alice> hi"
        );
        assert_eq!(
            strip_prefix("2011-09-15 18:20:03 [INFO] Bob left the game"),
            "Bob left the game"
        );
        assert_eq!(strip_prefix("no prefix here"), "no prefix here");
    }

    #[test]
    fn test_join() {
        assert_eq!(classify("[INFO] Alice[/1.2.3.4] logged in"), join("Alice", "1.2.3.4"));
        assert_eq!(
            classify("[12:00:01] [Server thread/INFO]: Steve_01[/192.168.0.5:51234] logged in with entity id 42 at (0.5, 64.0, 0.5)"),
            join("Steve_01", "192.168.0.5:51234")
        );
        // Older servers put a space between the name and the address
        assert_eq!(
            classify("2011-09-15 18:20:03 [INFO] Notch [/127.0.0.1:52254] logged in with entity id 189 at (-211.5, 68.0, 244.5)"),
            join("Notch", "127.0.0.1:52254")
        );
        assert_eq!(
            classify("Notch  [/127.0.0.1:1] logged in"),
            Action::Unrecognized
        );
    }

    #[test]
    fn test_bare_level_word_after_time() {
        assert_eq!(
            strip_prefix("2024-01-01 12:00:00 INFO Alice left the game"),
            "Alice left the game"
        );
        assert_eq!(
            classify("12:00:00 WARN: Alice[/1.2.3.4] logged in"),
            join("Alice", "1.2.3.4")
        );
        // Without a timestamp a leading word is part of the payload
        assert_eq!(classify("INFO left the game"), Action::Leave { name: "INFO".into() });
    }

    #[test]
    fn test_leave() {
        assert_eq!(
            classify("[INFO] Alice left the game"),
            Action::Leave { name: "Alice".into() }
        );
        assert_eq!(
            classify("[10:00:00] [Server thread/INFO]: Bob lost connection: Disconnected"),
            Action::Leave { name: "Bob".into() }
        );
    }

    #[test]
    fn test_chat() {
        assert_eq!(
            classify("[INFO] <Alice> hello\r\n"),
            Action::Chat {
                name: "Alice".into(),
                message: "hello".into()
            }
        );
        assert_eq!(
            classify("[INFO] <Alice>"),
            Action::Unrecognized
        );
    }

    #[test]
    fn test_priority_keeps_chat_as_chat() {
        // A chat line quoting a join message is chat, not a join
        assert_eq!(
            classify("[INFO] <Alice> Bob[/1.2.3.4] logged in"),
            Action::Chat {
                name: "Alice".into(),
                message: "Bob[/1.2.3.4] logged in".into()
            }
        );
        assert_eq!(
            classify("[INFO] <Alice> Bob left the game"),
            Action::Chat {
                name: "Alice".into(),
                message: "Bob left the game".into()
            }
        );
    }

    #[test]
    fn test_unrecognized() {
        for line in [
            "",
            "   ",
            "[INFO]",
            "[INFO] Done (3.21s)! For help, type \"help\"",
            "[WARN] Can't keep up! Is the server overloaded?",
            "Alice joined the party",
            "[Server] Welcome Alice",
        ] {
            assert_eq!(classify(line), Action::Unrecognized, "line: {line:?}");
        }
    }
}
