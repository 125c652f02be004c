///! Status indicator for ruleset nodes

use crate::rules::Ruleset;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeStatus {
    /// Disabled
    Red,
    /// Enabled and active
    Green,
    /// Enabled but the validity window has not started yet
    Blue,
    /// Enabled but the validity window has ended
    Grey,
}

impl NodeStatus {
    pub fn class(&self) -> &'static str {
        match self {
            NodeStatus::Red => "bg-red",
            NodeStatus::Green => "bg-green",
            NodeStatus::Blue => "bg-blue",
            NodeStatus::Grey => "bg-grey",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NodeStatus::Red => "disabled",
            NodeStatus::Green => "active",
            NodeStatus::Blue => "pending",
            NodeStatus::Grey => "expired",
        }
    }
}

/// Derive the status of `ruleset` at `now_ms` (epoch millis).
///
/// Recurrence in the validity window is not evaluated; a recurring ruleset
/// inside its start/end bounds reports `Green`.
pub fn status_of(ruleset: &Ruleset, now_ms: i64) -> NodeStatus {
    if !ruleset.enabled {
        return NodeStatus::Red;
    }

    let Some(validity) = ruleset.validity() else {
        return NodeStatus::Green;
    };

    match (validity.start, validity.end) {
        (Some(start), _) if now_ms < start => NodeStatus::Blue,
        (Some(_), Some(end)) if now_ms > end => NodeStatus::Grey,
        _ => NodeStatus::Green,
    }
}

/// [`status_of`] against the wall clock
pub fn current_status(ruleset: &Ruleset) -> NodeStatus {
    status_of(ruleset, chrono::Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::CalendarEvent;
    use crate::testing::ruleset;

    const NOW: i64 = 1_700_000_000_000;

    fn with_window(start: Option<i64>, end: Option<i64>) -> Ruleset {
        let mut r = ruleset(1, "windowed");
        r.set_validity(&CalendarEvent {
            start,
            end,
            recurrence: None,
        });
        r
    }

    #[test]
    fn test_disabled_is_red_regardless_of_window() {
        let mut r = with_window(Some(NOW + 1000), None);
        r.enabled = false;
        assert_eq!(status_of(&r, NOW), NodeStatus::Red);

        let mut plain = ruleset(2, "plain");
        plain.enabled = false;
        assert_eq!(status_of(&plain, NOW), NodeStatus::Red);
    }

    #[test]
    fn test_enabled_without_meta_is_green() {
        assert_eq!(status_of(&ruleset(1, "r"), NOW), NodeStatus::Green);
    }

    #[test]
    fn test_not_started_is_blue() {
        let r = with_window(Some(NOW + 1000), None);
        assert_eq!(status_of(&r, NOW), NodeStatus::Blue);
    }

    #[test]
    fn test_expired_is_grey() {
        let r = with_window(Some(NOW - 1000), Some(NOW - 1));
        assert_eq!(status_of(&r, NOW), NodeStatus::Grey);
    }

    #[test]
    fn test_inside_window_is_green() {
        let r = with_window(Some(NOW - 1000), Some(NOW + 1000));
        assert_eq!(status_of(&r, NOW), NodeStatus::Green);
        // both bounds are inclusive
        assert_eq!(status_of(&r, NOW - 1000), NodeStatus::Green);
        assert_eq!(status_of(&r, NOW + 1000), NodeStatus::Green);
    }

    #[test]
    fn test_window_without_start_is_green() {
        let r = with_window(None, Some(NOW - 1));
        assert_eq!(status_of(&r, NOW), NodeStatus::Green);
    }

    #[test]
    fn test_recurrence_falls_through_to_green() {
        let mut r = ruleset(1, "weekly");
        r.set_validity(&CalendarEvent {
            start: Some(NOW - 1000),
            end: None,
            recurrence: Some("FREQ=WEEKLY".to_string()),
        });
        assert_eq!(status_of(&r, NOW), NodeStatus::Green);
    }

    #[test]
    fn test_classes() {
        assert_eq!(NodeStatus::Blue.class(), "bg-blue");
        assert_eq!(NodeStatus::Grey.label(), "expired");
    }
}
