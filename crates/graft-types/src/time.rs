use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Wall-clock stamp attached to update notifications.
///
/// Purely informational: the propagation tree forwards it verbatim to
/// handlers and attaches no temporal semantics. Millisecond resolution is
/// enough for an event stamp.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventTime {
    millis: u64,
}

impl EventTime {
    /// Create a stamp from milliseconds since the UNIX epoch.
    pub fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self { millis }
    }

    /// The zero stamp.
    pub const fn zero() -> Self {
        Self { millis: 0 }
    }

    /// Milliseconds since the UNIX epoch.
    pub fn millis(&self) -> u64 {
        self.millis
    }
}

impl fmt::Debug for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventTime({}ms)", self.millis)
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_smallest() {
        assert!(EventTime::zero() < EventTime::from_millis(1));
    }

    #[test]
    fn now_produces_reasonable_timestamp() {
        // Should be after 2020-01-01 (1577836800000 ms).
        assert!(EventTime::now().millis() > 1_577_836_800_000);
    }

    #[test]
    fn ordering_follows_millis() {
        let a = EventTime::from_millis(100);
        let b = EventTime::from_millis(200);
        assert!(a < b);
    }

    #[test]
    fn serde_roundtrip() {
        let at = EventTime::from_millis(1234567890);
        let json = serde_json::to_string(&at).unwrap();
        let parsed: EventTime = serde_json::from_str(&json).unwrap();
        assert_eq!(at, parsed);
    }
}
