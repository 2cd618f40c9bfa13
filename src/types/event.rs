//! Event types for Event Sourcing
//!
//! Events are immutable records of what happened to one membership. The
//! current state of a membership is derived by folding its events in log
//! order.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use super::{EntityId, Timestamp};

/// What happened to a membership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "eventType", rename_all = "snake_case")]
pub enum EventKind {
    /// Membership registered with its initial validity window
    SetUp {
        #[serde(rename = "registerAt")]
        register_at: Timestamp,
        #[serde(rename = "expireAt")]
        expire_at: Timestamp,
    },
    /// Membership validity pushed forward
    Extended {
        #[serde(rename = "durationMs", with = "crate::utils::time::millis")]
        duration: TimeDelta,
    },
    /// Member passed the turnstile inwards
    Entered { at: Timestamp },
    /// Member passed the turnstile outwards
    Left { at: Timestamp },
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::SetUp { .. } => write!(f, "set_up"),
            EventKind::Extended { .. } => write!(f, "extended"),
            EventKind::Entered { .. } => write!(f, "entered"),
            EventKind::Left { .. } => write!(f, "left"),
        }
    }
}

/// An immutable event in an entity's log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Entity the event belongs to
    #[serde(rename = "entityId")]
    pub entity_id: EntityId,

    #[serde(flatten)]
    pub kind: EventKind,
}

impl Event {
    pub fn new(entity_id: EntityId, kind: EventKind) -> Self {
        Self { entity_id, kind }
    }

    pub fn set_up(entity_id: EntityId, register_at: Timestamp, expire_at: Timestamp) -> Self {
        Self::new(
            entity_id,
            EventKind::SetUp {
                register_at,
                expire_at,
            },
        )
    }

    pub fn extended(entity_id: EntityId, duration: TimeDelta) -> Self {
        Self::new(entity_id, EventKind::Extended { duration })
    }

    pub fn entered(entity_id: EntityId, at: Timestamp) -> Self {
        Self::new(entity_id, EventKind::Entered { at })
    }

    pub fn left(entity_id: EntityId, at: Timestamp) -> Self {
        Self::new(entity_id, EventKind::Left { at })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_event_kind_display() {
        let at = Utc.timestamp_opt(0, 0).unwrap();
        assert_eq!(Event::entered(1, at).kind.to_string(), "entered");
        assert_eq!(Event::left(1, at).kind.to_string(), "left");
        assert_eq!(
            Event::extended(1, TimeDelta::seconds(5)).kind.to_string(),
            "extended"
        );
    }

    #[test]
    fn test_event_serialization() {
        let event = Event::extended(3, TimeDelta::milliseconds(1500));

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"entityId\":3"));
        assert!(json.contains("\"eventType\":\"extended\""));
        assert!(json.contains("\"durationMs\":1500"));

        let parsed: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_set_up_serialization() {
        let register_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let expire_at = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let event = Event::set_up(0, register_at, expire_at);

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"eventType\":\"set_up\""));
        assert!(json.contains("\"registerAt\""));
        assert!(json.contains("\"expireAt\""));
    }
}
