//! Membership state derived from an entity's history

use serde::Serialize;

use crate::types::{EntityId, Event, EventKind, Timestamp};
use crate::utils::saturating_add;

/// Current view of one membership, folded from its events
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipInfo {
    pub membership_id: EntityId,
    /// Set by the first `SetUp` event
    pub register_at: Option<Timestamp>,
    /// Set by the first `SetUp` event and moved by `Extended`, clamped to the
    /// representable range
    pub expire_at: Option<Timestamp>,
    pub attendance_count: u32,
    /// Member is currently inside
    pub entered: bool,
}

impl MembershipInfo {
    /// Fold a history into membership state
    pub fn from_history(membership_id: EntityId, history: &[Event]) -> Self {
        let mut info = Self {
            membership_id,
            register_at: None,
            expire_at: None,
            attendance_count: 0,
            entered: false,
        };
        history.iter().for_each(|event| info.apply(event));
        info
    }

    fn apply(&mut self, event: &Event) {
        match event.kind {
            EventKind::SetUp {
                register_at,
                expire_at,
            } => {
                self.register_at.get_or_insert(register_at);
                self.expire_at.get_or_insert(expire_at);
            }
            EventKind::Extended { duration } => {
                self.expire_at = self
                    .expire_at
                    .map(|expire_at| saturating_add(expire_at, duration));
            }
            EventKind::Entered { .. } => {
                self.attendance_count += 1;
                self.entered = true;
            }
            EventKind::Left { .. } => self.entered = false,
        }
    }

    /// Whether the membership is valid at `at`
    pub fn is_active_at(&self, at: Timestamp) -> bool {
        self.expire_at.is_some_and(|expire_at| at < expire_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};

    fn at(secs: i64) -> Timestamp {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_empty_history() {
        let info = MembershipInfo::from_history(3, &[]);
        assert_eq!(info.membership_id, 3);
        assert_eq!(info.register_at, None);
        assert_eq!(info.expire_at, None);
        assert!(!info.is_active_at(at(0)));
    }

    #[test]
    fn test_fold_history() {
        let history = [
            Event::set_up(0, at(0), at(10)),
            Event::set_up(0, at(5), at(50)),
            Event::extended(0, TimeDelta::seconds(5)),
            Event::entered(0, at(1)),
            Event::left(0, at(2)),
            Event::entered(0, at(3)),
        ];

        let info = MembershipInfo::from_history(0, &history);
        assert_eq!(info.register_at, Some(at(0)));
        assert_eq!(info.expire_at, Some(at(15)));
        assert_eq!(info.attendance_count, 2);
        assert!(info.entered);
        assert!(info.is_active_at(at(14)));
        assert!(!info.is_active_at(at(15)));
    }

    #[test]
    fn test_extend_before_set_up_is_ignored() {
        let history = [
            Event::extended(0, TimeDelta::seconds(5)),
            Event::set_up(0, at(0), at(10)),
        ];
        let info = MembershipInfo::from_history(0, &history);
        assert_eq!(info.expire_at, Some(at(10)));
    }

    #[test]
    fn test_extension_clamps_at_range_limits() {
        let forever = [
            Event::set_up(0, at(0), at(10)),
            Event::extended(0, TimeDelta::MAX),
            Event::extended(0, TimeDelta::seconds(1)),
        ];
        let info = MembershipInfo::from_history(0, &forever);
        assert_eq!(info.expire_at, Some(DateTime::<Utc>::MAX_UTC));
        assert!(info.is_active_at(at(1_000_000)));

        let revoked = [Event::set_up(0, at(0), at(10)), Event::extended(0, TimeDelta::MIN)];
        let info = MembershipInfo::from_history(0, &revoked);
        assert_eq!(info.expire_at, Some(DateTime::<Utc>::MIN_UTC));
        assert!(!info.is_active_at(at(0)));
    }
}
