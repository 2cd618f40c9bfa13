//! Membership administration

use std::sync::Arc;

use chrono::TimeDelta;

use super::membership::MembershipInfo;
use crate::error::StoreResult;
use crate::event_store::EventDirectory;
use crate::types::{EntityId, Event, Timestamp};

/// Registers, extends and inspects memberships
#[derive(Debug, Clone)]
pub struct ManagerService {
    directory: Arc<EventDirectory>,
}

impl ManagerService {
    pub fn new(directory: Arc<EventDirectory>) -> Self {
        Self { directory }
    }

    /// Create a membership valid from `register_at` until `expire_at`
    pub fn register_membership(
        &self,
        register_at: Timestamp,
        expire_at: Timestamp,
    ) -> StoreResult<EntityId> {
        let id = self.directory.create_entity();
        self.directory
            .append(Event::set_up(id, register_at, expire_at))?;
        tracing::debug!(membership_id = id, %register_at, %expire_at, "registered membership");
        Ok(id)
    }

    /// Push the expiry of a membership forward by `duration`
    pub fn extend_membership(&self, id: EntityId, duration: TimeDelta) -> StoreResult<()> {
        self.directory.append(Event::extended(id, duration))
    }

    /// Current state of a membership
    pub fn membership_info(&self, id: EntityId) -> StoreResult<MembershipInfo> {
        let history = self.directory.log(id)?.history();
        Ok(MembershipInfo::from_history(id, &history))
    }
}
