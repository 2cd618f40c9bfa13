//! Entry and exit control
//!
//! Both checks and the resulting event happen inside one transaction, so two
//! concurrent entries for the same membership can never both be admitted.

use std::sync::Arc;

use super::membership::MembershipInfo;
use crate::error::StoreResult;
use crate::event_store::EventDirectory;
use crate::types::{EntityId, EventKind, Timestamp};

/// Admits and releases members
#[derive(Debug, Clone)]
pub struct TurnstileService {
    directory: Arc<EventDirectory>,
}

impl TurnstileService {
    pub fn new(directory: Arc<EventDirectory>) -> Self {
        Self { directory }
    }

    /// Admit the member if they are outside and the membership is valid at `at`
    pub fn enter(&self, id: EntityId, at: Timestamp) -> StoreResult<bool> {
        self.directory.with_transaction(id, |tx| {
            let info = MembershipInfo::from_history(id, tx.history());
            if info.entered || !info.is_active_at(at) {
                tracing::debug!(membership_id = id, %at, entered = info.entered, "entry refused");
                return false;
            }
            tx.append(EventKind::Entered { at });
            true
        })
    }

    /// Let the member out if they are inside
    pub fn exit(&self, id: EntityId, at: Timestamp) -> StoreResult<bool> {
        self.directory.with_transaction(id, |tx| {
            let info = MembershipInfo::from_history(id, tx.history());
            if !info.entered {
                return false;
            }
            tx.append(EventKind::Left { at });
            true
        })
    }
}
