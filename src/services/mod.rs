//! Domain services layered on the event directory
//!
//! - `ManagerService`: register, extend and inspect memberships
//! - `TurnstileService`: transactional enter/exit decisions
//! - `MembershipInfo`: membership state folded from a history

mod manager;
mod membership;
mod turnstile;

pub use manager::ManagerService;
pub use membership::MembershipInfo;
pub use turnstile::TurnstileService;
