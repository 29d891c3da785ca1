//! Entities Module
//!
//! Managers for the persisted favorites and discovery log, the session
//! state and the progress rewards derived from them.

mod discovery;
mod favorites;
pub mod progress;
mod session;

#[cfg(test)]
mod property_tests;

pub use discovery::{AddOutcome, DiscoveryLog, NewDiscovery};
pub use favorites::{Favorites, Toggled};
pub use progress::{favorite_badges, herbarium_rank, FavoriteBadges, HerbariumRank};
pub use session::{Session, SessionState, DEFAULT_RADIUS_KM};
