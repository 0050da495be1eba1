//! # FCAT Protocol
//!
//! Data model shared by every FCAT crate: identifiers, authoritative and
//! tactical roles, fleet members, and the boost taxonomy/index.
//!
//! ```text
//! RawFleetMember (ESI) ──> Member ──> FleetTree / Alerts / Summary
//! chat log text ─────────> PilotFacts ──> BoostIndex
//! ```

mod boosts;
mod member;
mod roles;

pub use boosts::{
    BoostAnnouncement, BoostCategory, BoostIndex, BoostTaxonomy, CategoryBucket, PilotFacts,
    ScriptBucket,
};
pub use member::{Member, RawFleetMember, CAPSULE_SHIP_NAME, UNKNOWN_NAME};
pub use roles::{FleetRole, Role, RoleParseError, TacticalRole};

pub type CharacterId = i64;
pub type FleetId = i64;
pub type TypeId = i64;
pub type GroupId = i64;
pub type WingId = i64;
pub type SquadId = i64;
