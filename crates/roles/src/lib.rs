//! # FCAT Roles
//!
//! Maps ship type ids to tactical roles.
//!
//! ```text
//! type id ──> RoleCache hit? ──yes──> role
//!                 │ no
//!                 ├──> type metadata ──> group metadata   (FleetGateway)
//!                 ├──> ClassificationRules (name table, id table, keywords)
//!                 └──> RoleCache insert + persist
//! ```
//!
//! Lookup failures classify as [`TacticalRole::Undefined`] and are never
//! cached, so the next poll retries them.
//!
//! [`TacticalRole::Undefined`]: fcat_protocol::TacticalRole::Undefined

mod cache;
mod classifier;
mod error;
mod rules;

pub use cache::{default_cache_path, RoleCache, CACHE_FILE_NAME};
pub use classifier::ShipClassifier;
pub use error::{Result, RoleCacheError};
pub use rules::ClassificationRules;
