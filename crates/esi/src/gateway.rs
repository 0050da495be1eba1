use crate::Result;
use async_trait::async_trait;
use fcat_protocol::{CharacterId, FleetId, GroupId, RawFleetMember, TypeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Category filter applied to bulk name lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameCategory {
    Character,
    InventoryType,
}

impl NameCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::InventoryType => "inventory_type",
        }
    }
}

/// Subset of `/universe/types/{id}/` the classifier needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMetadata {
    #[serde(default)]
    pub type_id: Option<TypeId>,
    #[serde(default)]
    pub name: String,
    pub group_id: GroupId,
}

/// Subset of `/universe/groups/{id}/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMetadata {
    #[serde(default)]
    pub group_id: Option<GroupId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category_id: Option<i64>,
}

/// Everything the sync engine asks of the remote fleet service.
///
/// Implementations carry their own credential; callers never see it.
#[async_trait]
pub trait FleetGateway: Send + Sync {
    /// Fleet the character is currently in, `None` when not in a fleet.
    async fn fleet_id(&self, character_id: CharacterId) -> Result<Option<FleetId>>;

    async fn fleet_members(&self, fleet_id: FleetId) -> Result<Vec<RawFleetMember>>;

    /// Resolves ids to names, keeping only entries of `category`.
    /// Empty input returns an empty map without a request.
    async fn names_bulk(&self, ids: &[i64], category: NameCategory)
        -> Result<HashMap<i64, String>>;

    async fn type_metadata(&self, type_id: TypeId) -> Result<TypeMetadata>;

    async fn group_metadata(&self, group_id: GroupId) -> Result<GroupMetadata>;
}

pub type SharedGateway = Arc<dyn FleetGateway>;
