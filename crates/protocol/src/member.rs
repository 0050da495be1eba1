use crate::{CharacterId, FleetRole, Role, SquadId, TacticalRole, TypeId, WingId};
use serde::{Deserialize, Serialize};

/// Ship name a pilot ends up in after losing their hull.
pub const CAPSULE_SHIP_NAME: &str = "Capsule";

/// Placeholder for character and ship names the name lookup did not return.
pub const UNKNOWN_NAME: &str = "Unknown";

/// One entry of the fleet member list as the fleet service reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFleetMember {
    pub character_id: CharacterId,
    pub ship_type_id: TypeId,
    #[serde(default)]
    pub role: FleetRole,
    #[serde(default)]
    pub wing_id: Option<WingId>,
    #[serde(default)]
    pub squad_id: Option<SquadId>,
}

impl RawFleetMember {
    /// Wing id with missing and negative (commander) values mapped to 0.
    #[must_use]
    pub fn wing(&self) -> WingId {
        normalize_group_id(self.wing_id)
    }

    #[must_use]
    pub fn squad(&self) -> SquadId {
        normalize_group_id(self.squad_id)
    }
}

fn normalize_group_id(raw: Option<i64>) -> i64 {
    raw.filter(|id| *id > 0).unwrap_or(0)
}

/// A fleet member resolved for one poll cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub character_id: CharacterId,
    pub name: String,
    pub ship_type_id: TypeId,
    pub ship: String,
    pub fleet_role: FleetRole,
    /// Classifier verdict for the hull; `None` for commanders, who bypass
    /// classification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_role: Option<TacticalRole>,
    /// Effective role after commander precedence and the combat override.
    pub role: Role,
    pub wing_id: WingId,
    pub squad_id: SquadId,
}

impl Member {
    /// Builds a member from its raw record, resolved names and the
    /// classifier verdict. Commander designations always take precedence.
    #[must_use]
    pub fn resolve(
        raw: &RawFleetMember,
        name: impl Into<String>,
        ship: impl Into<String>,
        ship_role: Option<TacticalRole>,
    ) -> Self {
        let ship_role = if raw.role.is_commander() {
            None
        } else {
            ship_role
        };
        let role = raw
            .role
            .commander_role()
            .unwrap_or_else(|| ship_role.map(Role::from).unwrap_or(Role::Undefined));
        Self {
            character_id: raw.character_id,
            name: name.into(),
            ship_type_id: raw.ship_type_id,
            ship: ship.into(),
            fleet_role: raw.role,
            ship_role,
            role,
            wing_id: raw.wing(),
            squad_id: raw.squad(),
        }
    }

    #[must_use]
    pub fn is_commander(&self) -> bool {
        self.fleet_role.is_commander()
    }

    /// Role the member would have without any per-poll override.
    #[must_use]
    pub fn base_role(&self) -> Role {
        self.fleet_role
            .commander_role()
            .unwrap_or_else(|| self.ship_role.map(Role::from).unwrap_or(Role::Undefined))
    }

    /// The triple that decides where the member sits in the hierarchy.
    #[must_use]
    pub fn placement_key(&self) -> (Role, WingId, SquadId) {
        (self.role, self.wing_id, self.squad_id)
    }
}
