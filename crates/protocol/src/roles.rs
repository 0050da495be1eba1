use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct RoleParseError(pub String);

/// Commander designation assigned by the fleet service.
///
/// Anything other than the three commander roles (ESI reports plain members
/// as `squad_member`) collapses into `Undefined`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FleetRole {
    FleetCommander,
    WingCommander,
    SquadCommander,
    #[default]
    #[serde(other)]
    Undefined,
}

impl FleetRole {
    #[must_use]
    pub fn is_commander(self) -> bool {
        !matches!(self, Self::Undefined)
    }

    /// Effective role for a commander, `None` for ordinary members.
    #[must_use]
    pub fn commander_role(self) -> Option<Role> {
        match self {
            Self::FleetCommander => Some(Role::FleetCommander),
            Self::WingCommander => Some(Role::WingCommander),
            Self::SquadCommander => Some(Role::SquadCommander),
            Self::Undefined => None,
        }
    }
}

/// Combat function derived from the hull a pilot is flying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TacticalRole {
    Combat,
    Logistics,
    Boosters,
    Mining,
    /// Classification could not be resolved. Never persisted.
    Undefined,
}

impl TacticalRole {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Combat => "combat",
            Self::Logistics => "logistics",
            Self::Boosters => "boosters",
            Self::Mining => "mining",
            Self::Undefined => "undefined",
        }
    }

    #[must_use]
    pub fn is_resolved(self) -> bool {
        !matches!(self, Self::Undefined)
    }

    /// Parses a persisted cache value, accepting the coarse legacy labels
    /// (`DPS`, `Logistics`, `Command`) alongside the current ones.
    pub fn from_cache_value(raw: &str) -> Result<Self, RoleParseError> {
        match raw.trim() {
            "DPS" => Ok(Self::Combat),
            "Logistics" => Ok(Self::Logistics),
            "Command" => Ok(Self::Boosters),
            other => other.parse(),
        }
    }
}

impl FromStr for TacticalRole {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "combat" => Ok(Self::Combat),
            "logistics" => Ok(Self::Logistics),
            "boosters" => Ok(Self::Boosters),
            "mining" => Ok(Self::Mining),
            "undefined" => Ok(Self::Undefined),
            other => Err(RoleParseError(other.to_string())),
        }
    }
}

impl fmt::Display for TacticalRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effective role of a member for one poll: commander designation when the
/// fleet service assigned one, otherwise the (possibly overridden) tactical
/// role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    FleetCommander,
    WingCommander,
    SquadCommander,
    Combat,
    Logistics,
    Boosters,
    Mining,
    Undefined,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FleetCommander => "fleet_commander",
            Self::WingCommander => "wing_commander",
            Self::SquadCommander => "squad_commander",
            Self::Combat => "combat",
            Self::Logistics => "logistics",
            Self::Boosters => "boosters",
            Self::Mining => "mining",
            Self::Undefined => "undefined",
        }
    }

    #[must_use]
    pub fn is_commander(self) -> bool {
        matches!(
            self,
            Self::FleetCommander | Self::WingCommander | Self::SquadCommander
        )
    }
}

impl From<TacticalRole> for Role {
    fn from(role: TacticalRole) -> Self {
        match role {
            TacticalRole::Combat => Self::Combat,
            TacticalRole::Logistics => Self::Logistics,
            TacticalRole::Boosters => Self::Boosters,
            TacticalRole::Mining => Self::Mining,
            TacticalRole::Undefined => Self::Undefined,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
