use crate::Result;
use fcat_chatlog::BoostAggregator;
use fcat_esi::{ErrorClass, NameCategory, SharedGateway};
use fcat_protocol::{
    BoostIndex, CharacterId, FleetId, Member, RawFleetMember, TypeId, UNKNOWN_NAME,
};
use fcat_roles::ShipClassifier;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Raw result of one poll, before any hierarchy work.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PollData {
    /// `None` when the character is not in a fleet.
    pub fleet_id: Option<FleetId>,
    /// Members with base roles; the combat override is applied later.
    pub members: Vec<Member>,
    pub boosts: BoostIndex,
}

/// The network and file work of a poll cycle.
///
/// Strictly ordered: fleet id, member list, bulk names, classification,
/// then chat logs.
pub struct PollPipeline {
    gateway: SharedGateway,
    classifier: Arc<ShipClassifier>,
    aggregator: Arc<BoostAggregator>,
    character_id: CharacterId,
}

impl PollPipeline {
    pub fn new(
        gateway: SharedGateway,
        classifier: Arc<ShipClassifier>,
        aggregator: Arc<BoostAggregator>,
        character_id: CharacterId,
    ) -> Self {
        Self {
            gateway,
            classifier,
            aggregator,
            character_id,
        }
    }

    #[must_use]
    pub fn classifier(&self) -> &Arc<ShipClassifier> {
        &self.classifier
    }

    pub async fn run(&self, channels: &[String]) -> Result<PollData> {
        let fleet_id = self.gateway.fleet_id(self.character_id).await?;
        let members = match fleet_id {
            Some(fleet_id) => self.resolve_members(fleet_id).await?,
            None => {
                log::debug!("Character {} is not in a fleet", self.character_id);
                Vec::new()
            }
        };
        let boosts = self.read_boosts(channels).await?;
        Ok(PollData {
            fleet_id,
            members,
            boosts,
        })
    }

    async fn resolve_members(&self, fleet_id: FleetId) -> Result<Vec<Member>> {
        let raw = match self.gateway.fleet_members(fleet_id).await {
            Ok(raw) => raw,
            Err(err) if err.class() == ErrorClass::Malformed => {
                log::warn!("Treating fleet {fleet_id} as empty: {err}");
                Vec::new()
            }
            Err(err) => return Err(err.into()),
        };

        let character_ids: Vec<CharacterId> = raw.iter().map(|m| m.character_id).collect();
        let type_ids: Vec<TypeId> = raw.iter().map(|m| m.ship_type_id).collect();
        let pilot_names = self
            .lookup_names(&character_ids, NameCategory::Character)
            .await?;
        let ship_names = self
            .lookup_names(&type_ids, NameCategory::InventoryType)
            .await?;

        let classify: Vec<TypeId> = raw
            .iter()
            .filter(|m| !m.role.is_commander())
            .map(|m| m.ship_type_id)
            .collect();
        let ship_roles = self.classifier.classify_all(&classify).await;

        let members = raw
            .iter()
            .map(|m| resolve_member(m, &pilot_names, &ship_names, &ship_roles))
            .collect::<Vec<_>>();
        log::debug!("Fleet {fleet_id}: {} members resolved", members.len());
        Ok(members)
    }

    async fn lookup_names(
        &self,
        ids: &[i64],
        category: NameCategory,
    ) -> Result<HashMap<i64, String>> {
        match self.gateway.names_bulk(ids, category).await {
            Ok(names) => Ok(names),
            Err(err) if err.class() == ErrorClass::Malformed => {
                log::warn!("Falling back to unknown {} names: {err}", category.as_str());
                Ok(HashMap::new())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn read_boosts(&self, channels: &[String]) -> Result<BoostIndex> {
        if channels.is_empty() {
            return Ok(BoostIndex::empty(self.aggregator.taxonomy()));
        }
        let aggregator = Arc::clone(&self.aggregator);
        let channels = channels.to_vec();
        let boosts = tokio::task::spawn_blocking(move || aggregator.aggregate(&channels)).await?;
        Ok(boosts)
    }
}

fn resolve_member(
    raw: &RawFleetMember,
    pilot_names: &HashMap<i64, String>,
    ship_names: &HashMap<i64, String>,
    ship_roles: &HashMap<TypeId, fcat_protocol::TacticalRole>,
) -> Member {
    let name = pilot_names
        .get(&raw.character_id)
        .map_or(UNKNOWN_NAME, String::as_str);
    let ship = ship_names
        .get(&raw.ship_type_id)
        .map_or(UNKNOWN_NAME, String::as_str);
    Member::resolve(raw, name, ship, ship_roles.get(&raw.ship_type_id).copied())
}
