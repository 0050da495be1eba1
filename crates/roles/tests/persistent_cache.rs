use async_trait::async_trait;
use fcat_esi::{FleetGateway, GatewayError, GroupMetadata, NameCategory, TypeMetadata};
use fcat_protocol::{CharacterId, FleetId, GroupId, RawFleetMember, TacticalRole, TypeId};
use fcat_roles::{RoleCache, ShipClassifier};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// Knows a single command ship; any other type id is a lookup failure.
#[derive(Default)]
struct CommandShipGateway {
    calls: AtomicUsize,
}

#[async_trait]
impl FleetGateway for CommandShipGateway {
    async fn fleet_id(&self, _: CharacterId) -> fcat_esi::Result<Option<FleetId>> {
        Ok(None)
    }

    async fn fleet_members(&self, _: FleetId) -> fcat_esi::Result<Vec<RawFleetMember>> {
        Ok(Vec::new())
    }

    async fn names_bulk(
        &self,
        _: &[i64],
        _: NameCategory,
    ) -> fcat_esi::Result<HashMap<i64, String>> {
        Ok(HashMap::new())
    }

    async fn type_metadata(&self, type_id: TypeId) -> fcat_esi::Result<TypeMetadata> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if type_id != 22442 {
            return Err(GatewayError::NotFound(format!("type {type_id}")));
        }
        Ok(TypeMetadata {
            type_id: Some(type_id),
            name: "Eos".to_string(),
            group_id: 540,
        })
    }

    async fn group_metadata(&self, group_id: GroupId) -> fcat_esi::Result<GroupMetadata> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(GroupMetadata {
            group_id: Some(group_id),
            name: "Command Ship".to_string(),
            category_id: Some(6),
        })
    }
}

#[tokio::test]
async fn classification_survives_a_restart_without_network() {
    let temp = TempDir::new().expect("tempdir");
    let path = temp.path().join("roles.json");

    let first = Arc::new(CommandShipGateway::default());
    let classifier = ShipClassifier::new(first.clone(), RoleCache::load(&path));
    assert_eq!(classifier.classify(22442).await, TacticalRole::Boosters);
    assert_eq!(classifier.classify(1).await, TacticalRole::Undefined);
    assert!(path.exists(), "cache file should be written on a miss");

    let second = Arc::new(CommandShipGateway::default());
    let restarted = ShipClassifier::new(second.clone(), RoleCache::load(&path));
    assert_eq!(restarted.classify(22442).await, TacticalRole::Boosters);
    assert_eq!(second.calls.load(Ordering::SeqCst), 0);

    let persisted = std::fs::read_to_string(&path).expect("read cache");
    assert!(persisted.contains("\"22442\": \"boosters\""), "{persisted}");
    assert!(!persisted.contains("\"1\""), "failures must not be cached");
}
