use async_trait::async_trait;
use fcat_chatlog::BoostAggregator;
use fcat_esi::{FleetGateway, GatewayError, GroupMetadata, NameCategory, TypeMetadata};
use fcat_fleet::Alert;
use fcat_protocol::{
    BoostTaxonomy, CharacterId, FleetId, FleetRole, GroupId, RawFleetMember, Role, TypeId,
};
use fcat_roles::{RoleCache, ShipClassifier};
use fcat_sync::{FleetEvent, PollPipeline, RefreshScheduler, SchedulerConfig, SyncError};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

const FLEET: FleetId = 1_000_000;
const RIFTER: TypeId = 587;
const SCIMITAR: TypeId = 11978;

struct ScriptedGateway {
    members: Mutex<Vec<RawFleetMember>>,
    member_delay: Duration,
    polls: AtomicUsize,
    fail_auth: bool,
    names_missing: bool,
}

impl ScriptedGateway {
    fn new(members: Vec<RawFleetMember>) -> Self {
        Self {
            members: Mutex::new(members),
            member_delay: Duration::ZERO,
            polls: AtomicUsize::new(0),
            fail_auth: false,
            names_missing: false,
        }
    }
}

#[async_trait]
impl FleetGateway for ScriptedGateway {
    async fn fleet_id(&self, _: CharacterId) -> fcat_esi::Result<Option<FleetId>> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        if self.fail_auth {
            return Err(GatewayError::Auth { status: 403 });
        }
        Ok(Some(FLEET))
    }

    async fn fleet_members(&self, _: FleetId) -> fcat_esi::Result<Vec<RawFleetMember>> {
        if !self.member_delay.is_zero() {
            tokio::time::sleep(self.member_delay).await;
        }
        Ok(self.members.lock().unwrap().clone())
    }

    async fn names_bulk(
        &self,
        ids: &[i64],
        category: NameCategory,
    ) -> fcat_esi::Result<HashMap<i64, String>> {
        if self.names_missing && category == NameCategory::Character {
            return Err(GatewayError::NotFound(
                "https://esi.test/latest/universe/names/".to_string(),
            ));
        }
        Ok(ids
            .iter()
            .filter_map(|id| {
                let name = match (category, *id) {
                    (NameCategory::InventoryType, RIFTER) => "Rifter".to_string(),
                    (NameCategory::InventoryType, SCIMITAR) => "Scimitar".to_string(),
                    (NameCategory::Character, 404) => return None,
                    (NameCategory::Character, id) => format!("Pilot {id}"),
                    _ => return None,
                };
                Some((*id, name))
            })
            .collect())
    }

    async fn type_metadata(&self, type_id: TypeId) -> fcat_esi::Result<TypeMetadata> {
        let group_id = if type_id == SCIMITAR { 832 } else { 25 };
        Ok(TypeMetadata {
            type_id: Some(type_id),
            name: String::new(),
            group_id,
        })
    }

    async fn group_metadata(&self, group_id: GroupId) -> fcat_esi::Result<GroupMetadata> {
        let name = if group_id == 832 { "Logistics" } else { "Frigate" };
        Ok(GroupMetadata {
            group_id: Some(group_id),
            name: name.to_string(),
            category_id: Some(6),
        })
    }
}

fn raw(id: CharacterId, ship: TypeId, role: FleetRole, wing: i64, squad: i64) -> RawFleetMember {
    RawFleetMember {
        character_id: id,
        ship_type_id: ship,
        role,
        wing_id: Some(wing),
        squad_id: Some(squad),
    }
}

fn roster() -> Vec<RawFleetMember> {
    vec![
        raw(1, RIFTER, FleetRole::FleetCommander, -1, -1),
        raw(2, RIFTER, FleetRole::Undefined, 10, 100),
        raw(3, SCIMITAR, FleetRole::Undefined, 10, 100),
        raw(404, RIFTER, FleetRole::Undefined, 10, 100),
    ]
}

fn pipeline(gateway: Arc<ScriptedGateway>, logs: &TempDir) -> Arc<PollPipeline> {
    let classifier = Arc::new(ShipClassifier::new(gateway.clone(), RoleCache::in_memory()));
    let aggregator = Arc::new(BoostAggregator::new(logs.path(), BoostTaxonomy::default()).unwrap());
    Arc::new(PollPipeline::new(gateway, classifier, aggregator, 1))
}

fn write_boost_log(logs: &TempDir, channel: &str, line: &str) {
    let body = format!("  Channel Name:    {channel}\r\n[ 2025.06.24 13:23:34 ] {line}\r\n");
    let mut bytes = vec![0xFF, 0xFE];
    for unit in body.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    std::fs::write(
        logs.path().join(format!("{channel}_20250624_132330_90000001.txt")),
        bytes,
    )
    .unwrap();
}

fn config(interval: u64, deadline: u64) -> SchedulerConfig {
    SchedulerConfig {
        interval: Duration::from_secs(interval),
        deadline: Duration::from_secs(deadline),
        ..SchedulerConfig::default()
    }
}

#[tokio::test]
async fn pipeline_resolves_names_and_roles() {
    let logs = TempDir::new().unwrap();
    let gateway = Arc::new(ScriptedGateway::new(roster()));
    let data = pipeline(gateway, &logs).run(&[]).await.unwrap();

    assert_eq!(data.fleet_id, Some(FLEET));
    let summary: Vec<_> = data
        .members
        .iter()
        .map(|m| (m.name.as_str(), m.ship.as_str(), m.role))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Pilot 1", "Rifter", Role::FleetCommander),
            ("Pilot 2", "Rifter", Role::Combat),
            ("Pilot 3", "Scimitar", Role::Logistics),
            ("Unknown", "Rifter", Role::Combat),
        ]
    );
    assert_eq!(data.boosts.total_announcements(), 0);
}

#[tokio::test]
async fn auth_failure_is_not_transient() {
    let logs = TempDir::new().unwrap();
    let mut gateway = ScriptedGateway::new(roster());
    gateway.fail_auth = true;
    let err = pipeline(Arc::new(gateway), &logs).run(&[]).await.unwrap_err();
    assert!(matches!(err, SyncError::Gateway(GatewayError::Auth { status: 403 })));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn unresolvable_names_fall_back_to_unknown() {
    let logs = TempDir::new().unwrap();
    let mut gateway = ScriptedGateway::new(roster());
    gateway.names_missing = true;
    let data = pipeline(Arc::new(gateway), &logs).run(&[]).await.unwrap();

    assert_eq!(data.members.len(), 4);
    assert!(data.members.iter().all(|m| m.name == "Unknown"));
    assert_eq!(data.members[2].ship, "Scimitar");
    assert_eq!(data.members[2].role, Role::Logistics);
}

#[tokio::test(start_paused = true)]
async fn first_poll_emits_full_update() {
    let logs = TempDir::new().unwrap();
    let gateway = Arc::new(ScriptedGateway::new(roster()));
    let scheduler = RefreshScheduler::start(pipeline(gateway, &logs), config(60, 45));
    let mut events = scheduler.subscribe();

    let FleetEvent::Updated(update) = events.recv().await.unwrap() else {
        panic!("expected an update");
    };
    assert!(update.rebuilt);
    assert_eq!(update.hierarchy.label, "Fleet (4)");
    assert_eq!(update.summary.total, 4);
    assert_eq!(update.alerts, vec![Alert::AllClear]);
    scheduler.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn ticks_during_a_running_poll_are_skipped() {
    let logs = TempDir::new().unwrap();
    let mut gateway = ScriptedGateway::new(roster());
    gateway.member_delay = Duration::from_secs(25);
    let gateway = Arc::new(gateway);
    let scheduler =
        RefreshScheduler::start(pipeline(gateway.clone(), &logs), config(10, 100));
    let mut events = scheduler.subscribe();

    tokio::time::sleep(Duration::from_secs(29)).await;
    assert_eq!(gateway.polls.load(Ordering::SeqCst), 1);
    assert!(matches!(events.try_recv(), Ok(FleetEvent::Updated(_))));
    assert!(scheduler.progress().borrow().skipped_ticks >= 2);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(gateway.polls.load(Ordering::SeqCst), 2);
    scheduler.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn overrunning_poll_reports_a_transient_failure() {
    let logs = TempDir::new().unwrap();
    let mut gateway = ScriptedGateway::new(roster());
    gateway.member_delay = Duration::from_secs(30);
    let scheduler = RefreshScheduler::start(pipeline(Arc::new(gateway), &logs), config(60, 5));
    let mut events = scheduler.subscribe();

    match events.recv().await.unwrap() {
        FleetEvent::Failed { message, transient } => {
            assert!(transient);
            assert!(message.contains("5s"), "{message}");
        }
        FleetEvent::Updated(_) => panic!("poll should have missed its deadline"),
    }
    let progress = scheduler.progress().borrow().clone();
    assert_eq!(progress.consecutive_failures, 1);
    assert!(!progress.polling);
    scheduler.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn reconcile_after_member_leaves() {
    let logs = TempDir::new().unwrap();
    let gateway = Arc::new(ScriptedGateway::new(roster()));
    let scheduler = RefreshScheduler::start(pipeline(gateway.clone(), &logs), config(60, 45));
    let mut events = scheduler.subscribe();
    assert!(matches!(events.recv().await.unwrap(), FleetEvent::Updated(_)));

    gateway.members.lock().unwrap().retain(|m| m.character_id != 404);
    scheduler.refresh_now().await.unwrap();

    let FleetEvent::Updated(update) = events.recv().await.unwrap() else {
        panic!("expected an update");
    };
    assert!(!update.rebuilt);
    assert_eq!(update.changes.mutations.len(), 1);
    assert_eq!(update.hierarchy.label, "Fleet (3)");
    scheduler.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn progress_counts_down_between_polls() {
    let logs = TempDir::new().unwrap();
    let gateway = Arc::new(ScriptedGateway::new(roster()));
    let scheduler = RefreshScheduler::start(pipeline(gateway, &logs), config(60, 45));
    let mut events = scheduler.subscribe();
    assert!(matches!(events.recv().await.unwrap(), FleetEvent::Updated(_)));

    let progress = scheduler.progress().borrow().clone();
    assert!(!progress.polling);
    assert!(progress.last_success.is_some());
    assert_eq!(progress.consecutive_failures, 0);

    tokio::time::sleep(Duration::from_secs(10)).await;
    let progress = scheduler.progress().borrow().clone();
    assert!((49..=51).contains(&progress.seconds_remaining), "{progress:?}");
    assert!(progress.fraction_elapsed() > 0.1);
    scheduler.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn changing_channels_rebuilds_and_reads_new_logs() {
    let logs = TempDir::new().unwrap();
    write_boost_log(&logs, "Boosts", "Pilot 2 > Active Shielding Charge +ml");
    let gateway = Arc::new(ScriptedGateway::new(roster()));
    let scheduler = RefreshScheduler::start(pipeline(gateway.clone(), &logs), config(60, 45));
    let mut events = scheduler.subscribe();

    let FleetEvent::Updated(first) = events.recv().await.unwrap() else {
        panic!("expected an update");
    };
    assert_eq!(first.boosts.total_announcements(), 0);

    scheduler.set_channels(vec!["Boosts".to_string()]).await.unwrap();
    let FleetEvent::Updated(second) = events.recv().await.unwrap() else {
        panic!("expected an update");
    };
    assert!(second.rebuilt);
    assert_eq!(second.changes.mutations.len(), 4);
    assert_eq!(second.boosts.total_announcements(), 1);
    assert_eq!(second.summary.boost_announcements, 1);
    assert_eq!(gateway.polls.load(Ordering::SeqCst), 2);
    scheduler.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn dropping_the_last_handle_stops_polling() {
    let logs = TempDir::new().unwrap();
    let gateway = Arc::new(ScriptedGateway::new(roster()));
    let scheduler = RefreshScheduler::start(pipeline(gateway.clone(), &logs), config(10, 5));
    let mut events = scheduler.subscribe();
    assert!(matches!(events.recv().await.unwrap(), FleetEvent::Updated(_)));

    // Fill the command queue so the shutdown sent on drop cannot be queued.
    for _ in 0..16 {
        scheduler.refresh_now().await.unwrap();
    }
    drop(scheduler);

    tokio::time::sleep(Duration::from_secs(35)).await;
    assert!(gateway.polls.load(Ordering::SeqCst) <= 2);
}
