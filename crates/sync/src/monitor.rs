use crate::PollData;
use fcat_fleet::{
    apply_combat_override, Alert, AlertEvaluator, AlertThresholds, CombatOverride, FleetSummary,
    HierarchyNode, ReconcileReport, Reconciler,
};
use fcat_protocol::{BoostIndex, FleetId, Member};
use serde::Serialize;
use std::time::SystemTime;

/// Everything an observer needs after a successful poll.
#[derive(Debug, Clone, Serialize)]
pub struct FleetUpdate {
    #[serde(skip)]
    pub completed_at: SystemTime,
    pub duration_ms: u64,
    pub fleet_id: Option<FleetId>,
    pub members: Vec<Member>,
    pub boosts: BoostIndex,
    pub hierarchy: HierarchyNode,
    pub summary: FleetSummary,
    pub alerts: Vec<Alert>,
    pub changes: ReconcileReport,
    pub rebuilt: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combat_override: Option<CombatOverride>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FleetEvent {
    Updated(Box<FleetUpdate>),
    Failed { message: String, transient: bool },
}

/// Local fleet state owned by the coordinator: hierarchy, override and
/// alert history. Never does I/O.
#[derive(Debug)]
pub struct FleetMonitor {
    reconciler: Reconciler,
    evaluator: AlertEvaluator,
    override_threshold: f64,
    needs_rebuild: bool,
}

impl FleetMonitor {
    #[must_use]
    pub fn new(override_threshold: f64, thresholds: AlertThresholds) -> Self {
        Self {
            reconciler: Reconciler::new(),
            evaluator: AlertEvaluator::new(thresholds),
            override_threshold,
            needs_rebuild: true,
        }
    }

    /// Forces the next snapshot to rebuild the hierarchy from scratch.
    pub fn request_rebuild(&mut self) {
        self.needs_rebuild = true;
    }

    #[must_use]
    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn apply(&mut self, data: PollData, duration_ms: u64) -> FleetUpdate {
        let PollData {
            fleet_id,
            mut members,
            boosts,
        } = data;

        let combat_override = apply_combat_override(&mut members, self.override_threshold);
        let rebuilt = std::mem::take(&mut self.needs_rebuild);
        let changes = if rebuilt {
            self.reconciler.rebuild(&members)
        } else {
            self.reconciler.reconcile(&members)
        };
        let alerts = self.evaluator.evaluate(&members);
        let summary = FleetSummary::from_members(&members, &boosts);

        FleetUpdate {
            completed_at: SystemTime::now(),
            duration_ms,
            fleet_id,
            hierarchy: self.reconciler.tree().to_view(),
            members,
            boosts,
            summary,
            alerts,
            changes,
            rebuilt,
            combat_override,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fcat_fleet::DEFAULT_OVERRIDE_THRESHOLD;
    use fcat_protocol::{BoostTaxonomy, FleetRole, RawFleetMember, TacticalRole};

    fn data(ships: &[&str]) -> PollData {
        let members = ships
            .iter()
            .enumerate()
            .map(|(i, ship)| {
                let raw = RawFleetMember {
                    character_id: i as i64 + 1,
                    ship_type_id: 1,
                    role: FleetRole::Undefined,
                    wing_id: Some(1),
                    squad_id: Some(1),
                };
                Member::resolve(&raw, format!("Pilot {i}"), *ship, Some(TacticalRole::Mining))
            })
            .collect();
        PollData {
            fleet_id: Some(99),
            members,
            boosts: BoostIndex::empty(&BoostTaxonomy::default()),
        }
    }

    #[test]
    fn first_snapshot_rebuilds_then_reconciles() {
        let mut monitor = FleetMonitor::new(DEFAULT_OVERRIDE_THRESHOLD, AlertThresholds::default());
        let first = monitor.apply(data(&["Hulk", "Procurer"]), 5);
        assert!(first.rebuilt);
        let second = monitor.apply(data(&["Hulk", "Procurer"]), 5);
        assert!(!second.rebuilt);
        assert!(second.changes.mutations.is_empty());

        monitor.request_rebuild();
        assert!(monitor.apply(data(&["Hulk"]), 5).rebuilt);
    }

    #[test]
    fn override_runs_before_alerts() {
        let mut monitor = FleetMonitor::new(DEFAULT_OVERRIDE_THRESHOLD, AlertThresholds::default());
        let update = monitor.apply(data(&["Hulk", "Hulk", "Procurer"]), 5);
        assert_eq!(update.combat_override.map(|o| o.ship), Some("Hulk".to_string()));
        assert_eq!(update.summary.roles[0].label, "combat");
        assert_eq!(update.hierarchy.label, "Fleet (3)");
        assert!(matches!(update.alerts[0], Alert::LowLogistics { combat: 2, .. }));
    }
}
