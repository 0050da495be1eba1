use fcat_protocol::{Member, Role, CAPSULE_SHIP_NAME};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    /// Minimum combat share of the whole fleet.
    pub min_dps_share: f64,
    /// Minimum logistics count per combat pilot.
    pub min_logistics_per_dps: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            min_dps_share: 0.40,
            min_logistics_per_dps: 0.20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Loss,
}

impl Severity {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Loss => "loss",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Alert {
    LowDps {
        combat: usize,
        total: usize,
        threshold_pct: u32,
    },
    LowLogistics {
        logistics: usize,
        combat: usize,
        threshold_pct: u32,
    },
    Destroyed {
        pilot: String,
        previous_ship: String,
    },
    AllClear,
}

impl Alert {
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::LowDps { .. } | Self::LowLogistics { .. } => Severity::Warning,
            Self::Destroyed { .. } => Severity::Loss,
            Self::AllClear => Severity::Info,
        }
    }

    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LowDps {
                combat,
                total,
                threshold_pct,
            } => write!(f, "DPS only {combat}/{total} (<{threshold_pct}%)"),
            Self::LowLogistics {
                logistics,
                combat,
                threshold_pct,
            } => write!(f, "Logistics {logistics} <{threshold_pct}% of DPS ({combat})"),
            Self::Destroyed { pilot, .. } => write!(f, "{pilot} destroyed"),
            Self::AllClear => f.write_str("All good"),
        }
    }
}

/// Threshold and loss alerts. Remembers each pilot's ship between passes.
#[derive(Debug, Default)]
pub struct AlertEvaluator {
    thresholds: AlertThresholds,
    previous_ships: HashMap<String, String>,
}

impl AlertEvaluator {
    #[must_use]
    pub fn new(thresholds: AlertThresholds) -> Self {
        Self {
            thresholds,
            previous_ships: HashMap::new(),
        }
    }

    #[must_use]
    pub fn thresholds(&self) -> AlertThresholds {
        self.thresholds
    }

    #[must_use]
    pub fn previous_ship(&self, pilot: &str) -> Option<&str> {
        self.previous_ships.get(pilot).map(String::as_str)
    }

    /// Evaluates `members` and replaces the remembered ship map with theirs.
    /// Always returns at least one alert.
    pub fn evaluate(&mut self, members: &[Member]) -> Vec<Alert> {
        let total = members.len();
        let combat = members.iter().filter(|m| m.role == Role::Combat).count();
        let logistics = members.iter().filter(|m| m.role == Role::Logistics).count();
        let mut alerts = Vec::new();

        if (combat as f64) / (total.max(1) as f64) < self.thresholds.min_dps_share {
            alerts.push(Alert::LowDps {
                combat,
                total,
                threshold_pct: percent(self.thresholds.min_dps_share),
            });
        }

        if combat > 0
            && (logistics as f64) / (combat as f64) < self.thresholds.min_logistics_per_dps
        {
            alerts.push(Alert::LowLogistics {
                logistics,
                combat,
                threshold_pct: percent(self.thresholds.min_logistics_per_dps),
            });
        }

        for member in members.iter().filter(|m| m.ship == CAPSULE_SHIP_NAME) {
            if let Some(previous) = self.previous_ships.get(&member.name) {
                if previous != CAPSULE_SHIP_NAME {
                    log::info!("{} lost their {previous}", member.name);
                    alerts.push(Alert::Destroyed {
                        pilot: member.name.clone(),
                        previous_ship: previous.clone(),
                    });
                }
            }
        }

        if alerts.is_empty() {
            alerts.push(Alert::AllClear);
        }

        self.previous_ships = members
            .iter()
            .map(|m| (m.name.clone(), m.ship.clone()))
            .collect();
        alerts
    }
}

fn percent(fraction: f64) -> u32 {
    (fraction * 100.0).round().clamp(0.0, f64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use fcat_protocol::{FleetRole, RawFleetMember, TacticalRole};
    use pretty_assertions::assert_eq;

    fn pilot(id: i64, name: &str, ship: &str, role: TacticalRole) -> Member {
        let raw = RawFleetMember {
            character_id: id,
            ship_type_id: 1,
            role: FleetRole::Undefined,
            wing_id: None,
            squad_id: None,
        };
        Member::resolve(&raw, name, ship, Some(role))
    }

    fn fleet(combat: usize, logistics: usize) -> Vec<Member> {
        (0..10)
            .map(|i| {
                let role = if i < combat {
                    TacticalRole::Combat
                } else if i < combat + logistics {
                    TacticalRole::Logistics
                } else {
                    TacticalRole::Mining
                };
                pilot(i as i64, &format!("Pilot {i}"), "Hull", role)
            })
            .collect()
    }

    #[test]
    fn three_of_ten_combat_is_low_dps() {
        let alerts = AlertEvaluator::default().evaluate(&fleet(3, 1));
        assert_eq!(
            alerts,
            vec![Alert::LowDps {
                combat: 3,
                total: 10,
                threshold_pct: 40
            }]
        );
        assert_eq!(alerts[0].to_string(), "DPS only 3/10 (<40%)");
    }

    #[test]
    fn half_combat_without_logistics_is_low_logistics_only() {
        let alerts = AlertEvaluator::default().evaluate(&fleet(5, 0));
        assert_eq!(
            alerts,
            vec![Alert::LowLogistics {
                logistics: 0,
                combat: 5,
                threshold_pct: 20
            }]
        );
        assert_eq!(alerts[0].message(), "Logistics 0 <20% of DPS (5)");
    }

    #[test]
    fn balanced_fleet_is_all_clear() {
        let alerts = AlertEvaluator::default().evaluate(&fleet(5, 1));
        assert_eq!(alerts, vec![Alert::AllClear]);
        assert_eq!(alerts[0].severity(), Severity::Info);
    }

    #[test]
    fn empty_fleet_reports_low_dps_against_zero() {
        let alerts = AlertEvaluator::default().evaluate(&[]);
        assert_eq!(alerts[0].to_string(), "DPS only 0/0 (<40%)");
    }

    #[test]
    fn capsule_transition_fires_once() {
        let mut evaluator = AlertEvaluator::default();
        let mut members = fleet(5, 1);
        members[0].name = "Alice".to_string();
        members[0].ship = "Rifter".to_string();

        let at_t0 = evaluator.evaluate(&members);
        assert!(!at_t0.iter().any(|a| matches!(a, Alert::Destroyed { .. })));

        members[0].ship = CAPSULE_SHIP_NAME.to_string();
        let at_t1 = evaluator.evaluate(&members);
        let destroyed: Vec<_> = at_t1
            .iter()
            .filter(|a| matches!(a, Alert::Destroyed { .. }))
            .collect();
        assert_eq!(destroyed.len(), 1);
        assert_eq!(destroyed[0].to_string(), "Alice destroyed");
        assert_eq!(destroyed[0].severity(), Severity::Loss);

        let at_t2 = evaluator.evaluate(&members);
        assert!(!at_t2.iter().any(|a| matches!(a, Alert::Destroyed { .. })));
    }

    #[test]
    fn unseen_pilot_in_capsule_is_not_a_loss() {
        let mut evaluator = AlertEvaluator::default();
        let members = vec![
            pilot(1, "Bob", CAPSULE_SHIP_NAME, TacticalRole::Combat),
            pilot(2, "Carol", "Scimitar", TacticalRole::Logistics),
        ];
        assert_eq!(evaluator.evaluate(&members), vec![Alert::AllClear]);
        assert_eq!(evaluator.previous_ship("Bob"), Some(CAPSULE_SHIP_NAME));
    }
}
