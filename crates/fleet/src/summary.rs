use fcat_protocol::{BoostIndex, Member};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Share {
    pub label: String,
    pub count: usize,
    pub percent: f64,
}

/// Role and ship breakdowns for one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FleetSummary {
    pub total: usize,
    pub roles: Vec<Share>,
    pub ships: Vec<Share>,
    pub boost_announcements: usize,
}

impl FleetSummary {
    #[must_use]
    pub fn from_members(members: &[Member], boosts: &BoostIndex) -> Self {
        let total = members.len();
        Self {
            total,
            roles: breakdown(members.iter().map(|m| m.role.as_str()), total),
            ships: breakdown(members.iter().map(|m| m.ship.as_str()), total),
            boost_announcements: boosts.total_announcements(),
        }
    }
}

fn breakdown<'a>(labels: impl Iterator<Item = &'a str>, total: usize) -> Vec<Share> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for label in labels {
        *counts.entry(label).or_default() += 1;
    }
    let denominator = total.max(1) as f64;
    let mut shares: Vec<Share> = counts
        .into_iter()
        .map(|(label, count)| Share {
            label: label.to_string(),
            count,
            percent: count as f64 * 100.0 / denominator,
        })
        .collect();
    shares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    shares
}

#[cfg(test)]
mod tests {
    use super::*;
    use fcat_protocol::{BoostTaxonomy, FleetRole, RawFleetMember, TacticalRole};

    fn pilot(id: i64, ship: &str, role: TacticalRole) -> Member {
        let raw = RawFleetMember {
            character_id: id,
            ship_type_id: 1,
            role: FleetRole::Undefined,
            wing_id: None,
            squad_id: None,
        };
        Member::resolve(&raw, format!("Pilot {id}"), ship, Some(role))
    }

    #[test]
    fn breakdowns_sort_by_count_then_label() {
        let members = vec![
            pilot(1, "Scimitar", TacticalRole::Logistics),
            pilot(2, "Rifter", TacticalRole::Combat),
            pilot(3, "Rifter", TacticalRole::Combat),
            pilot(4, "Claymore", TacticalRole::Boosters),
        ];
        let mut boosts = BoostIndex::empty(&BoostTaxonomy::default());
        boosts.record("Rapid Repair Charge", "Pilot 4", true);

        let summary = FleetSummary::from_members(&members, &boosts);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.boost_announcements, 1);
        let ships: Vec<_> = summary.ships.iter().map(|s| (s.label.as_str(), s.count)).collect();
        assert_eq!(ships, vec![("Rifter", 2), ("Claymore", 1), ("Scimitar", 1)]);
        assert_eq!(summary.roles[0].label, "combat");
        assert!((summary.roles[0].percent - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_fleet_has_no_shares() {
        let summary = FleetSummary::from_members(&[], &BoostIndex::default());
        assert_eq!(summary, FleetSummary::default());
    }
}
