use fcat_protocol::{Member, Role, TacticalRole};
use serde::Serialize;

/// Share of the fleet the most common hull needs before it is forced to combat.
pub const DEFAULT_OVERRIDE_THRESHOLD: f64 = 0.40;

/// Outcome of a combat override pass that fired.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombatOverride {
    pub ship: String,
    /// Members flying `ship`, commanders included.
    pub count: usize,
    pub share: f64,
    /// Members whose role was changed to combat.
    pub promoted: usize,
}

/// Most common ship name; ties go to the ship seen first.
fn plurality_ship(members: &[Member]) -> Option<(&str, usize)> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for member in members {
        match counts.iter_mut().find(|(ship, _)| *ship == member.ship) {
            Some((_, count)) => *count += 1,
            None => counts.push((member.ship.as_str(), 1)),
        }
    }
    counts
        .into_iter()
        .fold(None, |best: Option<(&str, usize)>, candidate| match best {
            Some(current) if current.1 >= candidate.1 => Some(current),
            _ => Some(candidate),
        })
}

/// Recomputes effective roles for one poll.
///
/// Every member first gets its base role back (commander designation or
/// classifier verdict), so a previous poll's override never lingers. If the
/// plurality hull reaches `threshold` of the fleet, every non-commander on it
/// that the classifier did not mark as logistics becomes combat.
pub fn apply_combat_override(members: &mut [Member], threshold: f64) -> Option<CombatOverride> {
    for member in members.iter_mut() {
        member.role = member.base_role();
    }

    let (ship, count) = plurality_ship(members).map(|(ship, count)| (ship.to_string(), count))?;
    let share = count as f64 / members.len().max(1) as f64;
    if share < threshold {
        return None;
    }

    let mut promoted = 0;
    for member in members
        .iter_mut()
        .filter(|m| m.ship == ship && !m.is_commander())
        .filter(|m| m.ship_role != Some(TacticalRole::Logistics))
    {
        if member.role != Role::Combat {
            promoted += 1;
        }
        member.role = Role::Combat;
    }

    log::debug!(
        "Combat override on {ship}: {count}/{} ({:.0}%), {promoted} promoted",
        members.len(),
        share * 100.0
    );
    Some(CombatOverride {
        ship,
        count,
        share,
        promoted,
    })
}
