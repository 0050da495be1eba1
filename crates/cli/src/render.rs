use fcat_fleet::{Alert, FleetSummary, HierarchyNode, NodeKind, Share};
use fcat_protocol::{BoostIndex, Role, TacticalRole};
use fcat_sync::FleetUpdate;
use std::fmt::Write as _;

const INDENT: &str = "  ";

pub fn hierarchy(root: &HierarchyNode) -> String {
    let mut out = String::new();
    push_node(&mut out, root, 0);
    out
}

fn push_node(out: &mut String, node: &HierarchyNode, depth: usize) {
    let pad = INDENT.repeat(depth);
    match &node.kind {
        NodeKind::Member { member } => {
            let _ = writeln!(
                out,
                "{pad}{} [{}] {}",
                member.name,
                member.ship,
                role_label(member.role)
            );
        }
        _ => {
            let _ = writeln!(out, "{pad}{}", node.label);
        }
    }
    for child in &node.children {
        push_node(out, child, depth + 1);
    }
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::FleetCommander => "FC",
        Role::WingCommander => "WC",
        Role::SquadCommander => "SC",
        Role::Combat => "DPS",
        Role::Logistics => "Logi",
        Role::Boosters => "Boosts",
        Role::Mining => "Mining",
        Role::Undefined => "?",
    }
}

pub fn summary(summary: &FleetSummary) -> String {
    let mut out = format!("Members: {}\n", summary.total);
    push_shares(&mut out, "Roles", &summary.roles);
    push_shares(&mut out, "Ships", &summary.ships);
    let _ = writeln!(out, "Boost announcements: {}", summary.boost_announcements);
    out
}

fn push_shares(out: &mut String, title: &str, shares: &[Share]) {
    let _ = writeln!(out, "{title}:");
    if shares.is_empty() {
        let _ = writeln!(out, "{INDENT}-");
    }
    for share in shares {
        let _ = writeln!(
            out,
            "{INDENT}{:<24} {:>4}  {:>5.1}%",
            share.label, share.count, share.percent
        );
    }
}

pub fn boosts(index: &BoostIndex) -> String {
    let mut out = String::new();
    for category in &index.categories {
        let _ = writeln!(out, "{}", category.category);
        for bucket in &category.scripts {
            let pilots = if bucket.pilots.is_empty() {
                "-".to_string()
            } else {
                bucket
                    .pilots
                    .iter()
                    .map(|p| {
                        if p.mindlink {
                            format!("{} (+ml)", p.pilot)
                        } else {
                            p.pilot.clone()
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            let _ = writeln!(out, "{INDENT}{}: {pilots}", bucket.script);
        }
    }
    out
}

pub fn alerts(alerts: &[Alert]) -> String {
    alerts
        .iter()
        .map(|alert| format!("[{}] {alert}\n", alert.severity().as_str()))
        .collect()
}

pub fn update(update: &FleetUpdate) -> String {
    let mut out = String::new();
    match update.fleet_id {
        Some(id) => {
            let _ = writeln!(out, "Fleet {id} ({} ms)", update.duration_ms);
        }
        None => out.push_str("Not in a fleet\n"),
    }
    if let Some(over) = &update.combat_override {
        let _ = writeln!(
            out,
            "{} is {:.0}% of the fleet; treating it as DPS",
            over.ship,
            over.share * 100.0
        );
    }
    out.push('\n');
    out.push_str(&hierarchy(&update.hierarchy));
    out.push('\n');
    out.push_str(&summary(&update.summary));
    out.push('\n');
    out.push_str(&boosts(&update.boosts));
    out.push('\n');
    out.push_str(&alerts(&update.alerts));
    out
}

pub fn classification(rows: &[(i64, TacticalRole)]) -> String {
    rows.iter()
        .map(|(type_id, role)| format!("{type_id}\t{role}\n"))
        .collect()
}
