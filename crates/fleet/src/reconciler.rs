use crate::tree::{FleetTree, NodeId, NodeKind};
use fcat_protocol::{CharacterId, Member, Role, SquadId, WingId};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Structural change applied to the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TreeMutation {
    Added {
        character_id: CharacterId,
        node: NodeId,
        parent: NodeId,
    },
    Removed {
        character_id: CharacterId,
        node: NodeId,
    },
    Moved {
        character_id: CharacterId,
        node: NodeId,
        from: NodeId,
        to: NodeId,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub mutations: Vec<TreeMutation>,
    /// Members whose node stayed put and only had attributes refreshed.
    pub updated: Vec<CharacterId>,
}

impl ReconcileReport {
    #[must_use]
    pub fn is_structural(&self) -> bool {
        !self.mutations.is_empty()
    }
}

/// Owns the fleet hierarchy and keeps it in step with successive snapshots.
#[derive(Debug, Default)]
pub struct Reconciler {
    tree: FleetTree,
    member_nodes: HashMap<CharacterId, NodeId>,
    placements: HashMap<CharacterId, (Role, WingId, SquadId)>,
    wing_nodes: BTreeMap<WingId, NodeId>,
    squad_nodes: BTreeMap<(WingId, SquadId), NodeId>,
}

impl Reconciler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn tree(&self) -> &FleetTree {
        &self.tree
    }

    #[must_use]
    pub fn node_of(&self, character_id: CharacterId) -> Option<NodeId> {
        self.member_nodes.get(&character_id).copied()
    }

    #[must_use]
    pub fn wing_node(&self, wing_id: WingId) -> Option<NodeId> {
        self.wing_nodes.get(&wing_id).copied()
    }

    #[must_use]
    pub fn squad_node(&self, wing_id: WingId, squad_id: SquadId) -> Option<NodeId> {
        self.squad_nodes.get(&(wing_id, squad_id)).copied()
    }

    #[must_use]
    pub fn member_count(&self) -> usize {
        self.member_nodes.len()
    }

    /// Discards the current hierarchy and lays out `members` from scratch.
    pub fn rebuild(&mut self, members: &[Member]) -> ReconcileReport {
        self.tree.reset();
        self.member_nodes.clear();
        self.placements.clear();
        self.wing_nodes.clear();
        self.squad_nodes.clear();

        let members = dedup(members);
        let root = self.tree.root();
        let mut report = ReconcileReport::default();

        let wings: BTreeSet<WingId> = members
            .iter()
            .map(|m| m.wing_id)
            .filter(|id| *id != 0)
            .collect();
        let squads: BTreeSet<(WingId, SquadId)> = members
            .iter()
            .filter(|m| m.wing_id != 0 && m.squad_id != 0)
            .map(|m| (m.wing_id, m.squad_id))
            .collect();

        for member in members.iter().filter(|m| m.role == Role::FleetCommander) {
            self.add_member(member, root, &mut report);
        }

        for (wing_index, wing_id) in wings.iter().enumerate() {
            let wing_node = self.tree.insert(
                root,
                NodeKind::Wing {
                    wing_id: *wing_id,
                    index: wing_index + 1,
                },
            );
            self.wing_nodes.insert(*wing_id, wing_node);

            for member in members
                .iter()
                .filter(|m| m.role == Role::WingCommander && m.wing_id == *wing_id)
            {
                self.add_member(member, wing_node, &mut report);
            }

            let wing_squads = squads.iter().filter(|(w, _)| w == wing_id);
            for (squad_index, (_, squad_id)) in wing_squads.enumerate() {
                let squad_node = self.tree.insert(
                    wing_node,
                    NodeKind::Squad {
                        wing_id: *wing_id,
                        squad_id: *squad_id,
                        index: squad_index + 1,
                    },
                );
                self.squad_nodes.insert((*wing_id, *squad_id), squad_node);

                let in_squad = |m: &&Member| {
                    m.wing_id == *wing_id
                        && m.squad_id == *squad_id
                        && !matches!(m.role, Role::FleetCommander | Role::WingCommander)
                };
                for member in members
                    .iter()
                    .copied()
                    .filter(in_squad)
                    .filter(|m| m.role == Role::SquadCommander)
                {
                    self.add_member(member, squad_node, &mut report);
                }
                for member in members
                    .iter()
                    .copied()
                    .filter(in_squad)
                    .filter(|m| m.role != Role::SquadCommander)
                {
                    self.add_member(member, squad_node, &mut report);
                }
            }

            for member in members.iter().filter(|m| {
                m.wing_id == *wing_id
                    && m.squad_id == 0
                    && !matches!(m.role, Role::FleetCommander | Role::WingCommander)
            }) {
                self.add_member(member, wing_node, &mut report);
            }
        }

        // Wing 0 members that are not fleet commanders.
        for member in members
            .iter()
            .filter(|m| m.wing_id == 0 && m.role != Role::FleetCommander)
        {
            self.add_member(member, root, &mut report);
        }

        log::debug!(
            "Rebuilt fleet hierarchy: {} members, {} wings, {} squads",
            self.member_nodes.len(),
            self.wing_nodes.len(),
            self.squad_nodes.len()
        );
        report
    }

    /// Applies `members` as a diff against the current hierarchy, keeping
    /// node identity for members that are still present.
    pub fn reconcile(&mut self, members: &[Member]) -> ReconcileReport {
        let members = dedup(members);
        let mut report = ReconcileReport::default();

        let present: HashSet<CharacterId> = members.iter().map(|m| m.character_id).collect();
        let mut absent: Vec<CharacterId> = self
            .member_nodes
            .keys()
            .filter(|id| !present.contains(id))
            .copied()
            .collect();
        absent.sort_unstable();
        for character_id in absent {
            self.placements.remove(&character_id);
            if let Some(node) = self.member_nodes.remove(&character_id) {
                self.tree.remove(node);
                report.mutations.push(TreeMutation::Removed { character_id, node });
            }
        }

        for member in &members {
            let target = self.slot_for(member);
            let Some(node) = self.node_of(member.character_id) else {
                self.add_member(member, target, &mut report);
                continue;
            };

            let key = member.placement_key();
            let unchanged = self.placements.get(&member.character_id) == Some(&key);
            self.tree.set_member(node, (*member).clone());
            if unchanged {
                report.updated.push(member.character_id);
                continue;
            }

            let from = self.tree.detach(node).unwrap_or(target);
            self.tree.attach(node, target);
            self.placements.insert(member.character_id, key);
            report.mutations.push(TreeMutation::Moved {
                character_id: member.character_id,
                node,
                from,
                to: target,
            });
        }

        if report.is_structural() {
            log::debug!(
                "Reconciled fleet hierarchy: {} structural changes",
                report.mutations.len()
            );
        }
        report
    }

    /// Parent node a member belongs under, limited to nodes that exist.
    #[must_use]
    pub fn slot_for(&self, member: &Member) -> NodeId {
        let root = self.tree.root();
        match member.role {
            Role::FleetCommander => root,
            Role::WingCommander => self.wing_node(member.wing_id).unwrap_or(root),
            _ => self
                .squad_node(member.wing_id, member.squad_id)
                .or_else(|| self.wing_node(member.wing_id))
                .unwrap_or(root),
        }
    }

    /// Members currently in the hierarchy, in pre-order.
    #[must_use]
    pub fn members(&self) -> Vec<&Member> {
        self.tree
            .walk()
            .into_iter()
            .filter_map(|(_, id)| self.tree.member(id))
            .collect()
    }

    fn add_member(&mut self, member: &Member, parent: NodeId, report: &mut ReconcileReport) {
        let node = self.tree.insert(
            parent,
            NodeKind::Member {
                member: member.clone(),
            },
        );
        self.member_nodes.insert(member.character_id, node);
        self.placements
            .insert(member.character_id, member.placement_key());
        report.mutations.push(TreeMutation::Added {
            character_id: member.character_id,
            node,
            parent,
        });
    }
}

/// Keeps the first occurrence of each character id.
fn dedup(members: &[Member]) -> Vec<&Member> {
    let mut seen = HashSet::with_capacity(members.len());
    members
        .iter()
        .filter(|m| {
            let fresh = seen.insert(m.character_id);
            if !fresh {
                log::warn!("Duplicate fleet member {} ignored", m.character_id);
            }
            fresh
        })
        .collect()
}
