use fcat_protocol::{Member, SquadId, WingId};
use serde::Serialize;
use std::collections::HashMap;

/// Stable node handle. A member keeps its id when it moves between parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(u64);

impl NodeId {
    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    Fleet,
    /// `index` is the 1-based presentation position; raw ids are never shown.
    Wing { wing_id: WingId, index: usize },
    Squad {
        wing_id: WingId,
        squad_id: SquadId,
        index: usize,
    },
    Member { member: Member },
}

#[derive(Debug, Clone)]
pub struct TreeNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl TreeNode {
    #[must_use]
    pub fn member(&self) -> Option<&Member> {
        match &self.kind {
            NodeKind::Member { member } => Some(member),
            _ => None,
        }
    }
}

/// Owned, nested copy of the hierarchy handed to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HierarchyNode {
    pub id: NodeId,
    pub label: String,
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<HierarchyNode>,
}

/// Arena-backed fleet → wing → squad → member tree.
#[derive(Debug, Clone)]
pub struct FleetTree {
    nodes: HashMap<NodeId, TreeNode>,
    root: NodeId,
    next_id: u64,
}

impl Default for FleetTree {
    fn default() -> Self {
        Self::new()
    }
}

impl FleetTree {
    #[must_use]
    pub fn new() -> Self {
        let root = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            TreeNode {
                id: root,
                kind: NodeKind::Fleet,
                parent: None,
                children: Vec::new(),
            },
        );
        Self {
            nodes,
            root,
            next_id: 1,
        }
    }

    /// Drops everything but a fresh root. Ids keep increasing so handles from
    /// before the reset never alias new nodes.
    pub(crate) fn reset(&mut self) {
        let root = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.clear();
        self.nodes.insert(
            root,
            TreeNode {
                id: root,
                kind: NodeKind::Fleet,
                parent: None,
                children: Vec::new(),
            },
        );
        self.root = root;
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(&id)
    }

    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map_or(&[], |n| n.children.as_slice())
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    #[must_use]
    pub fn member(&self, id: NodeId) -> Option<&Member> {
        self.nodes.get(&id).and_then(TreeNode::member)
    }

    /// Total node count, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }

    pub(crate) fn insert(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            TreeNode {
                id,
                kind,
                parent: None,
                children: Vec::new(),
            },
        );
        self.attach(id, parent);
        id
    }

    /// Appends `id` as the last child of `parent`. `id` must be detached.
    pub(crate) fn attach(&mut self, id: NodeId, parent: NodeId) {
        if !self.nodes.contains_key(&parent) {
            return;
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = Some(parent);
        } else {
            return;
        }
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.push(id);
        }
    }

    /// Unlinks `id` from its parent, keeping the node and its subtree.
    pub(crate) fn detach(&mut self, id: NodeId) -> Option<NodeId> {
        let parent = self.nodes.get_mut(&id)?.parent.take()?;
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.retain(|child| *child != id);
        }
        Some(parent)
    }

    /// Removes `id` and its whole subtree.
    pub(crate) fn remove(&mut self, id: NodeId) -> Option<TreeNode> {
        if id == self.root {
            return None;
        }
        self.detach(id);
        let node = self.nodes.remove(&id)?;
        for child in &node.children {
            self.remove_subtree(*child);
        }
        Some(node)
    }

    fn remove_subtree(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.remove(&id) {
            for child in node.children {
                self.remove_subtree(child);
            }
        }
    }

    pub(crate) fn set_member(&mut self, id: NodeId, member: Member) {
        if let Some(node) = self.nodes.get_mut(&id) {
            if let NodeKind::Member { member: current } = &mut node.kind {
                *current = member;
            }
        }
    }

    /// Members anywhere below `id`.
    #[must_use]
    pub fn member_count(&self, id: NodeId) -> usize {
        let Some(node) = self.nodes.get(&id) else {
            return 0;
        };
        let own = usize::from(node.member().is_some());
        own + node
            .children
            .iter()
            .map(|child| self.member_count(*child))
            .sum::<usize>()
    }

    #[must_use]
    pub fn label(&self, id: NodeId) -> String {
        let Some(node) = self.nodes.get(&id) else {
            return String::new();
        };
        match &node.kind {
            NodeKind::Fleet => format!("Fleet ({})", self.member_count(id)),
            NodeKind::Wing { index, .. } => format!("Wing {index} ({})", self.member_count(id)),
            NodeKind::Squad { index, .. } => {
                format!("Squad {index} ({})", self.member_count(id))
            }
            NodeKind::Member { member } => member.name.clone(),
        }
    }

    /// Pre-order traversal as (depth, node) pairs, root at depth 0.
    #[must_use]
    pub fn walk(&self) -> Vec<(usize, NodeId)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(0usize, self.root)];
        while let Some((depth, id)) = stack.pop() {
            out.push((depth, id));
            for child in self.children(id).iter().rev() {
                stack.push((depth + 1, *child));
            }
        }
        out
    }

    #[must_use]
    pub fn to_view(&self) -> HierarchyNode {
        self.view_of(self.root)
    }

    fn view_of(&self, id: NodeId) -> HierarchyNode {
        let kind = self
            .nodes
            .get(&id)
            .map_or(NodeKind::Fleet, |n| n.kind.clone());
        HierarchyNode {
            id,
            label: self.label(id),
            kind,
            children: self
                .children(id)
                .iter()
                .map(|child| self.view_of(*child))
                .collect(),
        }
    }
}
