//! Fleet hierarchy, role overrides, alerts and composition summaries.
//!
//! Everything here is synchronous local state; callers feed it fully
//! resolved [`Member`](fcat_protocol::Member) lists once per poll.

pub mod alerts;
pub mod overrides;
pub mod reconciler;
pub mod summary;
pub mod tree;

pub use alerts::{Alert, AlertEvaluator, AlertThresholds, Severity};
pub use overrides::{apply_combat_override, CombatOverride, DEFAULT_OVERRIDE_THRESHOLD};
pub use reconciler::{ReconcileReport, Reconciler, TreeMutation};
pub use summary::{FleetSummary, Share};
pub use tree::{FleetTree, HierarchyNode, NodeId, NodeKind, TreeNode};
