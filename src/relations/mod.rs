//! Content relationship and identity rules.
//!
//! Pure functions over in-memory values: attachment validation, node id
//! assignment and task graph maintenance. Nothing in here touches storage.

pub mod compat;
pub mod identity;
pub mod task_graph;

pub use compat::{RejectReason, Verdict, resolve_parent, validate_attachment, validate_raw};
pub use identity::{NodeIdPlan, assign_node_id, plan_node_id, slugify, type_segment};
pub use task_graph::{add_edge, check_forest, remove_node};
