//! Task graph maintenance for a quest.
//!
//! The edge set is a forest: every item appears at most once as a child, and
//! following parent edges from any item always ends at the quest root.
//! Operations take the current quest and return the complete next state.

use crate::error::{EngineError, EngineResult};
use crate::types::{Edge, EdgeSource, Quest};
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};

/// Parent of `item_id`, if it has an incoming edge.
pub fn parent_of<'a>(edges: &'a [Edge], item_id: &str) -> Option<&'a EdgeSource> {
    edges.iter().find(|e| e.to == item_id).map(|e| &e.from)
}

/// Direct children of `source`, in edge order.
pub fn children_of<'a>(edges: &'a [Edge], source: &EdgeSource) -> Vec<&'a str> {
    edges
        .iter()
        .filter(|e| &e.from == source)
        .map(|e| e.to.as_str())
        .collect()
}

/// Items hanging directly off the quest root.
pub fn roots(edges: &[Edge]) -> Vec<&str> {
    children_of(edges, &EdgeSource::QuestRoot)
}

/// All items below `item_id`, breadth first.
pub fn descendants<'a>(edges: &'a [Edge], item_id: &str) -> Vec<&'a str> {
    let mut out = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    queue.push_back(item_id);

    while let Some(current) = queue.pop_front() {
        for edge in edges.iter().filter(|e| e.from.is_item(current)) {
            if visited.insert(edge.to.as_str()) {
                out.push(edge.to.as_str());
                queue.push_back(edge.to.as_str());
            }
        }
    }
    out
}

/// Check that the edges form a forest. Returns a description of the first
/// problem found.
pub fn check_forest(edges: &[Edge]) -> Result<(), String> {
    let mut parents: HashMap<&str, &EdgeSource> = HashMap::new();
    for edge in edges {
        if let Some(prev) = parents.insert(edge.to.as_str(), &edge.from) {
            return Err(format!(
                "{} has two parents: {} and {}",
                edge.to, prev, edge.from
            ));
        }
    }

    for start in parents.keys() {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut current = *start;
        seen.insert(current);
        while let Some(EdgeSource::Item(up)) = parents.get(current) {
            if !seen.insert(up.as_str()) {
                return Err(format!("cycle through {}", up));
            }
            current = up.as_str();
        }
    }
    Ok(())
}

/// Record `from -> child_id`.
///
/// Re-adding an existing edge is a no-op. An edge that would give the child a
/// second parent or close a cycle is refused.
pub fn add_edge(quest: &Quest, from: EdgeSource, child_id: &str) -> EngineResult<Quest> {
    let edges = &quest.task_graph;

    if edges.iter().any(|e| e.from == from && e.to == child_id) {
        return Ok(quest.clone());
    }

    if let Some(existing) = parent_of(edges, child_id) {
        return Err(EngineError::forest_violation(format!(
            "{} already has parent {}",
            child_id, existing
        )));
    }

    if let EdgeSource::Item(parent_id) = &from {
        if parent_id == child_id || descendants(edges, child_id).contains(&parent_id.as_str()) {
            return Err(EngineError::forest_violation(format!(
                "edge {} -> {} would create a cycle",
                parent_id, child_id
            )));
        }
    }

    let mut next = quest.clone();
    next.task_graph.push(Edge::new(from, child_id));
    Ok(next)
}

/// Remove `node_id` from the graph, moving its children up to its former
/// parent (or the quest root when it had none).
pub fn remove_node(quest: &Quest, node_id: &str) -> Quest {
    let edges = &quest.task_graph;

    let effective_parent = parent_of(edges, node_id)
        .cloned()
        .unwrap_or(EdgeSource::QuestRoot);

    let orphans: Vec<String> = edges
        .iter()
        .filter(|e| e.from.is_item(node_id))
        .map(|e| e.to.clone())
        .collect();

    let mut remaining: Vec<Edge> = edges
        .iter()
        .filter(|e| e.to != node_id && !e.from.is_item(node_id))
        .cloned()
        .collect();

    for child in orphans {
        let edge = Edge::new(effective_parent.clone(), child);
        if !remaining.contains(&edge) {
            remaining.push(edge);
        }
    }

    let mut next = quest.clone();
    next.task_graph = remaining;
    next
}

/// The item an edge source stands for: the item itself, or the quest's head
/// item for the root sentinel.
pub fn resolve_source<'a>(quest: &'a Quest, source: &'a EdgeSource) -> Option<&'a str> {
    match source {
        EdgeSource::Item(id) => Some(id),
        EdgeSource::QuestRoot => quest.head_item_id.as_deref(),
    }
}

/// A quest's edges together with the outcome of the forest check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphAudit {
    pub quest_id: String,
    pub head_item_id: Option<String>,
    pub edges: Vec<Edge>,
    pub roots: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
}

impl GraphAudit {
    pub fn is_forest(&self) -> bool {
        self.problem.is_none()
    }
}

pub fn audit(quest: &Quest) -> GraphAudit {
    GraphAudit {
        quest_id: quest.id.clone(),
        head_item_id: quest.head_item_id.clone(),
        edges: quest.task_graph.clone(),
        roots: roots(&quest.task_graph).into_iter().map(str::to_string).collect(),
        problem: check_forest(&quest.task_graph).err(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn quest() -> Quest {
        let mut q = Quest::new("q1", "Fix Bug", "u1");
        q.head_item_id = Some("head".to_string());
        q
    }

    fn item(id: &str) -> EdgeSource {
        EdgeSource::item(id)
    }

    #[test]
    fn test_add_edge_is_idempotent() {
        let q = add_edge(&quest(), EdgeSource::QuestRoot, "a").unwrap();
        let q = add_edge(&q, EdgeSource::QuestRoot, "a").unwrap();
        assert_eq!(q.task_graph.len(), 1);
    }

    #[test]
    fn test_add_edge_refuses_second_parent() {
        let q = add_edge(&quest(), EdgeSource::QuestRoot, "a").unwrap();
        let q = add_edge(&q, EdgeSource::QuestRoot, "b").unwrap();
        let err = add_edge(&q, item("b"), "a").unwrap_err();
        assert_eq!(err.code, ErrorCode::ForestViolation);
    }

    #[test]
    fn test_add_edge_refuses_cycle() {
        let q = add_edge(&quest(), item("a"), "b").unwrap();
        let q = add_edge(&q, item("b"), "c").unwrap();

        let err = add_edge(&q, item("c"), "a").unwrap_err();
        assert_eq!(err.code, ErrorCode::ForestViolation);
        assert!(add_edge(&q, item("a"), "a").is_err());
        assert!(check_forest(&q.task_graph).is_ok());
    }

    #[test]
    fn test_check_forest_reports_problems() {
        let two_parents = vec![
            Edge::new(EdgeSource::QuestRoot, "a"),
            Edge::new(item("b"), "a"),
        ];
        assert!(check_forest(&two_parents).unwrap_err().contains("two parents"));

        let looped = vec![Edge::new(item("a"), "b"), Edge::new(item("b"), "a")];
        assert!(check_forest(&looped).unwrap_err().contains("cycle"));
    }

    #[test]
    fn test_remove_root_reparents_to_quest_root() {
        let q = add_edge(&quest(), EdgeSource::QuestRoot, "a").unwrap();
        let q = add_edge(&q, item("a"), "b").unwrap();
        let q = add_edge(&q, item("a"), "c").unwrap();

        let q = remove_node(&q, "a");
        assert_eq!(roots(&q.task_graph), vec!["b", "c"]);
        assert_eq!(
            resolve_source(&q, parent_of(&q.task_graph, "b").unwrap()),
            Some("head")
        );
        assert!(check_forest(&q.task_graph).is_ok());
    }

    #[test]
    fn test_remove_nested_reparents_to_former_parent() {
        let q = add_edge(&quest(), EdgeSource::QuestRoot, "a").unwrap();
        let q = add_edge(&q, item("a"), "b").unwrap();
        let q = add_edge(&q, item("b"), "c").unwrap();
        let q = add_edge(&q, item("b"), "d").unwrap();

        let q = remove_node(&q, "b");
        assert_eq!(children_of(&q.task_graph, &item("a")), vec!["c", "d"]);
        assert_eq!(parent_of(&q.task_graph, "b"), None);
        assert_eq!(q.task_graph.len(), 3);
    }

    #[test]
    fn test_remove_unlinked_node_moves_children_to_root() {
        let mut q = quest();
        q.head_item_id = None;
        let q = add_edge(&q, item("x"), "y").unwrap();
        let q = remove_node(&q, "x");
        assert_eq!(parent_of(&q.task_graph, "y"), Some(&EdgeSource::QuestRoot));
        assert_eq!(resolve_source(&q, &EdgeSource::QuestRoot), None);
    }

    #[test]
    fn test_remove_missing_node_is_noop() {
        let q = add_edge(&quest(), EdgeSource::QuestRoot, "a").unwrap();
        let after = remove_node(&q, "zzz");
        assert_eq!(after, q);
    }

    #[test]
    fn test_audit_reports_roots_and_problem() {
        let q = add_edge(&quest(), EdgeSource::QuestRoot, "a").unwrap();
        let q = add_edge(&q, item("a"), "b").unwrap();
        let report = audit(&q);
        assert!(report.is_forest());
        assert_eq!(report.roots, vec!["a"]);
        assert_eq!(report.head_item_id.as_deref(), Some("head"));

        let mut broken = q.clone();
        broken.task_graph.push(Edge::new(item("b"), "a"));
        let report = audit(&broken);
        assert!(!report.is_forest());
        assert!(report.problem.unwrap().contains("two parents"));
    }

    #[test]
    fn test_descendants() {
        let q = add_edge(&quest(), EdgeSource::QuestRoot, "a").unwrap();
        let q = add_edge(&q, item("a"), "b").unwrap();
        let q = add_edge(&q, item("b"), "c").unwrap();
        assert_eq!(descendants(&q.task_graph, "a"), vec!["b", "c"]);
        assert!(descendants(&q.task_graph, "c").is_empty());
    }

    #[test]
    fn test_forest_holds_over_mixed_operations() {
        let mut q = quest();
        for i in 0..12 {
            let child = format!("n{}", i);
            let from = if i < 3 {
                EdgeSource::QuestRoot
            } else {
                item(&format!("n{}", i / 3 - 1))
            };
            q = add_edge(&q, from, &child).unwrap();
        }
        for victim in ["n1", "n0", "n5", "n9"] {
            q = remove_node(&q, victim);
            check_forest(&q.task_graph).unwrap();
        }
        let mut children: Vec<&str> = q.task_graph.iter().map(|e| e.to.as_str()).collect();
        children.sort();
        children.dedup();
        assert_eq!(children.len(), q.task_graph.len());
        assert_eq!(q.task_graph.len(), 8);
    }
}
