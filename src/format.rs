//! Output formatting utilities for markdown and JSON.

use crate::boards::Timeline;
use crate::relations::task_graph::{self, GraphAudit};
use crate::types::{Board, EdgeSource, Item, Quest};
use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;

/// Output format for CLI results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Markdown,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "markdown" | "md" => Some(OutputFormat::Markdown),
            _ => None,
        }
    }
}

pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Format a single item as markdown.
pub fn format_item_markdown(item: &Item) -> String {
    let mut md = String::new();

    md.push_str(&format!("## {}: `{}`\n", item.item_type, item.id));
    md.push_str(&format!("- **author**: {}\n", item.author_id));
    md.push_str(&format!("- **status**: {}\n", item.status.as_str()));
    md.push_str(&format!("- **visibility**: {}\n", item.visibility.as_str()));

    if let Some(subtype) = item.subtype {
        md.push_str(&format!("- **subtype**: {}\n", subtype.as_str()));
    }
    if let Some(ref quest_id) = item.quest_id {
        md.push_str(&format!("- **quest**: `{}`\n", quest_id));
    }
    if let Some(ref parent_id) = item.parent_id {
        md.push_str(&format!("- **parent**: `{}`\n", parent_id));
    }
    if let Some(ref node_id) = item.node_id {
        md.push_str(&format!("- **node**: `{}`\n", node_id));
    }
    if !item.tags.is_empty() {
        let tags: Vec<&str> = item.tags.iter().map(String::as_str).collect();
        md.push_str(&format!("- **tags**: {}\n", tags.join(", ")));
    }

    md
}

/// Format a quest and its task tree as markdown.
pub fn format_quest_markdown(quest: &Quest, items: &[Item]) -> String {
    let by_id: HashMap<&str, &Item> = items.iter().map(|i| (i.id.as_str(), i)).collect();
    let mut md = String::new();

    md.push_str(&format!("# Quest: {}\n", quest.title));
    md.push_str(&format!("- **id**: `{}`\n", quest.id));
    md.push_str(&format!("- **author**: {}\n", quest.author_id));
    md.push_str(&format!("- **status**: {}\n", quest.status.as_str()));
    if !quest.collaborators.is_empty() {
        md.push_str(&format!("- **collaborators**: {}\n", quest.collaborators.join(", ")));
    }

    md.push_str("\n## Tasks\n");
    if quest.task_graph.is_empty() {
        md.push_str("_none_\n");
    } else {
        push_tree(&mut md, quest, &by_id, &EdgeSource::QuestRoot, 0);
    }
    md
}

fn push_tree(md: &mut String, quest: &Quest, by_id: &HashMap<&str, &Item>, source: &EdgeSource, depth: usize) {
    for child in task_graph::children_of(&quest.task_graph, source) {
        let label = by_id
            .get(child)
            .and_then(|i| i.node_id.as_deref())
            .unwrap_or("-");
        md.push_str(&format!("{}- `{}` {}\n", "  ".repeat(depth), child, label));
        push_tree(md, quest, by_id, &EdgeSource::item(child), depth + 1);
    }
}

/// Format a task graph audit: the verdict, then one line per edge.
pub fn format_graph_markdown(report: &GraphAudit) -> String {
    let mut md = format!("# Task graph: `{}`\n", report.quest_id);
    match &report.problem {
        None => md.push_str("- **forest**: ok\n"),
        Some(problem) => md.push_str(&format!("- **forest**: BROKEN ({})\n", problem)),
    }
    if let Some(ref head) = report.head_item_id {
        md.push_str(&format!("- **head**: `{}`\n", head));
    }

    md.push_str(&format!("\n## Edges ({})\n", report.edges.len()));
    for edge in &report.edges {
        md.push_str(&format!("- {} -> `{}`\n", edge.from, edge.to));
    }
    md
}

/// Format a board as a numbered markdown list.
pub fn format_board_markdown(board: &Board) -> String {
    let mut md = format!("# Board: {} ({})\n\n", board.id, board.items.len());
    for (i, id) in board.items.iter().enumerate() {
        md.push_str(&format!("{}. `{}`\n", i + 1, id));
    }
    md
}

/// Format a timeline, marking highlighted entries.
pub fn format_timeline_markdown(timeline: &Timeline) -> String {
    let mut md = format!("# Timeline ({})\n\n", timeline.ids.len());
    for id in &timeline.ids {
        let star = if timeline.highlights.get(id).copied().unwrap_or(false) {
            " *"
        } else {
            ""
        };
        md.push_str(&format!("- `{}`{}\n", id, star));
    }
    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Edge, ItemType};

    #[test]
    fn test_quest_tree_markdown() {
        let mut quest = Quest::new("q1", "Fix Bug", "u1");
        quest.task_graph = vec![
            Edge::new(EdgeSource::QuestRoot, "a"),
            Edge::new(EdgeSource::item("a"), "b"),
        ];
        let mut a = Item::new("a", ItemType::Task, "u1");
        a.node_id = Some("Q:fix_bug:T00".to_string());

        let md = format_quest_markdown(&quest, &[a]);
        assert!(md.contains("- `a` Q:fix_bug:T00\n"));
        assert!(md.contains("  - `b` -\n"));
    }

    #[test]
    fn test_graph_markdown_shows_verdict_and_edges() {
        let mut quest = Quest::new("q1", "Fix Bug", "u1");
        quest.task_graph = vec![
            Edge::new(EdgeSource::QuestRoot, "a"),
            Edge::new(EdgeSource::item("a"), "b"),
        ];
        let md = format_graph_markdown(&task_graph::audit(&quest));
        assert!(md.contains("- **forest**: ok\n"));
        assert!(md.contains("- <quest-root> -> `a`\n"));
        assert!(md.contains("- a -> `b`\n"));

        quest.task_graph.push(Edge::new(EdgeSource::item("b"), "a"));
        let md = format_graph_markdown(&task_graph::audit(&quest));
        assert!(md.contains("BROKEN"));
    }

    #[test]
    fn test_timeline_markdown_marks_highlights() {
        let mut timeline = Timeline::default();
        timeline.ids = vec!["x".to_string(), "y".to_string()];
        timeline.highlights.insert("x".to_string(), true);
        timeline.highlights.insert("y".to_string(), false);
        let md = format_timeline_markdown(&timeline);
        assert!(md.contains("- `x` *\n"));
        assert!(md.contains("- `y`\n"));
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::from_str("MD"), Some(OutputFormat::Markdown));
        assert_eq!(OutputFormat::from_str("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("xml"), None);
    }
}
