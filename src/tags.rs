//! Structural markers carried in the legacy tag list.
//!
//! Stored tag lists mix structural state (`summary:request`, `pending:<user>`,
//! `archived`, `system`) with free-form display labels. On load the list is
//! split into [`Marker`]s and a label set; on save the two are joined back so
//! existing data keeps its exact string form.

use crate::types::ItemType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Marker {
    /// Item summarises items of the given type.
    Summary(ItemType),
    /// Awaiting action from the given user.
    Pending(String),
    Archived,
    /// Generated by the platform rather than a user.
    System,
}

impl Marker {
    /// Parse a raw tag. Returns `None` for display labels.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "archived" => return Some(Marker::Archived),
            "system" => return Some(Marker::System),
            _ => {}
        }
        if let Some(rest) = tag.strip_prefix("summary:") {
            return ItemType::parse(rest).ok().map(Marker::Summary);
        }
        if let Some(user) = tag.strip_prefix("pending:") {
            if !user.is_empty() {
                return Some(Marker::Pending(user.to_string()));
            }
        }
        None
    }

    pub fn to_tag(&self) -> String {
        match self {
            Marker::Summary(t) => format!("summary:{}", t.as_str().replace('_', "")),
            Marker::Pending(user) => format!("pending:{}", user),
            Marker::Archived => "archived".to_string(),
            Marker::System => "system".to_string(),
        }
    }
}

/// Split a raw tag list into structural markers and display labels.
pub fn split_tags<I, S>(raw: I) -> (Vec<Marker>, BTreeSet<String>)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut markers = Vec::new();
    let mut labels = BTreeSet::new();
    for tag in raw {
        let tag = tag.as_ref();
        match Marker::parse(tag) {
            // Only canonical spellings become markers, anything else stays a label
            Some(marker) if marker.to_tag() == tag => {
                if !markers.contains(&marker) {
                    markers.push(marker);
                }
            }
            _ => {
                labels.insert(tag.to_string());
            }
        }
    }
    (markers, labels)
}

/// Join markers and labels back into a single sorted tag list.
pub fn join_tags(markers: &[Marker], labels: &BTreeSet<String>) -> Vec<String> {
    let mut all: BTreeSet<String> = labels.clone();
    all.extend(markers.iter().map(Marker::to_tag));
    all.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_recognises_markers() {
        let (markers, labels) = split_tags(["summary:request", "pending:u1", "rust", "archived"]);
        assert_eq!(
            markers,
            vec![
                Marker::Summary(ItemType::Request),
                Marker::Pending("u1".to_string()),
                Marker::Archived,
            ]
        );
        assert_eq!(labels.into_iter().collect::<Vec<_>>(), vec!["rust"]);
    }

    #[test]
    fn test_split_join_preserves_tags() {
        let raw = vec![
            "summary:freespeech".to_string(),
            "pending:".to_string(),
            "summary:Request".to_string(),
            "system".to_string(),
            "help wanted".to_string(),
        ];
        let (markers, labels) = split_tags(&raw);
        let mut expected = raw.clone();
        expected.sort();
        assert_eq!(join_tags(&markers, &labels), expected);
    }

    #[test]
    fn test_unknown_summary_stays_label() {
        let (markers, labels) = split_tags(["summary:poem"]);
        assert!(markers.is_empty());
        assert!(labels.contains("summary:poem"));
    }
}
