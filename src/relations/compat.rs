//! Attachment rules: which item types may reply to which.

use crate::error::{EngineError, EngineResult};
use crate::types::{Item, ItemSubtype, ItemType};
use serde::Serialize;

/// Why an attachment was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    MissingParent,
    MissingSubtype,
    IncompatibleParent,
    UnknownType,
    DanglingParent,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::MissingParent => "missing parent",
            RejectReason::MissingSubtype => "missing subtype",
            RejectReason::IncompatibleParent => "incompatible parent",
            RejectReason::UnknownType => "unknown type",
            RejectReason::DanglingParent => "dangling parent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", content = "reason", rename_all = "snake_case")]
pub enum Verdict {
    Allow,
    Reject(RejectReason),
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allow)
    }

    /// Map a rejection onto the error taxonomy.
    pub fn into_result(self) -> EngineResult<()> {
        match self {
            Verdict::Allow => Ok(()),
            Verdict::Reject(RejectReason::UnknownType) => {
                Err(EngineError::unknown_type("type", "unrecognised item type"))
            }
            Verdict::Reject(RejectReason::DanglingParent) => {
                Err(EngineError::dangling("parent_id", "unresolved parent"))
            }
            Verdict::Reject(reason) => Err(EngineError::invalid_attachment(reason.as_str())),
        }
    }
}

/// Child types a parent of the given type accepts as plain replies.
const REPLY_RULES: &[(ItemType, &[ItemType])] = &[
    (
        ItemType::Task,
        &[ItemType::FreeSpeech, ItemType::Task, ItemType::File],
    ),
    (ItemType::File, &[ItemType::FreeSpeech, ItemType::File]),
    (ItemType::FreeSpeech, &[ItemType::FreeSpeech]),
    (ItemType::Request, &[ItemType::FreeSpeech]),
    (ItemType::Review, &[ItemType::FreeSpeech]),
    (ItemType::Change, &[ItemType::FreeSpeech]),
];

/// Child types that may be created without a parent.
const ROOT_TYPES: &[ItemType] = &[ItemType::Task, ItemType::FreeSpeech];

/// Decide whether an item of `child_type` may attach to `parent`.
pub fn validate_attachment(
    parent: Option<&Item>,
    child_type: ItemType,
    child_subtype: Option<ItemSubtype>,
) -> Verdict {
    let parent_type = parent.map(|p| p.item_type);

    // Type-specific rules come first so they can reach past the reply table
    match child_type {
        ItemType::Request => {
            return match (child_subtype, parent_type) {
                (None, _) => Verdict::Reject(RejectReason::MissingSubtype),
                (Some(_), Some(ItemType::Task)) => Verdict::Allow,
                (Some(ItemSubtype::Task), None) => Verdict::Allow,
                (Some(ItemSubtype::File), None) => Verdict::Reject(RejectReason::MissingParent),
                (Some(_), Some(_)) => Verdict::Reject(RejectReason::IncompatibleParent),
            };
        }
        ItemType::Review => {
            return match parent_type {
                None => Verdict::Reject(RejectReason::MissingParent),
                Some(ItemType::Request) => Verdict::Allow,
                Some(_) => Verdict::Reject(RejectReason::IncompatibleParent),
            };
        }
        ItemType::Change => {
            return match parent_type {
                None => Verdict::Reject(RejectReason::MissingParent),
                Some(ItemType::Task | ItemType::File) => Verdict::Allow,
                Some(_) => Verdict::Reject(RejectReason::IncompatibleParent),
            };
        }
        _ => {}
    }

    let Some(parent_type) = parent_type else {
        return if ROOT_TYPES.contains(&child_type) {
            Verdict::Allow
        } else {
            Verdict::Reject(RejectReason::MissingParent)
        };
    };

    let allowed = REPLY_RULES
        .iter()
        .find(|(p, _)| *p == parent_type)
        .map(|(_, children)| children.contains(&child_type))
        .unwrap_or(false);

    if allowed {
        Verdict::Allow
    } else {
        Verdict::Reject(RejectReason::IncompatibleParent)
    }
}

/// Validate from raw type names, as received at a boundary layer.
pub fn validate_raw(parent: Option<&Item>, child_type: &str, child_subtype: Option<&str>) -> Verdict {
    let Ok(child_type) = ItemType::parse(child_type) else {
        return Verdict::Reject(RejectReason::UnknownType);
    };
    let subtype = match child_subtype.map(ItemSubtype::parse) {
        None => None,
        Some(Ok(s)) => Some(s),
        Some(Err(_)) => return Verdict::Reject(RejectReason::UnknownType),
    };
    validate_attachment(parent, child_type, subtype)
}

/// Look up a parent id in a snapshot.
///
/// `Ok(None)` when no parent was supplied; `DanglingReference` when the id
/// does not resolve.
pub fn resolve_parent<'a>(items: &'a [Item], parent_id: Option<&str>) -> EngineResult<Option<&'a Item>> {
    match parent_id {
        None => Ok(None),
        Some(id) => items
            .iter()
            .find(|i| i.id == id)
            .map(Some)
            .ok_or_else(|| EngineError::dangling("parent_id", id)),
    }
}

/// Resolve and validate in one step, returning a [`Verdict`].
pub fn validate_in_snapshot(
    items: &[Item],
    parent_id: Option<&str>,
    child_type: ItemType,
    child_subtype: Option<ItemSubtype>,
) -> Verdict {
    match resolve_parent(items, parent_id) {
        Ok(parent) => validate_attachment(parent, child_type, child_subtype),
        Err(_) => Verdict::Reject(RejectReason::DanglingParent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn item(t: ItemType) -> Item {
        Item::new(format!("p-{}", t), t, "author")
    }

    #[test]
    fn test_free_speech_under_task_allowed() {
        let parent = item(ItemType::Task);
        assert_eq!(
            validate_attachment(Some(&parent), ItemType::FreeSpeech, None),
            Verdict::Allow
        );
    }

    #[test]
    fn test_task_under_file_rejected() {
        let parent = item(ItemType::File);
        assert_eq!(
            validate_attachment(Some(&parent), ItemType::Task, None),
            Verdict::Reject(RejectReason::IncompatibleParent)
        );
    }

    #[test]
    fn test_root_request_with_task_subtype_allowed() {
        assert_eq!(
            validate_attachment(None, ItemType::Request, Some(ItemSubtype::Task)),
            Verdict::Allow
        );
    }

    #[test]
    fn test_file_request_needs_task_parent() {
        assert_eq!(
            validate_attachment(None, ItemType::Request, Some(ItemSubtype::File)),
            Verdict::Reject(RejectReason::MissingParent)
        );
        let task = item(ItemType::Task);
        assert!(validate_attachment(Some(&task), ItemType::Request, Some(ItemSubtype::File)).is_allowed());
        let file = item(ItemType::File);
        assert_eq!(
            validate_attachment(Some(&file), ItemType::Request, Some(ItemSubtype::File)),
            Verdict::Reject(RejectReason::IncompatibleParent)
        );
    }

    #[test]
    fn test_request_without_subtype_rejected() {
        assert_eq!(
            validate_attachment(None, ItemType::Request, None),
            Verdict::Reject(RejectReason::MissingSubtype)
        );
    }

    #[test]
    fn test_review_requires_request_parent() {
        let task = item(ItemType::Task);
        assert_eq!(
            validate_attachment(Some(&task), ItemType::Review, None),
            Verdict::Reject(RejectReason::IncompatibleParent)
        );
        let request = item(ItemType::Request);
        assert!(validate_attachment(Some(&request), ItemType::Review, None).is_allowed());
        assert_eq!(
            validate_attachment(None, ItemType::Review, None),
            Verdict::Reject(RejectReason::MissingParent)
        );
    }

    #[test]
    fn test_change_requires_parent() {
        assert_eq!(
            validate_attachment(None, ItemType::Change, None),
            Verdict::Reject(RejectReason::MissingParent)
        );
        let file = item(ItemType::File);
        assert!(validate_attachment(Some(&file), ItemType::Change, None).is_allowed());
    }

    #[test]
    fn test_rootless_file_is_missing_parent() {
        let verdict = validate_attachment(None, ItemType::File, None);
        assert_eq!(verdict, Verdict::Reject(RejectReason::MissingParent));
        assert_eq!(RejectReason::MissingParent.as_str(), "missing parent");
    }

    #[test]
    fn test_root_task_and_free_speech_allowed() {
        assert!(validate_attachment(None, ItemType::Task, None).is_allowed());
        assert!(validate_attachment(None, ItemType::FreeSpeech, None).is_allowed());
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert_eq!(
            validate_raw(None, "poem", None),
            Verdict::Reject(RejectReason::UnknownType)
        );
        assert_eq!(
            validate_raw(None, "request", Some("video")),
            Verdict::Reject(RejectReason::UnknownType)
        );
        assert!(validate_raw(None, "FreeSpeech", None).is_allowed());
    }

    #[test]
    fn test_dangling_parent_rejected() {
        let items = vec![item(ItemType::Task)];
        assert_eq!(
            validate_in_snapshot(&items, Some("ghost"), ItemType::FreeSpeech, None),
            Verdict::Reject(RejectReason::DanglingParent)
        );
        let err = resolve_parent(&items, Some("ghost")).unwrap_err();
        assert_eq!(err.code, ErrorCode::DanglingReference);
        assert!(validate_in_snapshot(&items, Some("p-task"), ItemType::Task, None).is_allowed());
    }

    #[test]
    fn test_verdict_maps_to_error_codes() {
        let err = Verdict::Reject(RejectReason::IncompatibleParent)
            .into_result()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidAttachment);
        assert_eq!(err.message, "incompatible parent");
        assert!(Verdict::Allow.into_result().is_ok());
    }
}
