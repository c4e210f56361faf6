//! Structured error types for engine operations.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Classification errors
    InvalidAttachment,
    DanglingReference,
    UnknownType,

    // Graph errors
    ForestViolation,

    // Lookup errors
    NotFound,
    AlreadyExists,

    // Internal errors
    StorageError,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidAttachment => "INVALID_ATTACHMENT",
            ErrorCode::DanglingReference => "DANGLING_REFERENCE",
            ErrorCode::UnknownType => "UNKNOWN_TYPE",
            ErrorCode::ForestViolation => "FOREST_VIOLATION",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::AlreadyExists => "ALREADY_EXISTS",
            ErrorCode::StorageError => "STORAGE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error returned by the engine and its service layer.
#[derive(Debug, Error, Serialize)]
#[error("{code}: {message}")]
pub struct EngineError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl EngineError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    // Convenience constructors

    pub fn invalid_attachment(reason: &str) -> Self {
        Self::new(ErrorCode::InvalidAttachment, reason).with_field("parent_id")
    }

    pub fn dangling(field: &str, id: &str) -> Self {
        Self::new(
            ErrorCode::DanglingReference,
            format!("{} does not resolve: {}", field, id),
        )
        .with_field(field)
    }

    /// An item referenced from `expected_quest` lives in another quest.
    pub fn quest_mismatch(item_id: &str, item_quest: &str, expected_quest: &str) -> Self {
        Self::new(
            ErrorCode::InvalidAttachment,
            format!(
                "{} belongs to quest {}, not {}",
                item_id, item_quest, expected_quest
            ),
        )
        .with_field("quest_id")
    }

    pub fn unknown_type(field: &str, value: &str) -> Self {
        Self::new(ErrorCode::UnknownType, format!("unknown {}: {}", field, value)).with_field(field)
    }

    pub fn forest_violation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ForestViolation, message)
    }

    pub fn item_not_found(item_id: &str) -> Self {
        Self::new(ErrorCode::NotFound, format!("Item not found: {}", item_id))
    }

    pub fn quest_not_found(quest_id: &str) -> Self {
        Self::new(ErrorCode::NotFound, format!("Quest not found: {}", quest_id))
    }

    pub fn item_exists(item_id: &str) -> Self {
        Self::new(ErrorCode::AlreadyExists, format!("Item already exists: {}", item_id))
            .with_field("id")
    }

    pub fn board_not_found(board_id: &str) -> Self {
        Self::new(ErrorCode::NotFound, format!("Board not found: {}", board_id))
    }

    pub fn storage(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::StorageError, err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }
}

// Storage code returns anyhow; keep an EngineError if one is wrapped inside.
impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<EngineError>() {
            Ok(engine_err) => engine_err,
            Err(err) => EngineError::storage(err),
        }
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(err: rusqlite::Error) -> Self {
        EngineError::storage(err)
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serializes_code() {
        let err = EngineError::dangling("parent_id", "missing-1");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "DANGLING_REFERENCE");
        assert_eq!(json["field"], "parent_id");
    }

    #[test]
    fn test_anyhow_roundtrip_keeps_engine_error() {
        let err: anyhow::Error = EngineError::quest_not_found("q1").into();
        let back: EngineError = err.into();
        assert_eq!(back.code, ErrorCode::NotFound);
    }

    #[test]
    fn test_quest_mismatch_points_at_quest_field() {
        let err = EngineError::quest_mismatch("a", "q1", "q2");
        assert_eq!(err.code, ErrorCode::InvalidAttachment);
        assert_eq!(err.field.as_deref(), Some("quest_id"));
        assert_eq!(err.to_string(), "INVALID_ATTACHMENT: a belongs to quest q1, not q2");
    }

    #[test]
    fn test_anyhow_plain_becomes_storage() {
        let back: EngineError = anyhow::anyhow!("disk on fire").into();
        assert_eq!(back.code, ErrorCode::StorageError);
        assert_eq!(back.to_string(), "STORAGE_ERROR: disk on fire");
    }
}
