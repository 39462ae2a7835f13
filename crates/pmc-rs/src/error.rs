// crates/pmc-rs/src/error.rs

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

use crate::schema::{AttrError, NodeKind};

/// The specific schema violation found while loading a model file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorKind {
    /// `_type` is missing, unknown, or belongs to another tree.
    UnknownKind,
    /// A required attribute is absent.
    AttributeMissing,
    /// A key that is neither an attribute, `uuid`, `children` nor `_type`.
    UnknownAttribute,
    /// A value does not have the attribute's declared type.
    TypeMismatch,
    /// The same UUID appears twice across cooperating roots.
    DuplicateUuid,
    /// A child kind is not allowed under its parent.
    InvalidChild,
}

impl fmt::Display for SchemaErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SchemaErrorKind::UnknownKind => "unknown kind",
            SchemaErrorKind::AttributeMissing => "attribute missing",
            SchemaErrorKind::UnknownAttribute => "unknown attribute",
            SchemaErrorKind::TypeMismatch => "type mismatch",
            SchemaErrorKind::DuplicateUuid => "duplicate uuid",
            SchemaErrorKind::InvalidChild => "invalid child",
        };
        f.write_str(text)
    }
}

/// A schema violation on load. Always names the JSON path of the offending node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    pub kind: SchemaErrorKind,
    pub uuid: Option<Uuid>,
    pub path: String,
    pub detail: String,
}

impl SchemaError {
    pub fn new(kind: SchemaErrorKind, uuid: Option<Uuid>, path: &str, detail: impl Into<String>) -> Self {
        Self {
            kind,
            uuid,
            path: path.to_string(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.kind, self.path)?;
        if let Some(uuid) = self.uuid {
            write!(f, " (uuid {uuid})")?;
        }
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaError {}

/// Errors raised by core model operations.
#[derive(Debug, Error)]
pub enum PmError {
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("node {0} not found")]
    NotFound(Uuid),

    /// Invariant violation or expansion precondition failure. The operation
    /// that raised it left the model untouched.
    #[error("consistency error: {0}")]
    Consistency(String),

    #[error("point {uuid} has size {size} but type {type_name} requires {expected}")]
    MismatchedSizeAndType {
        uuid: Uuid,
        type_name: String,
        size: i64,
        expected: i64,
    },

    #[error("point {uuid} has unresolved type uuid {type_uuid:?}")]
    TypeNotFound { uuid: Uuid, type_uuid: Option<Uuid> },

    #[error("{kind:?} node {uuid} cannot be deleted")]
    CannotDelete { uuid: Uuid, kind: NodeKind },

    #[error("cannot drop {source_kind:?} {source_uuid} onto {target_kind:?} {target}")]
    IllegalDrop {
        source_uuid: Uuid,
        source_kind: NodeKind,
        target: Uuid,
        target_kind: NodeKind,
    },

    #[error("{child:?} is not a valid child of {parent:?}")]
    IllegalChild { parent: NodeKind, child: NodeKind },

    #[error("attribute error on {uuid}: {source}")]
    Attribute {
        uuid: Uuid,
        #[source]
        source: AttrError,
    },

    #[error("drop payload must be 16 bytes, got {0}")]
    Payload(usize),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PmError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PmError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn consistency(message: impl Into<String>) -> Self {
        PmError::Consistency(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_message_names_path_and_uuid() {
        let uuid = Uuid::nil();
        let err = SchemaError::new(
            SchemaErrorKind::TypeMismatch,
            Some(uuid),
            "$.children[0]",
            "bits: expected integer",
        );
        let text = err.to_string();
        assert!(text.contains("$.children[0]"), "got {text}");
        assert!(text.contains(&uuid.to_string()), "got {text}");
        assert!(text.starts_with("type mismatch"), "got {text}");
    }
}
