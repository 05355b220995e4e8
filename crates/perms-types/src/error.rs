use thiserror::Error;

/// Errors produced by type construction and parsing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid access level: {0:?} (expected none, read or read_edit)")]
    InvalidAccessLevel(String),

    #[error("invalid field name: {0:?}")]
    InvalidFieldName(String),

    #[error("invalid document id: {0:?}")]
    InvalidDocumentId(String),

    #[error("empty selection: {0}")]
    EmptySelection(&'static str),
}

/// Result alias for type operations.
pub type TypeResult<T> = Result<T, TypeError>;
