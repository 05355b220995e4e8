use perms_fieldset::FieldSetError;
use perms_store::{ConfigError, StoreError};
use perms_types::{DocumentId, TypeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpdateError {
    /// A selected permission set does not exist at update time.
    #[error("permission set not found: {0}")]
    DocumentNotFound(DocumentId),

    /// The document's text could not be parsed or is not a permission set.
    #[error("{id} is malformed: {source}")]
    MalformedDocument {
        id: DocumentId,
        #[source]
        source: FieldSetError,
    },

    #[error("invalid access level {0:?}, expected one of none, read, read_edit")]
    InvalidAccessLevel(String),

    #[error("invalid selection: {0}")]
    InvalidSelection(TypeError),

    #[error("object {0} not found")]
    UnknownObject(String),

    #[error("field {field} not found on {object}")]
    UnknownField { object: String, field: String },

    /// The same field was given two access levels in one run.
    #[error("field {0} given more than once")]
    DuplicateField(String),

    #[error("cannot read {id}: {source}")]
    ReadFailure {
        id: DocumentId,
        #[source]
        source: StoreError,
    },

    #[error("cannot write {id}: {source}")]
    WriteFailure {
        id: DocumentId,
        #[source]
        source: StoreError,
    },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The task updating a document panicked or was cancelled.
    #[error("update task failed: {0}")]
    TaskFailed(String),
}

impl From<TypeError> for UpdateError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidAccessLevel(level) => Self::InvalidAccessLevel(level),
            other => Self::InvalidSelection(other),
        }
    }
}

pub type UpdateResult<T> = Result<T, UpdateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_level_errors_keep_their_kind() {
        let err = UpdateError::from(TypeError::InvalidAccessLevel("archived".into()));
        assert!(matches!(err, UpdateError::InvalidAccessLevel(ref l) if l == "archived"));
        assert!(err.to_string().contains("\"archived\""));

        let err = UpdateError::from(TypeError::EmptySelection("no fields selected"));
        assert!(matches!(err, UpdateError::InvalidSelection(_)));
    }
}
