use std::path::PathBuf;

use perms_types::{DocumentId, TypeError};

/// Errors from document storage and directory discovery.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested document does not exist.
    #[error("document not found: {0}")]
    NotFound(DocumentId),

    /// A directory the layout points at does not exist.
    #[error("directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// A directory exists but holds nothing usable.
    #[error("directory is empty: {}", .0.display())]
    DirectoryEmpty(PathBuf),

    /// A file name could not be used as a document id.
    #[error("invalid document id: {0}")]
    InvalidId(#[from] TypeError),

    /// A document's bytes are not valid UTF-8.
    #[error("{id} is not valid UTF-8 (first bad byte at {valid_up_to})")]
    InvalidUtf8 { id: DocumentId, valid_up_to: usize },

    /// I/O error from the underlying storage.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from loading or combining configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Base directory and both overrides were all given; the base would be
    /// unused.
    #[error("--directory cannot be combined with both --permission-set-directory and --object-directory")]
    Conflicting,
}
