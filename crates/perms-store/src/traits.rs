use async_trait::async_trait;
use perms_types::DocumentId;

use crate::error::StoreResult;

/// Whole-document storage keyed by [`DocumentId`].
///
/// All implementations must satisfy these invariants:
/// - `read` returns exactly the last text written for the id.
/// - `write` fully replaces the document. It is not atomic and takes no
///   lock; callers needing crash safety must not rely on it.
/// - Distinct ids never alias the same document.
/// - All I/O errors are propagated, never silently ignored.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a document's full text.
    ///
    /// Returns `Err(StoreError::NotFound)` if the document does not exist.
    async fn read(&self, id: &DocumentId) -> StoreResult<String>;

    /// Overwrite (or create) a document with `text`.
    async fn write(&self, id: &DocumentId, text: &str) -> StoreResult<()>;

    /// Check whether a document exists.
    async fn exists(&self, id: &DocumentId) -> StoreResult<bool>;

    /// All document ids, sorted.
    async fn list(&self) -> StoreResult<Vec<DocumentId>>;
}
