use std::collections::{BTreeMap, HashSet};
use std::io;
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use perms_types::DocumentId;

use crate::error::{StoreError, StoreResult};
use crate::traits::DocumentStore;

/// In-memory, `BTreeMap`-based document store.
///
/// Intended for tests. Every successful write is recorded in order, and
/// writes to chosen ids can be made to fail to exercise error paths.
pub struct InMemoryDocumentStore {
    documents: RwLock<BTreeMap<DocumentId, String>>,
    failing_writes: RwLock<HashSet<DocumentId>>,
    write_log: Mutex<Vec<DocumentId>>,
}

impl InMemoryDocumentStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(BTreeMap::new()),
            failing_writes: RwLock::new(HashSet::new()),
            write_log: Mutex::new(Vec::new()),
        }
    }

    /// Create a store pre-populated with `(id, text)` pairs.
    pub fn with_documents<I, S>(docs: I) -> Self
    where
        I: IntoIterator<Item = (DocumentId, S)>,
        S: Into<String>,
    {
        let store = Self::new();
        {
            let mut map = store.documents.write().expect("lock poisoned");
            for (id, text) in docs {
                map.insert(id, text.into());
            }
        }
        store
    }

    /// Current text of a document, bypassing the async interface.
    pub fn get(&self, id: &DocumentId) -> Option<String> {
        self.documents.read().expect("lock poisoned").get(id).cloned()
    }

    /// Number of documents currently stored.
    pub fn len(&self) -> usize {
        self.documents.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.documents.read().expect("lock poisoned").is_empty()
    }

    /// Make every future write to `id` fail with an I/O error.
    pub fn fail_writes_to(&self, id: DocumentId) {
        self.failing_writes.write().expect("lock poisoned").insert(id);
    }

    /// Ids of successful writes, in completion order.
    pub fn writes(&self) -> Vec<DocumentId> {
        self.write_log.lock().expect("lock poisoned").clone()
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn read(&self, id: &DocumentId) -> StoreResult<String> {
        self.get(id).ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn write(&self, id: &DocumentId, text: &str) -> StoreResult<()> {
        if self.failing_writes.read().expect("lock poisoned").contains(id) {
            return Err(StoreError::io(
                id.as_str(),
                io::Error::new(io::ErrorKind::PermissionDenied, "write refused"),
            ));
        }
        self.documents
            .write()
            .expect("lock poisoned")
            .insert(id.clone(), text.to_string());
        self.write_log.lock().expect("lock poisoned").push(id.clone());
        Ok(())
    }

    async fn exists(&self, id: &DocumentId) -> StoreResult<bool> {
        Ok(self.documents.read().expect("lock poisoned").contains_key(id))
    }

    async fn list(&self) -> StoreResult<Vec<DocumentId>> {
        Ok(self
            .documents
            .read()
            .expect("lock poisoned")
            .keys()
            .cloned()
            .collect())
    }
}

impl std::fmt::Debug for InMemoryDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryDocumentStore")
            .field("document_count", &self.len())
            .finish()
    }
}
