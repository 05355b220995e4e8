use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use perms_types::DocumentId;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::DocumentStore;

/// Filesystem-backed store: each document is a file directly under `root`.
#[derive(Clone, Debug)]
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a document. Ids are validated file names, so this never
    /// leaves `root`.
    pub fn path_of(&self, id: &DocumentId) -> PathBuf {
        self.root.join(id.as_str())
    }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn read(&self, id: &DocumentId) -> StoreResult<String> {
        let path = self.path_of(id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StoreError::NotFound(id.clone())),
            Err(e) => return Err(StoreError::io(path, e)),
        };
        debug!(path = %path.display(), bytes = bytes.len(), "read document");
        String::from_utf8(bytes).map_err(|e| StoreError::InvalidUtf8 {
            id: id.clone(),
            valid_up_to: e.utf8_error().valid_up_to(),
        })
    }

    async fn write(&self, id: &DocumentId, text: &str) -> StoreResult<()> {
        let path = self.path_of(id);
        tokio::fs::write(&path, text.as_bytes())
            .await
            .map_err(|e| StoreError::io(&path, e))?;
        debug!(path = %path.display(), bytes = text.len(), "wrote document");
        Ok(())
    }

    async fn exists(&self, id: &DocumentId) -> StoreResult<bool> {
        let path = self.path_of(id);
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    async fn list(&self) -> StoreResult<Vec<DocumentId>> {
        let mut dir = match tokio::fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::DirectoryNotFound(self.root.clone()))
            }
            Err(e) => return Err(StoreError::io(&self.root, e)),
        };
        let mut ids = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| StoreError::io(&self.root, e))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| StoreError::io(entry.path(), e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !file_type.is_file() || name.starts_with('.') {
                continue;
            }
            ids.push(DocumentId::new(name)?);
        }
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> DocumentId {
        DocumentId::new(name).unwrap()
    }

    #[tokio::test]
    async fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsDocumentStore::new(dir.path());
        let doc = id("Admin.permissionset-meta.xml");
        store.write(&doc, "<PermissionSet/>\n").await.unwrap();
        assert_eq!(store.read(&doc).await.unwrap(), "<PermissionSet/>\n");
        assert!(store.exists(&doc).await.unwrap());
    }

    #[tokio::test]
    async fn write_overwrites_fully() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsDocumentStore::new(dir.path());
        let doc = id("A.xml");
        store.write(&doc, "a much longer first version").await.unwrap();
        store.write(&doc, "short").await.unwrap();
        assert_eq!(store.read(&doc).await.unwrap(), "short");
    }

    #[tokio::test]
    async fn missing_document_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsDocumentStore::new(dir.path());
        let err = store.read(&id("Gone.xml")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(d) if d.as_str() == "Gone.xml"));
        assert!(!store.exists(&id("Gone.xml")).await.unwrap());
    }

    #[tokio::test]
    async fn non_utf8_document_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Latin1.xml"), b"<a>caf\xe9</a>").unwrap();
        let store = FsDocumentStore::new(dir.path());
        let err = store.read(&id("Latin1.xml")).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidUtf8 { ref id, valid_up_to: 6 } if id.as_str() == "Latin1.xml"
        ));
    }

    #[tokio::test]
    async fn list_skips_hidden_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("B.permissionset-meta.xml"), "<a/>").unwrap();
        std::fs::write(dir.path().join("A.permissionset-meta.xml"), "<a/>").unwrap();
        std::fs::write(dir.path().join(".DS_Store"), "").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let store = FsDocumentStore::new(dir.path());
        let ids = store.list().await.unwrap();
        let names: Vec<_> = ids.iter().map(DocumentId::as_str).collect();
        assert_eq!(
            names,
            vec!["A.permissionset-meta.xml", "B.permissionset-meta.xml"]
        );
    }

    #[tokio::test]
    async fn list_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsDocumentStore::new(dir.path().join("nope"));
        assert!(matches!(
            store.list().await,
            Err(StoreError::DirectoryNotFound(_))
        ));
    }
}
