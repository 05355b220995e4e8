//! Discovery of permission sets, objects, and fields on disk.

use std::path::{Path, PathBuf};

use perms_types::DocumentId;
use tracing::debug;
use walkdir::WalkDir;

use crate::config::PermsConfig;
use crate::error::{StoreError, StoreResult};

/// Directory name holding one directory per field under each object.
const FIELDS_DIR: &str = "fields";

#[derive(Clone, Copy, PartialEq, Eq)]
enum Kind {
    File,
    Dir,
}

/// Read-only view of a project's metadata directories.
#[derive(Clone, Debug)]
pub struct ProjectCatalog {
    permission_dir: PathBuf,
    object_dir: PathBuf,
}

impl ProjectCatalog {
    pub fn new(permission_dir: impl Into<PathBuf>, object_dir: impl Into<PathBuf>) -> Self {
        Self {
            permission_dir: permission_dir.into(),
            object_dir: object_dir.into(),
        }
    }

    pub fn from_config(config: &PermsConfig) -> Self {
        Self::new(config.permission_directory(), config.object_directory())
    }

    pub fn permission_dir(&self) -> &Path {
        &self.permission_dir
    }

    pub fn object_dir(&self) -> &Path {
        &self.object_dir
    }

    /// Check that both directories exist and are non-empty.
    pub fn validate(&self) -> StoreResult<()> {
        list_names(&self.permission_dir, Kind::File)?;
        list_names(&self.object_dir, Kind::Dir)?;
        Ok(())
    }

    /// All permission-set documents, sorted by file name.
    pub fn permission_sets(&self) -> StoreResult<Vec<DocumentId>> {
        list_names(&self.permission_dir, Kind::File)?
            .into_iter()
            .map(|name| DocumentId::new(name).map_err(StoreError::from))
            .collect()
    }

    /// Resolve a permission set given either its file name or its title
    /// (`Admin` for `Admin.permissionset-meta.xml`).
    pub fn resolve_permission_set(&self, name: &str) -> StoreResult<DocumentId> {
        let sets = self.permission_sets()?;
        let found = sets
            .iter()
            .find(|id| id.as_str() == name)
            .or_else(|| sets.iter().find(|id| id.title() == name));
        match found {
            Some(id) => Ok(id.clone()),
            None => Err(StoreError::NotFound(DocumentId::new(name)?)),
        }
    }

    /// Object directory names, sorted.
    pub fn objects(&self) -> StoreResult<Vec<String>> {
        list_names(&self.object_dir, Kind::Dir)
    }

    pub fn has_object(&self, object: &str) -> bool {
        !object.is_empty()
            && !object.contains(['/', '\\'])
            && object != ".."
            && self.object_dir.join(object).is_dir()
    }

    /// Field names of an object: the `fields/` file names up to their
    /// first `.`, sorted and unique.
    pub fn fields(&self, object: &str) -> StoreResult<Vec<String>> {
        let dir = self.object_dir.join(object).join(FIELDS_DIR);
        let mut fields: Vec<String> = list_names(&dir, Kind::File)?
            .into_iter()
            .map(|name| title_of(&name).to_string())
            .collect();
        fields.dedup();
        debug!(object, count = fields.len(), "discovered fields");
        Ok(fields)
    }
}

/// Display title of a metadata file name: everything before the first `.`.
pub fn title_of(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

/// Sorted, non-hidden entry names of one kind directly under `dir`.
fn list_names(dir: &Path, kind: Kind) -> StoreResult<Vec<String>> {
    if !dir.is_dir() {
        return Err(StoreError::DirectoryNotFound(dir.to_path_buf()));
    }
    let mut names = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            StoreError::io(path, e.into())
        })?;
        let matches = match kind {
            Kind::File => entry.file_type().is_file(),
            Kind::Dir => entry.file_type().is_dir(),
        };
        let name = entry.file_name().to_string_lossy();
        if matches && !name.starts_with('.') {
            names.push(name.into_owned());
        }
    }
    if names.is_empty() {
        return Err(StoreError::DirectoryEmpty(dir.to_path_buf()));
    }
    Ok(names)
}
