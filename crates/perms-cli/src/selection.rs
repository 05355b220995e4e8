//! Selection built from command-line flags and checked against the project.

use std::collections::BTreeMap;

use perms_store::ProjectCatalog;
use perms_types::{AccessLevel, DocumentId, Selection};
use perms_updater::{SelectionProvider, UpdateError, UpdateResult};
use tracing::debug;

/// Which permission sets a `field new` run targets.
#[derive(Clone, Debug)]
pub enum Targets {
    All,
    Named(Vec<String>),
}

/// Resolves flag values against the project layout.
#[derive(Clone, Debug)]
pub struct FlagSelection {
    catalog: ProjectCatalog,
    targets: Targets,
    object: String,
    fields: Vec<(String, String)>,
}

impl FlagSelection {
    pub fn new(
        catalog: ProjectCatalog,
        targets: Targets,
        object: impl Into<String>,
        fields: Vec<(String, String)>,
    ) -> Self {
        Self {
            catalog,
            targets,
            object: object.into(),
            fields,
        }
    }
}

impl SelectionProvider for FlagSelection {
    fn select(&self) -> UpdateResult<Selection> {
        // Levels first: a bad level fails even when the project is missing.
        let mut levels = BTreeMap::new();
        for (field, level) in &self.fields {
            if levels.insert(field.clone(), level.parse::<AccessLevel>()?).is_some() {
                return Err(UpdateError::DuplicateField(field.clone()));
            }
        }

        self.catalog.validate()?;
        if !self.catalog.has_object(&self.object) {
            return Err(UpdateError::UnknownObject(self.object.clone()));
        }
        let known = self.catalog.fields(&self.object)?;
        for field in levels.keys() {
            if !known.contains(field) {
                return Err(UpdateError::UnknownField {
                    object: self.object.clone(),
                    field: field.clone(),
                });
            }
        }

        let documents: Vec<DocumentId> = match &self.targets {
            Targets::All => self.catalog.permission_sets()?,
            Targets::Named(names) => names
                .iter()
                .map(|name| self.catalog.resolve_permission_set(name))
                .collect::<Result<_, _>>()?,
        };
        debug!(
            object = %self.object,
            fields = levels.len(),
            documents = documents.len(),
            "selection resolved"
        );
        Ok(Selection::new(self.object.clone(), levels, documents)?)
    }
}
