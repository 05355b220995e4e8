//! The selection handed from the prompt/CLI layer to the batch updater.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::access::AccessLevel;
use crate::error::{TypeError, TypeResult};

/// Identifier of one permission-set document: its file name.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId(String);

impl DocumentId {
    /// Create an id, rejecting anything that could escape the document
    /// directory.
    pub fn new(name: impl Into<String>) -> TypeResult<Self> {
        let name = name.into();
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains('/')
            || name.contains('\\')
            || name.contains('\0')
        {
            return Err(TypeError::InvalidDocumentId(name));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display title: the file name up to its first `.`.
    pub fn title(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DocumentId {
    type Error = TypeError;

    fn try_from(value: String) -> TypeResult<Self> {
        Self::new(value)
    }
}

impl From<DocumentId> for String {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}

/// Unvalidated selection as produced by a prompt or flag parser.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSelection {
    pub target_documents: Vec<String>,
    pub target_object: String,
    pub field_levels: BTreeMap<String, String>,
}

/// Validated, immutable selection driving one batch update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    target_object: String,
    field_levels: BTreeMap<String, AccessLevel>,
    target_documents: Vec<DocumentId>,
}

impl Selection {
    pub fn new(
        target_object: impl Into<String>,
        field_levels: BTreeMap<String, AccessLevel>,
        target_documents: Vec<DocumentId>,
    ) -> TypeResult<Self> {
        let target_object = target_object.into();
        validate_name(&target_object)?;
        if field_levels.is_empty() {
            return Err(TypeError::EmptySelection("no fields selected"));
        }
        for field in field_levels.keys() {
            validate_name(field)?;
        }
        if target_documents.is_empty() {
            return Err(TypeError::EmptySelection("no permission sets selected"));
        }
        let mut seen = BTreeSet::new();
        let mut target_documents = target_documents;
        target_documents.retain(|id| seen.insert(id.clone()));
        Ok(Self {
            target_object,
            field_levels,
            target_documents,
        })
    }

    pub fn target_object(&self) -> &str {
        &self.target_object
    }

    pub fn field_levels(&self) -> &BTreeMap<String, AccessLevel> {
        &self.field_levels
    }

    pub fn target_documents(&self) -> &[DocumentId] {
        &self.target_documents
    }
}

impl TryFrom<RawSelection> for Selection {
    type Error = TypeError;

    /// Every level is checked before anything else, so an unknown symbol
    /// rejects the whole selection up front.
    fn try_from(raw: RawSelection) -> TypeResult<Self> {
        let field_levels = raw
            .field_levels
            .into_iter()
            .map(|(field, level)| Ok((field, level.parse::<AccessLevel>()?)))
            .collect::<TypeResult<BTreeMap<_, _>>>()?;
        let documents = raw
            .target_documents
            .into_iter()
            .map(DocumentId::new)
            .collect::<TypeResult<Vec<_>>>()?;
        Self::new(raw.target_object, field_levels, documents)
    }
}

fn validate_name(name: &str) -> TypeResult<()> {
    if name.is_empty() || name.contains('.') || name.chars().any(char::is_whitespace) {
        return Err(TypeError::InvalidFieldName(name.to_string()));
    }
    Ok(())
}
