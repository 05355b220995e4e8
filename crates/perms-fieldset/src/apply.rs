//! Merging a batch of field grants into one document.

use std::collections::BTreeMap;

use perms_types::{qualify, AccessLevel};
use perms_xml::{Document, Mapping, Value, ATTRIBUTE_PREFIX, TEXT_KEY};
use tracing::{debug, warn};

use crate::error::{FieldSetError, FieldSetResult};
use crate::set::{FieldSet, Upsert, FIELD_PERMISSIONS_KEY};

/// Expected root element of a permission-set document.
pub const PERMISSION_SET_ROOT: &str = "PermissionSet";

/// Counts of what [`apply`] did to one document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApplySummary {
    /// The collection did not exist and was attached.
    pub created_collection: bool,
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Entries in the collection afterwards.
    pub total: usize,
}

impl ApplySummary {
    /// Whether any entry was added or changed.
    pub fn changed(&self) -> bool {
        self.inserted > 0 || self.updated > 0
    }
}

/// Attach an empty collection under `root` if there is none.
///
/// The new key goes before the first element key that sorts after it, or at
/// the end. No existing key moves. Returns `true` if a collection was added.
pub fn ensure_collection(root: &mut Mapping) -> bool {
    if root.contains_key(FIELD_PERMISSIONS_KEY) {
        return false;
    }
    let index = root
        .keys()
        .position(|k| !k.starts_with(ATTRIBUTE_PREFIX) && k != TEXT_KEY && k > FIELD_PERMISSIONS_KEY)
        .unwrap_or(root.len());
    root.insert_at(index, FIELD_PERMISSIONS_KEY, Value::Sequence(Vec::new()));
    true
}

/// Upsert `object.field` at the given level for every pair in `levels`.
///
/// The document is validated before anything is changed; on error it is
/// left as it was.
pub fn apply(
    doc: &mut Document,
    object: &str,
    levels: &BTreeMap<String, AccessLevel>,
) -> FieldSetResult<ApplySummary> {
    match doc.root_name() {
        Some(PERMISSION_SET_ROOT) => {}
        Some(other) => return Err(FieldSetError::UnexpectedRoot(other.to_string())),
        None => return Err(FieldSetError::Xml(perms_xml::XmlError::NoRoot)),
    }
    let root = doc.root_mapping_mut()?;
    let mut set = FieldSet::load(root)?;
    if !set.is_sorted() {
        warn!(
            entries = set.len(),
            "fieldPermissions is not sorted; keeping existing order"
        );
    }

    let mut summary = ApplySummary {
        created_collection: ensure_collection(root),
        ..ApplySummary::default()
    };
    for (field, level) in levels {
        let key = qualify(object, field);
        match set.upsert(&key, level.flags()) {
            Upsert::Inserted { index } => {
                debug!(field = %key, %level, index, "inserted field permission");
                summary.inserted += 1;
            }
            Upsert::Updated => {
                debug!(field = %key, %level, "updated field permission");
                summary.updated += 1;
            }
            Upsert::Unchanged => summary.unchanged += 1,
        }
    }
    set.store(root);
    summary.total = set.len();
    Ok(summary)
}
