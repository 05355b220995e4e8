//! The sorted `fieldPermissions` collection of one document.

use std::cmp::Ordering;
use std::collections::HashSet;

use perms_types::{AccessEntry, AccessFlags};
use perms_xml::{Mapping, Value};

use crate::error::{FieldSetError, FieldSetResult};

/// Root key under which field grants live.
pub const FIELD_PERMISSIONS_KEY: &str = "fieldPermissions";

const FIELD: &str = "field";
const READABLE: &str = "readable";
const EDITABLE: &str = "editable";

/// What an [`FieldSet::upsert`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Upsert {
    /// A new entry was placed at `index`.
    Inserted { index: usize },
    /// An existing entry's flags changed.
    Updated,
    /// An existing entry already had these flags.
    Unchanged,
}

/// An entry plus the element it was read from, so unknown child elements
/// survive a rewrite.
#[derive(Clone, Debug)]
struct Slot {
    entry: AccessEntry,
    node: Mapping,
}

impl Slot {
    fn fresh(entry: AccessEntry) -> Self {
        let mut node = Mapping::new();
        node.insert(EDITABLE, Value::scalar(entry.editable.to_string()));
        node.insert(FIELD, Value::scalar(entry.field.clone()));
        node.insert(READABLE, Value::scalar(entry.readable.to_string()));
        Self { entry, node }
    }

    fn to_value(&self) -> Value {
        let mut node = self.node.clone();
        node.insert(EDITABLE, Value::scalar(self.entry.editable.to_string()));
        node.insert(READABLE, Value::scalar(self.entry.readable.to_string()));
        Value::Mapping(node)
    }
}

/// Typed view of a document's field-access collection.
///
/// Exclusive to one document update; never shared between tasks.
#[derive(Clone, Debug, Default)]
pub struct FieldSet {
    slots: Vec<Slot>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and validate the collection under `root`.
    ///
    /// An absent collection is empty. A single `fieldPermissions` element
    /// counts as a one-entry list. Every entry must name its field, carry
    /// `true`/`false` flags (missing flags read as `false`), and be unique.
    pub fn load(root: &Mapping) -> FieldSetResult<Self> {
        let items: Vec<&Value> = match root.get(FIELD_PERMISSIONS_KEY) {
            None => Vec::new(),
            Some(Value::Sequence(items)) => items.iter().collect(),
            Some(v @ Value::Mapping(_)) => vec![v],
            Some(Value::Scalar(text)) if text.trim().is_empty() => {
                return Err(FieldSetError::MissingField { index: 0 })
            }
            Some(other) => return Err(FieldSetError::NotACollection(other.kind())),
        };

        let mut seen = HashSet::with_capacity(items.len());
        let mut slots = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let node = item
                .as_mapping()
                .ok_or(FieldSetError::MissingField { index })?;
            let field = node
                .get(FIELD)
                .and_then(Value::as_scalar)
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .ok_or(FieldSetError::MissingField { index })?
                .to_string();
            if !seen.insert(field.clone()) {
                return Err(FieldSetError::DuplicateField(field));
            }
            let readable = read_flag(node, &field, READABLE)?;
            let editable = read_flag(node, &field, EDITABLE)?;
            slots.push(Slot {
                entry: AccessEntry {
                    field,
                    readable,
                    editable,
                },
                node: node.clone(),
            });
        }
        Ok(Self { slots })
    }

    /// Write the collection back under `root`, replacing the existing value
    /// in place (or appending if the key is absent).
    pub fn store(&self, root: &mut Mapping) {
        let items = self.slots.iter().map(Slot::to_value).collect();
        root.insert(FIELD_PERMISSIONS_KEY, Value::Sequence(items));
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &AccessEntry> {
        self.slots.iter().map(|s| &s.entry)
    }

    /// Strictly ascending by ordinal field comparison.
    pub fn is_sorted(&self) -> bool {
        self.slots
            .windows(2)
            .all(|w| w[0].entry < w[1].entry)
    }

    /// Exact lookup by qualified field key.
    pub fn find_exact(&self, field: &str) -> Option<&AccessEntry> {
        self.position_exact(field).map(|idx| &self.slots[idx].entry)
    }

    fn position_exact(&self, field: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.entry.field == field)
    }

    /// Set the flags for `field`, inserting a sorted entry if it is absent.
    pub fn upsert(&mut self, field: &str, flags: AccessFlags) -> Upsert {
        debug_assert!(flags.is_consistent());
        if let Some(idx) = self.position_exact(field) {
            return if self.slots[idx].entry.set_flags(flags) {
                Upsert::Updated
            } else {
                Upsert::Unchanged
            };
        }
        let index = self.insert_sorted(AccessEntry::new(field, flags));
        Upsert::Inserted { index }
    }

    /// Insert at the binary-search position and return the index used.
    ///
    /// Callers check [`Self::find_exact`] first. Should an equal key be met
    /// anyway, the new entry goes before it rather than replacing it.
    fn insert_sorted(&mut self, entry: AccessEntry) -> usize {
        let index = self.insertion_point(&entry.field);
        self.slots.insert(index, Slot::fresh(entry));
        index
    }

    fn insertion_point(&self, field: &str) -> usize {
        // Half-open bracket [low, high) over the existing entries.
        let mut low = 0;
        let mut high = self.slots.len();
        while low < high {
            let mid = low + (high - low) / 2;
            match self.slots[mid].entry.field.as_str().cmp(field) {
                Ordering::Equal => return mid,
                Ordering::Less => low = mid + 1,
                Ordering::Greater => high = mid,
            }
        }
        low
    }
}

fn read_flag(node: &Mapping, field: &str, key: &'static str) -> FieldSetResult<bool> {
    let Some(value) = node.get(key) else {
        return Ok(false);
    };
    match value.as_scalar().map(str::trim) {
        Some("true") => Ok(true),
        Some("false") => Ok(false),
        other => Err(FieldSetError::InvalidBoolean {
            field: field.to_string(),
            key,
            value: other.unwrap_or(value.kind()).to_string(),
        }),
    }
}
