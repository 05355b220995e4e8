//! Field-access collection maintenance for permission-set documents.
//!
//! A permission set keeps its field grants in repeated `fieldPermissions`
//! elements, sorted by qualified field name. This crate owns that one
//! collection inside an otherwise untouched [`perms_xml::Document`]:
//!
//! - [`FieldSet`] -- typed, validated view of the collection with exact
//!   lookup and sorted upsert
//! - [`ensure_collection`] -- attach an empty collection without moving any
//!   other key of the root
//! - [`apply`] -- merge a batch of `(field, level)` grants into a document
//!
//! # Invariants
//!
//! 1. Entries are unique by `field`.
//! 2. New entries are inserted at their ordinal sort position.
//! 3. Existing entries are updated in place; their other child elements are
//!    kept as they were.
//! 4. `editable` is never set without `readable`.

pub mod apply;
pub mod error;
pub mod set;

pub use apply::{apply, ensure_collection, ApplySummary, PERMISSION_SET_ROOT};
pub use error::{FieldSetError, FieldSetResult};
pub use set::{FieldSet, Upsert, FIELD_PERMISSIONS_KEY};
