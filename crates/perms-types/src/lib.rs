//! Foundation types for perms.
//!
//! This crate provides the value types shared by every other perms crate:
//! the symbolic access level a user asks for, the two boolean flags stored
//! per field in a permission set, and the immutable selection that drives a
//! batch update.
//!
//! # Key Types
//!
//! - [`AccessLevel`] -- `none` / `read` / `read_edit`
//! - [`AccessFlags`] -- the `(readable, editable)` pair stored per field
//! - [`AccessEntry`] -- one `fieldPermissions` record keyed by qualified field
//! - [`Selection`] -- object, per-field levels, and target documents
//! - [`DocumentId`] -- file name of a permission-set document

pub mod access;
pub mod error;
pub mod selection;

pub use access::{qualify, to_flags, AccessEntry, AccessFlags, AccessLevel};
pub use error::{TypeError, TypeResult};
pub use selection::{DocumentId, RawSelection, Selection};
