//! Document storage and project layout for perms.
//!
//! Permission sets live as one XML file per set under a project directory
//! (`force-app/main/default/permissionsets/*.permissionset-meta.xml`), and
//! the fields that may be granted are discovered from
//! `objects/<Object>/fields/*.field-meta.xml`.
//!
//! # Storage Backends
//!
//! All backends implement the [`DocumentStore`] trait:
//!
//! - [`FsDocumentStore`] -- one file per document under a directory
//! - [`InMemoryDocumentStore`] -- `BTreeMap`-based store for tests
//!
//! # Design Rules
//!
//! 1. A document is read whole and written whole; there is no partial update.
//! 2. Writes overwrite in place. They are not atomic: a crash mid-write can
//!    leave a truncated file. There is no temp-file-and-rename step.
//! 3. No locks are taken. Two concurrent runs against the same file race,
//!    and the last writer wins.
//! 4. Document ids are plain file names and can never address a path
//!    outside the document directory.
//!
//! # Discovery
//!
//! [`ProjectCatalog`] lists permission sets, objects, and fields, and raises
//! [`StoreError::DirectoryNotFound`] / [`StoreError::DirectoryEmpty`] before
//! any update runs. [`PermsConfig`] resolves where those directories are.

pub mod catalog;
pub mod config;
pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

pub use catalog::ProjectCatalog;
pub use config::{ConfigOverrides, PermsConfig, DEFAULT_BASE_DIRECTORY, DEFAULT_CONFIG_FILE};
pub use error::{ConfigError, StoreError, StoreResult};
pub use fs::FsDocumentStore;
pub use memory::InMemoryDocumentStore;
pub use traits::DocumentStore;
