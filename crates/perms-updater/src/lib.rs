//! Batch updater for permission-set field grants.
//!
//! One [`Selection`](perms_types::Selection) (an object, its field levels,
//! and the permission sets to touch) is applied to every selected document
//! concurrently. Each document is read, parsed, updated and written back on
//! its own task:
//!
//! ```text
//! read -> sniff formatting -> parse -> upsert grants -> serialize -> write
//! ```
//!
//! A failure on one document never changes another, and documents already
//! written stay written. The [`BatchReport`] records the outcome of every
//! document and folds into the `{ success, errorMessage }` result.
//!
//! The store and the source of the selection are injected through
//! [`BatchUpdater::new`], so tests swap in an
//! [`InMemoryDocumentStore`](perms_store::InMemoryDocumentStore) and a fixed
//! [`StaticSelection`].

pub mod error;
pub mod provider;
pub mod report;
pub mod updater;

pub use error::{UpdateError, UpdateResult};
pub use provider::{SelectionProvider, StaticSelection};
pub use report::{BatchReport, DocumentOutcome, DocumentStatus, Status, UpdateSummary};
pub use updater::{update_document, BatchUpdater, UpdateMode};
