//! Dry-run previews for perms.
//!
//! When an update runs with `--dry-run`, nothing is written; instead the
//! rewritten text of each permission set is compared line by line with what
//! is on disk and shown as a unified diff.
//!
//! # Key Types
//!
//! - [`DocumentPreview`] -- the hunks for one document plus change counts
//! - [`DiffHunk`] / [`DiffLine`] -- a contiguous changed region and its lines

pub mod preview;

pub use preview::{preview, DiffHunk, DiffLine, DocumentPreview, CONTEXT_LINES};
