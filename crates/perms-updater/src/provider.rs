use perms_types::{RawSelection, Selection};

use crate::error::UpdateResult;

/// Source of the selection a [`BatchUpdater`](crate::BatchUpdater) applies.
///
/// The command line implements this over its flags; tests hand in a fixed
/// selection.
pub trait SelectionProvider: Send + Sync {
    fn select(&self) -> UpdateResult<Selection>;
}

/// A selection that was decided up front.
#[derive(Clone, Debug)]
pub struct StaticSelection(pub Selection);

impl SelectionProvider for StaticSelection {
    fn select(&self) -> UpdateResult<Selection> {
        Ok(self.0.clone())
    }
}

/// Validates on every call, so an unknown access level is reported before
/// any document is touched.
impl SelectionProvider for RawSelection {
    fn select(&self) -> UpdateResult<Selection> {
        Ok(Selection::try_from(self.clone())?)
    }
}
