//! Line-by-line comparison of a document before and after an update.
//!
//! Uses the `similar` crate (Myers diff algorithm) to produce hunks with
//! context lines.

use std::fmt::{self, Write as _};

use perms_types::DocumentId;
use serde::Serialize;
use similar::{ChangeTag, TextDiff};

/// Unchanged lines kept around each change.
pub const CONTEXT_LINES: usize = 3;

/// The difference between a document's current and rewritten text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DocumentPreview {
    pub id: DocumentId,
    pub hunks: Vec<DiffHunk>,
    pub additions: usize,
    pub deletions: usize,
}

/// A contiguous region of changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiffHunk {
    /// First old line in this hunk (1-based).
    pub old_start: usize,
    pub old_count: usize,
    /// First new line in this hunk (1-based).
    pub new_start: usize,
    pub new_count: usize,
    pub lines: Vec<DiffLine>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum DiffLine {
    Context(String),
    Added(String),
    Removed(String),
}

impl DiffLine {
    fn marker(&self) -> char {
        match self {
            DiffLine::Context(_) => ' ',
            DiffLine::Added(_) => '+',
            DiffLine::Removed(_) => '-',
        }
    }

    pub fn text(&self) -> &str {
        match self {
            DiffLine::Context(t) | DiffLine::Added(t) | DiffLine::Removed(t) => t,
        }
    }
}

impl DocumentPreview {
    /// Returns `true` if the rewrite leaves the text unchanged.
    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }

    /// Render as a unified diff with `a/` and `b/` file headers.
    pub fn unified(&self) -> String {
        let mut out = String::new();
        if self.is_empty() {
            return out;
        }
        // Writing into a String cannot fail.
        let _ = writeln!(out, "--- a/{}", self.id);
        let _ = writeln!(out, "+++ b/{}", self.id);
        for hunk in &self.hunks {
            let _ = writeln!(out, "{hunk}");
            for line in &hunk.lines {
                let _ = writeln!(out, "{}{}", line.marker(), line.text());
            }
        }
        out
    }
}

impl fmt::Display for DiffHunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "@@ -{},{} +{},{} @@",
            self.old_start, self.old_count, self.new_start, self.new_count
        )
    }
}

/// Compare `old` and `new` text of document `id`.
///
/// Line terminators are stripped from the recorded lines, CRLF included.
pub fn preview(id: &DocumentId, old: &str, new: &str) -> DocumentPreview {
    let mut preview = DocumentPreview {
        id: id.clone(),
        hunks: Vec::new(),
        additions: 0,
        deletions: 0,
    };
    if old == new {
        return preview;
    }

    let text_diff = TextDiff::from_lines(old, new);
    for group in text_diff.grouped_ops(CONTEXT_LINES) {
        let Some(first) = group.first() else {
            continue;
        };
        let mut hunk = DiffHunk {
            old_start: first.old_range().start + 1,
            old_count: 0,
            new_start: first.new_range().start + 1,
            new_count: 0,
            lines: Vec::new(),
        };
        for op in &group {
            for change in text_diff.iter_changes(op) {
                let text = change.value().trim_end_matches(['\n', '\r']).to_string();
                match change.tag() {
                    ChangeTag::Equal => {
                        hunk.old_count += 1;
                        hunk.new_count += 1;
                        hunk.lines.push(DiffLine::Context(text));
                    }
                    ChangeTag::Delete => {
                        hunk.old_count += 1;
                        preview.deletions += 1;
                        hunk.lines.push(DiffLine::Removed(text));
                    }
                    ChangeTag::Insert => {
                        hunk.new_count += 1;
                        preview.additions += 1;
                        hunk.lines.push(DiffLine::Added(text));
                    }
                }
            }
        }
        preview.hunks.push(hunk);
    }
    preview
}
