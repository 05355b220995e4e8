//! Formatting detection, so rewritten files keep their original style.

/// Indent unit used when a document has no indented line.
pub const DEFAULT_INDENT: &str = "  ";

/// Line terminator style of a document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

/// How a document is laid out on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Formatting {
    /// One level of indentation (e.g. four spaces, one tab).
    pub indent: String,
    pub line_ending: LineEnding,
}

impl Default for Formatting {
    fn default() -> Self {
        Self {
            indent: DEFAULT_INDENT.to_string(),
            line_ending: LineEnding::Lf,
        }
    }
}

impl Formatting {
    /// Detect indentation and line endings from raw text. Never fails.
    pub fn sniff(text: &str) -> Self {
        let line_ending = match text.find('\n') {
            Some(idx) if idx > 0 && text.as_bytes()[idx - 1] == b'\r' => LineEnding::CrLf,
            _ => LineEnding::Lf,
        };
        Self {
            indent: sniff_indent(text),
            line_ending,
        }
    }
}

/// Return the leading spaces/tabs of the first indented line.
///
/// Whitespace-only lines are skipped. Falls back to [`DEFAULT_INDENT`].
pub fn sniff_indent(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let width = line
                .bytes()
                .take_while(|b| *b == b' ' || *b == b'\t')
                .count();
            &line[..width]
        })
        .find(|indent| !indent.is_empty())
        .unwrap_or(DEFAULT_INDENT)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_spaces() {
        let text = "<?xml version=\"1.0\"?>\n<A>\n    <b>1</b>\n        <c/>\n</A>\n";
        assert_eq!(sniff_indent(text), "    ");
    }

    #[test]
    fn tabs() {
        assert_eq!(sniff_indent("<A>\n\t<b>1</b>\n</A>"), "\t");
    }

    #[test]
    fn default_when_flat() {
        assert_eq!(sniff_indent("<A><b>1</b></A>"), DEFAULT_INDENT);
        assert_eq!(sniff_indent(""), DEFAULT_INDENT);
    }

    #[test]
    fn whitespace_only_lines_ignored() {
        assert_eq!(sniff_indent("<A>\n   \n\t<b/>\n</A>"), "\t");
    }

    #[test]
    fn crlf_detected() {
        let f = Formatting::sniff("<A>\r\n  <b/>\r\n</A>\r\n");
        assert_eq!(f.line_ending, LineEnding::CrLf);
        assert_eq!(f.indent, "  ");
    }

    #[test]
    fn lf_by_default() {
        assert_eq!(Formatting::sniff("<A/>").line_ending, LineEnding::Lf);
        assert_eq!(Formatting::sniff("<A>\n</A>").line_ending, LineEnding::Lf);
    }
}
