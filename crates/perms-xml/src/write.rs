//! [`Document`] back to text.

use quick_xml::escape::{escape, partial_escape};

use crate::sniff::Formatting;
use crate::value::{Document, Mapping, Value, ATTRIBUTE_PREFIX, DECLARATION_KEY, TEXT_KEY};

/// Render a document with one element per line, indented by
/// `formatting.indent`, ending with a line terminator.
///
/// Empty sequences produce no output, so an unused collection disappears.
pub fn serialize(doc: &Document, formatting: &Formatting) -> String {
    let mut out = Writer {
        buf: String::new(),
        formatting,
    };
    for (key, value) in doc.top().iter() {
        if key == DECLARATION_KEY {
            out.declaration(value);
        } else if !key.starts_with('?') {
            out.element(key, value, 0);
        }
    }
    out.buf
}

struct Writer<'a> {
    buf: String,
    formatting: &'a Formatting,
}

impl Writer<'_> {
    fn newline(&mut self) {
        self.buf.push_str(self.formatting.line_ending.as_str());
    }

    fn indent(&mut self, depth: usize) {
        for _ in 0..depth {
            self.buf.push_str(&self.formatting.indent);
        }
    }

    fn declaration(&mut self, value: &Value) {
        self.buf.push_str("<?xml");
        if let Value::Mapping(attrs) = value {
            self.attributes(attrs);
        }
        self.buf.push_str("?>");
        self.newline();
    }

    fn attributes(&mut self, mapping: &Mapping) {
        for (key, value) in mapping.iter() {
            let (Some(name), Value::Scalar(text)) = (key.strip_prefix(ATTRIBUTE_PREFIX), value)
            else {
                continue;
            };
            self.buf.push(' ');
            self.buf.push_str(name);
            self.buf.push_str("=\"");
            self.buf.push_str(&escape(text.as_str()));
            self.buf.push('"');
        }
    }

    fn element(&mut self, name: &str, value: &Value, depth: usize) {
        match value {
            Value::Sequence(items) => {
                for item in items {
                    self.element(name, item, depth);
                }
            }
            Value::Scalar(text) => {
                self.indent(depth);
                self.open_tag(name, None);
                self.buf.push_str(&partial_escape(text.as_str()));
                self.close_tag(name);
                self.newline();
            }
            Value::Mapping(mapping) => self.mapping_element(name, mapping, depth),
        }
    }

    fn mapping_element(&mut self, name: &str, mapping: &Mapping, depth: usize) {
        let text = mapping.get(TEXT_KEY).and_then(Value::as_scalar);
        let has_children = mapping
            .keys()
            .any(|k| !k.starts_with(ATTRIBUTE_PREFIX) && k != TEXT_KEY);

        self.indent(depth);
        if !has_children {
            match text {
                Some(text) => {
                    self.open_tag(name, Some(mapping));
                    self.buf.push_str(&partial_escape(text));
                    self.close_tag(name);
                }
                None => {
                    self.buf.push('<');
                    self.buf.push_str(name);
                    self.attributes(mapping);
                    self.buf.push_str("/>");
                }
            }
            self.newline();
            return;
        }

        self.open_tag(name, Some(mapping));
        self.newline();
        // Beside child elements only trimmed text survives a re-parse.
        if let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) {
            self.indent(depth + 1);
            self.buf.push_str(&partial_escape(text));
            self.newline();
        }
        for (key, child) in mapping.iter() {
            if key.starts_with(ATTRIBUTE_PREFIX) || key == TEXT_KEY {
                continue;
            }
            self.element(key, child, depth + 1);
        }
        self.indent(depth);
        self.close_tag(name);
        self.newline();
    }

    fn open_tag(&mut self, name: &str, attrs: Option<&Mapping>) {
        self.buf.push('<');
        self.buf.push_str(name);
        if let Some(attrs) = attrs {
            self.attributes(attrs);
        }
        self.buf.push('>');
    }

    fn close_tag(&mut self, name: &str) {
        self.buf.push_str("</");
        self.buf.push_str(name);
        self.buf.push('>');
    }
}
