//! Text to [`Document`], built on `quick-xml`'s pull reader.

use quick_xml::events::{BytesDecl, BytesStart, Event};
use quick_xml::Reader;
use tracing::trace;

use crate::error::{XmlError, XmlResult};
use crate::value::{Document, Mapping, Value, ATTRIBUTE_PREFIX, DECLARATION_KEY, TEXT_KEY};

/// An element under construction.
struct Frame {
    name: String,
    children: Mapping,
    text: String,
    has_elements: bool,
}

impl Frame {
    fn open(start: &BytesStart<'_>, position: usize) -> XmlResult<Self> {
        let name = utf8(start.name().as_ref(), position)?;
        let mut children = Mapping::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| malformed(position, e))?;
            let key = utf8(attr.key.as_ref(), position)?;
            let value = attr.unescape_value().map_err(|e| malformed(position, e))?;
            children.insert(
                format!("{ATTRIBUTE_PREFIX}{key}"),
                Value::Scalar(value.into_owned()),
            );
        }
        Ok(Self {
            name,
            children,
            text: String::new(),
            has_elements: false,
        })
    }

    /// Leaf text is kept verbatim. Next to child elements it is layout or
    /// mixed content, and only its trimmed remainder is kept.
    fn close(self) -> (String, Value) {
        let text = if self.has_elements {
            self.text.trim().to_string()
        } else {
            self.text
        };
        let value = if self.children.is_empty() {
            Value::Scalar(text)
        } else {
            let mut children = self.children;
            if !text.is_empty() {
                children.insert(TEXT_KEY, Value::Scalar(text));
            }
            Value::Mapping(children)
        };
        (self.name, value)
    }
}

/// Parse document text into an order-preserving tree.
///
/// Text of elements without child elements is kept exactly, whitespace,
/// character references and CDATA included. Fails on any well-formedness
/// error, on a document without a root element, and on a second root
/// element.
pub fn parse(text: &str) -> XmlResult<Document> {
    let mut reader = Reader::from_str(text);

    let mut top = Mapping::new();
    let mut root_name: Option<String> = None;
    let mut stack: Vec<Frame> = Vec::new();

    loop {
        let position = reader.buffer_position();
        let event = reader.read_event().map_err(|e| malformed(position, e))?;
        match event {
            Event::Decl(decl) => {
                top.insert(DECLARATION_KEY, Value::Mapping(declaration(&decl, position)?));
            }
            Event::Start(start) => {
                stack.push(Frame::open(&start, position)?);
            }
            Event::Empty(start) => {
                let frame = Frame::open(&start, position)?;
                attach(frame, &mut stack, &mut top, &mut root_name)?;
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| malformed(position, "unexpected closing tag"))?;
                attach(frame, &mut stack, &mut top, &mut root_name)?;
            }
            Event::Text(t) => {
                let content = t.unescape().map_err(|e| malformed(position, e))?;
                push_text(&mut stack, &content, position)?;
            }
            Event::CData(c) => {
                let raw = c.into_inner();
                let content = utf8(&raw, position)?;
                push_text(&mut stack, &content, position)?;
            }
            Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
            Event::Eof => break,
        }
    }

    if let Some(open) = stack.last() {
        return Err(malformed(
            text.len(),
            format!("unclosed element <{}>", open.name),
        ));
    }
    if root_name.is_none() {
        return Err(XmlError::NoRoot);
    }
    trace!(keys = top.len(), "parsed document");
    Ok(Document::new(top))
}

fn attach(
    frame: Frame,
    stack: &mut [Frame],
    top: &mut Mapping,
    root_name: &mut Option<String>,
) -> XmlResult<()> {
    let (name, value) = frame.close();
    match stack.last_mut() {
        Some(parent) => {
            parent.has_elements = true;
            parent.children.push_child(name, value);
        }
        None => {
            if let Some(first) = root_name {
                return Err(XmlError::MultipleRoots {
                    first: first.clone(),
                    second: name,
                });
            }
            *root_name = Some(name.clone());
            top.insert(name, value);
        }
    }
    Ok(())
}

fn push_text(stack: &mut [Frame], content: &str, position: usize) -> XmlResult<()> {
    match stack.last_mut() {
        Some(frame) => {
            frame.text.push_str(content);
            Ok(())
        }
        None if content.trim().is_empty() => Ok(()),
        None => Err(malformed(position, "text outside the root element")),
    }
}

fn declaration(decl: &BytesDecl<'_>, position: usize) -> XmlResult<Mapping> {
    let mut attrs = Mapping::new();
    let version = decl.version().map_err(|e| malformed(position, e))?;
    attrs.insert(
        format!("{ATTRIBUTE_PREFIX}version"),
        Value::Scalar(utf8(&version, position)?),
    );
    if let Some(encoding) = decl.encoding() {
        let encoding = encoding.map_err(|e| malformed(position, e))?;
        attrs.insert(
            format!("{ATTRIBUTE_PREFIX}encoding"),
            Value::Scalar(utf8(&encoding, position)?),
        );
    }
    if let Some(standalone) = decl.standalone() {
        let standalone = standalone.map_err(|e| malformed(position, e))?;
        attrs.insert(
            format!("{ATTRIBUTE_PREFIX}standalone"),
            Value::Scalar(utf8(&standalone, position)?),
        );
    }
    Ok(attrs)
}

fn utf8(bytes: &[u8], position: usize) -> XmlResult<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| malformed(position, e))
}

fn malformed(position: usize, reason: impl std::fmt::Display) -> XmlError {
    XmlError::Malformed {
        position,
        reason: reason.to_string(),
    }
}
