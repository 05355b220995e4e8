//! Order-preserving XML document model for perms.
//!
//! Permission-set metadata is free-form XML of which perms only ever edits
//! one collection. This crate turns the raw text into a generic keyed tree
//! that keeps every other element, in its original order, and writes it back
//! in the formatting style the file already used.
//!
//! # Model
//!
//! A [`Document`] is an ordered [`Mapping`] of keys to [`Value`]s, where a
//! value is a scalar, a sequence, or a nested mapping:
//!
//! - element text becomes a [`Value::Scalar`]
//! - an element with children becomes a [`Value::Mapping`]
//! - repeated sibling elements are grouped into a [`Value::Sequence`] at the
//!   position of the first occurrence
//! - attributes are keys prefixed with [`ATTRIBUTE_PREFIX`]
//! - text next to attributes or children is stored under [`TEXT_KEY`]
//! - the XML declaration is stored under [`DECLARATION_KEY`]
//!
//! # Codec
//!
//! - [`parse`] -- text to [`Document`]
//! - [`serialize`] -- [`Document`] to text using a sniffed [`Formatting`]
//!
//! Comments and processing instructions other than the declaration are not
//! retained.

pub mod error;
pub mod read;
pub mod sniff;
pub mod value;
pub mod write;

pub use error::{XmlError, XmlResult};
pub use read::parse;
pub use sniff::{sniff_indent, Formatting, LineEnding, DEFAULT_INDENT};
pub use value::{Document, Mapping, Value, ATTRIBUTE_PREFIX, DECLARATION_KEY, TEXT_KEY};
pub use write::serialize;
