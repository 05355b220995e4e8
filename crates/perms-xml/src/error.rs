//! Error types for the XML codec.

/// Errors raised while parsing a document.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum XmlError {
    /// The text is not well-formed XML.
    #[error("malformed XML at byte {position}: {reason}")]
    Malformed { position: usize, reason: String },

    /// The document contains no element at all.
    #[error("document has no root element")]
    NoRoot,

    /// More than one top-level element.
    #[error("document has more than one root element: {first} and {second}")]
    MultipleRoots { first: String, second: String },

    /// The root element carries text instead of child elements.
    #[error("root element {0} has text content instead of child elements")]
    RootNotElement(String),
}

/// Convenience alias for codec results.
pub type XmlResult<T> = Result<T, XmlError>;
