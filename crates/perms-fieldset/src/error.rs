use perms_xml::XmlError;
use thiserror::Error;

/// Reasons a document's field-access collection cannot be maintained.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldSetError {
    #[error("expected a <PermissionSet> root element, found <{0}>")]
    UnexpectedRoot(String),

    #[error("fieldPermissions is a {0}, not a list of entries")]
    NotACollection(&'static str),

    #[error("fieldPermissions entry #{index} has no <field>")]
    MissingField { index: usize },

    #[error("fieldPermissions entry {field}: <{key}> is {value:?}, expected true or false")]
    InvalidBoolean {
        field: String,
        key: &'static str,
        value: String,
    },

    #[error("fieldPermissions lists {0} more than once")]
    DuplicateField(String),

    #[error(transparent)]
    Xml(#[from] XmlError),
}

pub type FieldSetResult<T> = Result<T, FieldSetError>;
