//! The generic keyed tree behind a parsed document.

use crate::error::{XmlError, XmlResult};

/// Prefix marking a mapping key as an XML attribute.
pub const ATTRIBUTE_PREFIX: &str = "@_";

/// Key holding element text that sits next to attributes or children.
pub const TEXT_KEY: &str = "#text";

/// Key holding the `<?xml ... ?>` declaration.
pub const DECLARATION_KEY: &str = "?xml";

/// A node in the document tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// Element text or attribute value.
    Scalar(String),
    /// Repeated sibling elements sharing one name.
    Sequence(Vec<Value>),
    /// Element with attributes and/or child elements.
    Mapping(Mapping),
}

impl Value {
    pub fn scalar(text: impl Into<String>) -> Self {
        Self::Scalar(text.into())
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Self::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match self {
            Self::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Sequence(_) => "sequence",
            Self::Mapping(_) => "mapping",
        }
    }
}

/// Insertion-ordered string-keyed map.
///
/// Keys are unique. Lookups are linear; element mappings in metadata files
/// are small.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Mapping {
    entries: Vec<(String, Value)>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Replace the value under `key` in place, or append it at the end.
    /// Returns the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        match self.position(&key) {
            Some(idx) => Some(std::mem::replace(&mut self.entries[idx].1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Insert a new key at `index` (clamped to the length). Replaces in place
    /// without moving if the key already exists.
    pub fn insert_at(&mut self, index: usize, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        if let Some(idx) = self.position(&key) {
            return Some(std::mem::replace(&mut self.entries[idx].1, value));
        }
        let index = index.min(self.entries.len());
        self.entries.insert(index, (key, value));
        None
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Append a child element, grouping repeats of the same name into a
    /// sequence that stays at the first occurrence's position.
    pub(crate) fn push_child(&mut self, key: String, value: Value) {
        match self.get_mut(&key) {
            Some(Value::Sequence(items)) => items.push(value),
            Some(existing) => {
                let first = std::mem::replace(existing, Value::Sequence(Vec::new()));
                *existing = Value::Sequence(vec![first, value]);
            }
            None => self.entries.push((key, value)),
        }
    }
}

impl FromIterator<(String, Value)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut mapping = Mapping::new();
        for (k, v) in iter {
            mapping.insert(k, v);
        }
        mapping
    }
}

/// A parsed document: the top-level mapping holding the declaration and the
/// single root element.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Document {
    top: Mapping,
}

impl Document {
    pub fn new(top: Mapping) -> Self {
        Self { top }
    }

    /// All top-level entries, declaration included.
    pub fn top(&self) -> &Mapping {
        &self.top
    }

    /// Name of the root element.
    pub fn root_name(&self) -> Option<&str> {
        self.top.keys().find(|k| !k.starts_with('?'))
    }

    pub fn root(&self) -> Option<&Value> {
        let name = self.root_name()?;
        self.top.get(name)
    }

    /// Mutable access to the root element's mapping.
    ///
    /// An empty root element (`<PermissionSet/>`) parses as an empty scalar;
    /// it is promoted to an empty mapping here so children can be attached.
    pub fn root_mapping_mut(&mut self) -> XmlResult<&mut Mapping> {
        let name = self.root_name().ok_or(XmlError::NoRoot)?.to_string();
        let root = self.top.get_mut(&name).ok_or(XmlError::NoRoot)?;
        if let Value::Scalar(text) = &*root {
            if !text.trim().is_empty() {
                return Err(XmlError::RootNotElement(name));
            }
            *root = Value::Mapping(Mapping::new());
        }
        match root {
            Value::Mapping(m) => Ok(m),
            _ => Err(XmlError::RootNotElement(name)),
        }
    }
}
