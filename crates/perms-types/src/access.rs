//! Access levels and the flags they map to.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{TypeError, TypeResult};

/// Symbolic access level requested for a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    /// Neither readable nor editable.
    None,
    /// Readable, not editable.
    Read,
    /// Readable and editable.
    ReadEdit,
}

impl AccessLevel {
    /// All levels, in the order they are offered to users.
    pub const ALL: [AccessLevel; 3] = [Self::Read, Self::ReadEdit, Self::None];

    /// The stored `(readable, editable)` pair for this level.
    pub fn flags(self) -> AccessFlags {
        match self {
            Self::None => AccessFlags::new(false, false),
            Self::Read => AccessFlags::new(true, false),
            Self::ReadEdit => AccessFlags::new(true, true),
        }
    }

    /// The symbol used on the command line and in serialized selections.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Read => "read",
            Self::ReadEdit => "read_edit",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = TypeError;

    fn from_str(s: &str) -> TypeResult<Self> {
        match s {
            "none" => Ok(Self::None),
            "read" => Ok(Self::Read),
            "read_edit" => Ok(Self::ReadEdit),
            other => Err(TypeError::InvalidAccessLevel(other.to_string())),
        }
    }
}

/// Parse a level symbol and map it to flags in one step.
pub fn to_flags(level: &str) -> TypeResult<AccessFlags> {
    level.parse::<AccessLevel>().map(AccessLevel::flags)
}

/// The two booleans stored per field access entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessFlags {
    pub readable: bool,
    pub editable: bool,
}

impl AccessFlags {
    pub fn new(readable: bool, editable: bool) -> Self {
        Self { readable, editable }
    }

    /// `editable` implies `readable`.
    pub fn is_consistent(&self) -> bool {
        !self.editable || self.readable
    }

    /// The level these flags correspond to, if they are consistent.
    pub fn level(&self) -> Option<AccessLevel> {
        match (self.readable, self.editable) {
            (false, false) => Some(AccessLevel::None),
            (true, false) => Some(AccessLevel::Read),
            (true, true) => Some(AccessLevel::ReadEdit),
            (false, true) => None,
        }
    }
}

/// Join an object and a field into the `Object.Field` key used by entries.
pub fn qualify(object: &str, field: &str) -> String {
    format!("{object}.{field}")
}

/// One field's access record inside a permission set.
///
/// Entries order by `field` using ordinal (byte-wise) comparison, then by
/// flags.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessEntry {
    /// Qualified key `Object.Field`.
    pub field: String,
    pub readable: bool,
    pub editable: bool,
}

impl AccessEntry {
    pub fn new(field: impl Into<String>, flags: AccessFlags) -> Self {
        Self {
            field: field.into(),
            readable: flags.readable,
            editable: flags.editable,
        }
    }

    pub fn flags(&self) -> AccessFlags {
        AccessFlags::new(self.readable, self.editable)
    }

    /// Overwrite both flags. Returns `true` if anything changed.
    pub fn set_flags(&mut self, flags: AccessFlags) -> bool {
        let changed = self.flags() != flags;
        self.readable = flags.readable;
        self.editable = flags.editable;
        changed
    }
}

impl PartialOrd for AccessEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AccessEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.field
            .as_bytes()
            .cmp(other.field.as_bytes())
            .then_with(|| self.readable.cmp(&other.readable))
            .then_with(|| self.editable.cmp(&other.editable))
    }
}
