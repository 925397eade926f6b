//! Field selectors used when registering rules and filters.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationFailure;

/// A single field name or an ordered list of field names
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Field {
    Name(String),
    Names(Vec<String>),
}

impl Field {
    /// Returns the single name, or `None` for a list selector.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Field::Name(name) => Some(name),
            Field::Names(_) => None,
        }
    }

    /// Field names in selector order.
    pub fn names(&self) -> Vec<&str> {
        match self {
            Field::Name(name) => vec![name.as_str()],
            Field::Names(names) => names.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Field::Names(_))
    }

    /// Wraps a single name into a one-element list; lists are returned unchanged.
    pub fn into_list(self) -> Field {
        match self {
            Field::Name(name) => Field::Names(vec![name]),
            list => list,
        }
    }

    /// True when the selector names at least one field and no name is blank.
    pub fn is_well_formed(&self) -> bool {
        match self {
            Field::Name(name) => !name.is_empty(),
            Field::Names(names) => !names.is_empty() && names.iter().all(|n| !n.is_empty()),
        }
    }

    /// Whether a message recorded against this selector belongs to `name`.
    pub fn matches(&self, name: &str) -> bool {
        matches!(self, Field::Name(own) if own == name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Name(name) => f.write_str(name),
            Field::Names(names) => f.write_str(&names.join(", ")),
        }
    }
}

impl From<&str> for Field {
    fn from(name: &str) -> Self {
        Field::Name(name.to_string())
    }
}

impl From<String> for Field {
    fn from(name: String) -> Self {
        Field::Name(name)
    }
}

impl From<&String> for Field {
    fn from(name: &String) -> Self {
        Field::Name(name.clone())
    }
}

impl From<Vec<String>> for Field {
    fn from(names: Vec<String>) -> Self {
        Field::Names(names)
    }
}

impl From<Vec<&str>> for Field {
    fn from(names: Vec<&str>) -> Self {
        Field::Names(names.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Field {
    fn from(names: [&str; N]) -> Self {
        Field::Names(names.iter().map(|n| n.to_string()).collect())
    }
}

impl From<&Field> for Field {
    fn from(field: &Field) -> Self {
        field.clone()
    }
}

/// Selectors coming from dynamic input (e.g. a JSON rule table).
impl TryFrom<Value> for Field {
    type Error = ValidationFailure;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(name) => Ok(Field::Name(name)),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(name) => Ok(name),
                    _ => Err(ValidationFailure::field_selector()),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Field::Names),
            _ => Err(ValidationFailure::field_selector()),
        }
    }
}
