//! Entities and data sources that field values are read from.
//!
//! An entity exposes up to three capabilities, tried in a fixed order both for
//! reading and for writing filtered values back:
//!
//! 1. named accessors (`getFirstName` / `setFirstName`),
//! 2. a generic attribute reader/writer,
//! 3. public properties.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::error::{ValidationFailure, ValidationResult};

/// Capability set of an object whose values can be validated.
///
/// Every capability defaults to "not available". Implementors override only
/// what the underlying object supports.
pub trait Entity {
    /// Calls the accessor called `accessor` (e.g. `getFirstName`).
    ///
    /// `None` when the entity has no such accessor; `Some(Value::Null)` when it
    /// has one that yields nothing.
    fn call_getter(&self, _accessor: &str) -> Option<Value> {
        None
    }

    /// Calls the mutator called `mutator`. Returns `false` when it does not exist.
    fn call_setter(&mut self, _mutator: &str, _value: Value) -> bool {
        false
    }

    /// Whether the entity exposes generic attribute read/write.
    fn supports_attributes(&self) -> bool {
        false
    }

    fn read_attribute(&self, _field: &str) -> Option<Value> {
        None
    }

    fn write_attribute(&mut self, _field: &str, _value: Value) {}

    /// Public property `field`, `None` when unset.
    fn property(&self, _field: &str) -> Option<Value> {
        None
    }

    /// Assigns an existing public property. Returns `false` when there is none.
    fn set_property(&mut self, _field: &str, _value: Value) -> bool {
        false
    }
}

/// Entity handle shared between the caller and a validation.
///
/// Filtered values are written back through it, so the caller sees them.
pub type SharedEntity = Rc<RefCell<dyn Entity>>;

/// Wraps an entity for binding to a validation.
pub fn share<E: Entity + 'static>(entity: E) -> SharedEntity {
    Rc::new(RefCell::new(entity))
}

type Reader = fn(&dyn Entity, &str) -> Option<Value>;
type Writer = fn(&mut dyn Entity, &str, &Value) -> bool;

fn read_accessor(entity: &dyn Entity, field: &str) -> Option<Value> {
    entity.call_getter(&accessor_name("get", field))
}

fn read_attribute(entity: &dyn Entity, field: &str) -> Option<Value> {
    if entity.supports_attributes() {
        Some(entity.read_attribute(field).unwrap_or(Value::Null))
    } else {
        None
    }
}

fn read_property(entity: &dyn Entity, field: &str) -> Option<Value> {
    entity.property(field)
}

fn write_accessor(entity: &mut dyn Entity, field: &str, value: &Value) -> bool {
    entity.call_setter(&accessor_name("set", field), value.clone())
}

fn write_attribute(entity: &mut dyn Entity, field: &str, value: &Value) -> bool {
    if entity.supports_attributes() {
        entity.write_attribute(field, value.clone());
        true
    } else {
        false
    }
}

fn write_property(entity: &mut dyn Entity, field: &str, value: &Value) -> bool {
    entity.set_property(field, value.clone())
}

const READERS: [Reader; 3] = [read_accessor, read_attribute, read_property];
const WRITERS: [Writer; 3] = [write_accessor, write_attribute, write_property];

/// Reads `field` from `entity`; the first capability that applies wins.
pub fn resolve(entity: &dyn Entity, field: &str) -> Value {
    READERS
        .iter()
        .find_map(|reader| reader(entity, field))
        .unwrap_or(Value::Null)
}

/// Writes `value` back to `field`; returns `false` when no capability applied.
pub fn write_back(entity: &mut dyn Entity, field: &str, value: &Value) -> bool {
    WRITERS.iter().any(|writer| writer(entity, field, value))
}

/// `first_name` / `first-name` → `FirstName`.
pub fn camelize(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = true;
    for c in field.chars() {
        if c == '_' || c == '-' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Accessor name for `field` with the given prefix,
/// e.g. `("get", "first_name")` → `getFirstName`.
pub fn accessor_name(prefix: &str, field: &str) -> String {
    format!("{}{}", prefix, camelize(field))
}

/// Property-bag entity backed by a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonEntity {
    properties: Map<String, Value>,
}

impl JsonEntity {
    /// Wraps `properties` as the entity's public properties.
    pub fn new(properties: Map<String, Value>) -> Self {
        Self { properties }
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    /// Shorthand for [`share`].
    pub fn into_shared(self) -> SharedEntity {
        share(self)
    }
}

impl TryFrom<Value> for JsonEntity {
    type Error = ValidationFailure;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(properties) => Ok(Self::new(properties)),
            _ => Err(ValidationFailure::InvalidEntity),
        }
    }
}

impl Entity for JsonEntity {
    fn property(&self, field: &str) -> Option<Value> {
        match self.properties.get(field) {
            Some(Value::Null) | None => None,
            Some(value) => Some(value.clone()),
        }
    }

    fn set_property(&mut self, field: &str, value: Value) -> bool {
        match self.properties.get_mut(field) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

/// The bag of input values a validation reads from when no entity is bound
#[derive(Clone)]
pub enum DataSource {
    Map(Map<String, Value>),
    /// Object-like data, read through its public properties.
    Object(SharedEntity),
}

impl DataSource {
    /// Value of `field`, `Null` when unset.
    pub fn lookup(&self, field: &str) -> Value {
        match self {
            DataSource::Map(map) => map.get(field).cloned().unwrap_or(Value::Null),
            DataSource::Object(object) => object.borrow().property(field).unwrap_or(Value::Null),
        }
    }
}

impl std::fmt::Debug for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::Map(map) => f.debug_tuple("Map").field(map).finish(),
            DataSource::Object(_) => f.write_str("Object(..)"),
        }
    }
}

impl From<Map<String, Value>> for DataSource {
    fn from(map: Map<String, Value>) -> Self {
        DataSource::Map(map)
    }
}

impl From<SharedEntity> for DataSource {
    fn from(object: SharedEntity) -> Self {
        DataSource::Object(object)
    }
}

impl TryFrom<Value> for DataSource {
    type Error = ValidationFailure;

    fn try_from(value: Value) -> ValidationResult<Self> {
        match value {
            Value::Object(map) => Ok(DataSource::Map(map)),
            _ => Err(ValidationFailure::InvalidData),
        }
    }
}
