//! Sanitizing filters applied to resolved values.

use std::collections::HashMap;
use std::rc::Rc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Number, Value};

use crate::error::{ValidationFailure, ValidationResult};
use crate::models::value::to_text;

static TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static EMAIL_STRIP_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9!#$%&'*+/=?^_`{|}~@.\[\]-]").unwrap());
static URL_STRIP_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9$\-_.+!*'(),{}|\\^~\[\]`<>#%;/?:@&=]").unwrap());
static ALNUM_STRIP_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9]").unwrap());
static INT_STRIP_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9+-]").unwrap());
static FLOAT_STRIP_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9.eE+-]").unwrap());

/// Ordered list of filter names applied to one field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec(Vec<String>);

impl FilterSpec {
    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for FilterSpec {
    fn from(name: &str) -> Self {
        FilterSpec(vec![name.to_string()])
    }
}

impl From<String> for FilterSpec {
    fn from(name: String) -> Self {
        FilterSpec(vec![name])
    }
}

impl From<Vec<&str>> for FilterSpec {
    fn from(names: Vec<&str>) -> Self {
        FilterSpec(names.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for FilterSpec {
    fn from(names: Vec<String>) -> Self {
        FilterSpec(names)
    }
}

impl<const N: usize> From<[&str; N]> for FilterSpec {
    fn from(names: [&str; N]) -> Self {
        FilterSpec(names.iter().map(|n| n.to_string()).collect())
    }
}

/// Transforms a raw value through an ordered list of filters.
pub trait FilterService {
    fn sanitize(&self, value: &Value, spec: &FilterSpec) -> ValidationResult<Value>;
}

type CustomFilter = Rc<dyn Fn(&Value) -> Value>;

/// Built-in sanitizer with optional user-registered filters
#[derive(Clone, Default)]
pub struct Filter {
    custom: HashMap<String, CustomFilter>,
}

impl Filter {
    /// Filter with only the built-in names: `trim`, `ltrim`, `rtrim`, `upper`,
    /// `lower`, `string`, `striptags`, `email`, `url`, `alphanum`, `int`,
    /// `absint` and `float`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a named filter. Custom names shadow built-ins.
    pub fn add<F>(&mut self, name: &str, filter: F) -> &mut Self
    where
        F: Fn(&Value) -> Value + 'static,
    {
        self.custom.insert(name.to_string(), Rc::new(filter));
        self
    }

    fn apply(&self, value: &Value, name: &str) -> ValidationResult<Value> {
        if let Value::Array(items) = value {
            return items
                .iter()
                .map(|item| self.apply(item, name))
                .collect::<ValidationResult<Vec<_>>>()
                .map(Value::Array);
        }

        if let Some(custom) = self.custom.get(name) {
            return Ok(custom(value));
        }

        let text = to_text(value);
        let filtered = match name {
            "trim" => Value::String(text.trim().to_string()),
            "ltrim" => Value::String(text.trim_start().to_string()),
            "rtrim" => Value::String(text.trim_end().to_string()),
            "upper" => Value::String(text.to_uppercase()),
            "lower" => Value::String(text.to_lowercase()),
            "string" | "striptags" => Value::String(TAG_REGEX.replace_all(&text, "").into_owned()),
            "email" => Value::String(EMAIL_STRIP_REGEX.replace_all(&text, "").into_owned()),
            "url" => Value::String(URL_STRIP_REGEX.replace_all(&text, "").into_owned()),
            "alphanum" => Value::String(ALNUM_STRIP_REGEX.replace_all(&text, "").into_owned()),
            "int" => Value::from(parse_int(&text)),
            "absint" => Value::from(parse_int(&text).saturating_abs()),
            "float" => {
                let cleaned = FLOAT_STRIP_REGEX.replace_all(&text, "");
                let parsed = cleaned.parse::<f64>().unwrap_or(0.0);
                Number::from_f64(parsed).map(Value::Number).ok_or_else(|| {
                    ValidationFailure::Filter {
                        field: String::new(),
                        reason: format!("'{}' is not a finite number", text),
                    }
                })?
            }
            unknown => {
                return Err(ValidationFailure::Filter {
                    field: String::new(),
                    reason: format!("sanitize filter '{}' is not supported", unknown),
                })
            }
        };
        Ok(filtered)
    }
}

/// Keeps digits and signs, then parses; unparsable input yields `0`.
fn parse_int(text: &str) -> i64 {
    let cleaned = INT_STRIP_REGEX.replace_all(text, "");
    cleaned.parse::<i64>().unwrap_or(0)
}

impl FilterService for Filter {
    fn sanitize(&self, value: &Value, spec: &FilterSpec) -> ValidationResult<Value> {
        spec.names()
            .iter()
            .try_fold(value.clone(), |current, name| self.apply(&current, name))
    }
}
