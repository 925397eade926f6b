//! Validator contract and the option helpers shared by concrete validators.
//!
//! Options are either a scalar, applying to every field a validator is
//! attached to, or a per-field map. Label, message template and code are
//! resolved through the same precedence: per-field entry, then scalar, then
//! the engine's label / default-message table.

use std::collections::HashMap;

use itertools::Itertools;
use regex::{Captures, Regex};
use serde_json::Value;

use crate::error::ValidationResult;
use crate::functional::validation_engine::Validation;
use crate::models::field::Field;
use crate::models::message::Message;
use crate::models::value::{is_empty, is_truthy, to_text};

/// Option value: the same for every field, or keyed by field name
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Scalar(Value),
    PerField(HashMap<String, Value>),
}

impl OptionValue {
    /// Value that applies to `field`. A per-field map without an entry yields `None`.
    pub fn resolve(&self, field: &str) -> Option<&Value> {
        match self {
            OptionValue::Scalar(value) => Some(value),
            OptionValue::PerField(map) => map.get(field),
        }
    }
}

/// Option bag carried by every validator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    values: HashMap<String, OptionValue>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a scalar option.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, OptionValue::Scalar(value.into()));
        self
    }

    /// Sets a per-field option from `(field, value)` pairs.
    pub fn with_per_field<I, K, V>(mut self, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let map = values
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.set(key, OptionValue::PerField(map));
        self
    }

    /// Sets `key`, replacing any previous scalar or per-field value.
    pub fn set(&mut self, key: &str, value: OptionValue) {
        self.values.insert(key.to_string(), value);
    }

    /// Defined and not a scalar `null`.
    pub fn contains(&self, key: &str) -> bool {
        !matches!(self.values.get(key), None | Some(OptionValue::Scalar(Value::Null)))
    }

    /// Raw option as stored, scalar or per-field.
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.values.get(key)
    }

    /// Value of `key` for `field`, or `None` when unset for that field.
    pub fn resolve(&self, key: &str, field: &str) -> Option<&Value> {
        self.values.get(key).and_then(|option| option.resolve(field))
    }
}

/// A check that can be attached to one or more fields of a [`Validation`].
///
/// On failure an implementation appends a [`Message`] to the validation and
/// returns `Ok(false)`; `Err` is reserved for structural problems.
pub trait Validator {
    /// Kind name used as the message `type` and to look up default templates.
    fn kind(&self) -> &str;

    fn options(&self) -> &Options;

    fn validate(&self, validation: &mut Validation, field: &Field) -> ValidationResult<bool>;

    /// Combined-fields validators run once against the whole field list.
    fn is_combined(&self) -> bool {
        false
    }

    /// Dedicated emptiness check used by the skip policy instead of the
    /// generic one. `None` when the validator has no such capability.
    fn is_allow_empty(
        &self,
        _validation: &mut Validation,
        _field: &str,
    ) -> Option<ValidationResult<bool>> {
        None
    }

    fn has_option(&self, key: &str) -> bool {
        self.options().contains(key)
    }

    fn get_option(&self, key: &str) -> Option<&OptionValue> {
        self.options().get(key)
    }

    /// Option `key` as it applies to `field`: the per-field entry, else the scalar.
    fn option_for(&self, key: &str, field: &str) -> Option<&Value> {
        self.options().resolve(key, field)
    }

    /// Truthiness of a flag option such as `cancelOnFail`.
    fn flag(&self, key: &str, field: &Field) -> bool {
        self.options()
            .resolve(key, &field.to_string())
            .is_some_and(is_truthy)
    }

    fn prepare_label(&self, validation: &Validation, field: &Field) -> String {
        match self.options().resolve("label", &field.to_string()) {
            Some(label) if !is_empty(label) => to_text(label),
            _ => validation.label(field),
        }
    }

    fn prepare_message(
        &self,
        validation: &Validation,
        field: &Field,
        kind: &str,
        option: &str,
    ) -> String {
        match self.options().resolve(option, &field.to_string()) {
            Some(message) if !is_empty(message) => to_text(message),
            _ => validation.default_message(kind).to_string(),
        }
    }

    fn prepare_code(&self, field: &Field) -> Option<i64> {
        self.options()
            .resolve("code", &field.to_string())
            .and_then(Value::as_i64)
    }

    /// Builds the failure message for `kind` and appends it. Always returns `false`.
    ///
    /// `:field` is filled with the prepared label; `replacements` supplies the
    /// remaining placeholders.
    fn report(
        &self,
        validation: &mut Validation,
        field: &Field,
        kind: &str,
        message_option: &str,
        replacements: &[(&str, String)],
    ) -> bool {
        let label = self.prepare_label(validation, field);
        let template = self.prepare_message(validation, field, kind, message_option);
        let code = self.prepare_code(field);

        let mut pairs = vec![(":field", label)];
        pairs.extend(replacements.iter().cloned());

        validation.append_message(
            Message::new(interpolate(&template, &pairs))
                .with_field(field.clone())
                .with_kind(kind)
                .with_code(code),
        );
        false
    }
}

/// Replaces the `:token` placeholders named in `pairs` in one pass.
///
/// Where tokens overlap the longest one wins, so `:field` and `:fields` can
/// coexist; text that matches no token is left as is.
pub fn interpolate(template: &str, pairs: &[(&str, String)]) -> String {
    if pairs.is_empty() {
        return template.to_string();
    }

    let pattern = pairs
        .iter()
        .map(|(token, _)| *token)
        .sorted_by(|a, b| b.len().cmp(&a.len()))
        .map(regex::escape)
        .join("|");

    match Regex::new(&pattern) {
        Ok(tokens) => tokens
            .replace_all(template, |caps: &Captures| {
                let token = &caps[0];
                pairs
                    .iter()
                    .find(|(name, _)| *name == token)
                    .map(|(_, value)| value.clone())
                    .unwrap_or_else(|| token.to_string())
            })
            .into_owned(),
        Err(e) => {
            log::warn!("cannot build placeholder pattern {}: {}", pattern, e);
            template.to_string()
        }
    }
}
