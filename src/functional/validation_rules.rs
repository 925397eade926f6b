//! Built-in Validators
//!
//! Each validator resolves its value through the engine, applies one
//! predicate, and on failure appends a message built from its label, message
//! template and code options.

use std::fmt;
use std::path::Path;
use std::rc::Rc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{ValidationFailure, ValidationResult};
use crate::functional::validation_engine::Validation;
use crate::functional::validator::{Options, Validator};
use crate::models::entity::{DataSource, SharedEntity};
use crate::models::field::Field;
use crate::models::value::{as_number, is_empty, to_text};

static NUMERIC_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?[0-9]+\.?[0-9]*$").unwrap());
static SIZE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^([0-9]+(?:\.[0-9]+)?)(B|K|M|G|T|KB|MB|GB|TB)?$").unwrap());

/// Upload error codes carried in the `error` key of an upload descriptor.
pub const UPLOAD_ERR_OK: i64 = 0;
/// The upload exceeded the server's size limit.
pub const UPLOAD_ERR_INI_SIZE: i64 = 1;
/// Nothing was uploaded.
pub const UPLOAD_ERR_NO_FILE: i64 = 4;

/// Single field name of a per-field rule.
fn single_name(field: &Field) -> ValidationResult<&str> {
    field.as_name().ok_or(ValidationFailure::InvalidRuleScope)
}

/// Required field - fails on `null` and on the empty string
#[derive(Debug, Clone, Default)]
pub struct PresenceOf {
    options: Options,
}

impl PresenceOf {
    pub fn new(options: Options) -> Self {
        Self { options }
    }
}

impl Validator for PresenceOf {
    fn kind(&self) -> &str {
        "PresenceOf"
    }

    fn options(&self) -> &Options {
        &self.options
    }

    fn validate(&self, validation: &mut Validation, field: &Field) -> ValidationResult<bool> {
        let value = validation.get_value(single_name(field)?)?;
        if value.is_null() || value.as_str() == Some("") {
            return Ok(self.report(validation, field, "PresenceOf", "message", &[]));
        }
        Ok(true)
    }
}

/// ASCII letters and digits only; the empty string fails
#[derive(Debug, Clone, Default)]
pub struct Alnum {
    options: Options,
}

impl Alnum {
    pub fn new(options: Options) -> Self {
        Self { options }
    }
}

impl Validator for Alnum {
    fn kind(&self) -> &str {
        "Alnum"
    }

    fn options(&self) -> &Options {
        &self.options
    }

    fn validate(&self, validation: &mut Validation, field: &Field) -> ValidationResult<bool> {
        let text = to_text(&validation.get_value(single_name(field)?)?);
        if text.is_empty() || !text.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Ok(self.report(validation, field, "Alnum", "message", &[]));
        }
        Ok(true)
    }
}

/// Alphabetic characters only (any script)
#[derive(Debug, Clone, Default)]
pub struct Alpha {
    options: Options,
}

impl Alpha {
    pub fn new(options: Options) -> Self {
        Self { options }
    }
}

impl Validator for Alpha {
    fn kind(&self) -> &str {
        "Alpha"
    }

    fn options(&self) -> &Options {
        &self.options
    }

    fn validate(&self, validation: &mut Validation, field: &Field) -> ValidationResult<bool> {
        let text = to_text(&validation.get_value(single_name(field)?)?);
        if text.chars().any(|c| !c.is_alphabetic()) {
            return Ok(self.report(validation, field, "Alpha", "message", &[]));
        }
        Ok(true)
    }
}

/// Plain decimal format: optional minus, digits, optional fraction
///
/// The check runs on the text form of the value. JSON numbers large or small
/// enough to print in exponent form (`1e20`, `1e-7`) therefore fail, as does
/// any string using exponent notation.
#[derive(Debug, Clone, Default)]
pub struct Numericality {
    options: Options,
}

impl Numericality {
    pub fn new(options: Options) -> Self {
        Self { options }
    }
}

impl Validator for Numericality {
    fn kind(&self) -> &str {
        "Numericality"
    }

    fn options(&self) -> &Options {
        &self.options
    }

    fn validate(&self, validation: &mut Validation, field: &Field) -> ValidationResult<bool> {
        let text = to_text(&validation.get_value(single_name(field)?)?);
        if !NUMERIC_REGEX.is_match(&text) {
            return Ok(self.report(validation, field, "Numericality", "message", &[]));
        }
        Ok(true)
    }
}

/// Inclusive numeric range with `minimum` and `maximum` options
#[derive(Debug, Clone, Default)]
pub struct Between {
    options: Options,
}

impl Between {
    /// Creates the validator from its options.
    ///
    /// # Arguments
    ///
    /// * `options` - `minimum` and `maximum` (required, scalar or per-field),
    ///   plus the common `message`, `label`, `code`, `allowEmpty` and `cancelOnFail`
    ///
    /// # Examples
    ///
    /// ```
    /// use fieldcheck::{Between, Options};
    ///
    /// let adults = Between::new(
    ///     Options::new()
    ///         .with("minimum", 18)
    ///         .with("maximum", 65)
    ///         .with("message", ":field must be between :min and :max"),
    /// );
    /// ```
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    /// Same bounds for every field.
    pub fn range(minimum: impl Into<Value>, maximum: impl Into<Value>) -> Self {
        Self::new(Options::new().with("minimum", minimum).with("maximum", maximum))
    }

    fn bound(&self, key: &str, field: &str) -> ValidationResult<(f64, String)> {
        let raw = self
            .option_for(key, field)
            .ok_or_else(|| ValidationFailure::InvalidOption {
                option: key.to_string(),
                reason: format!("missing for field '{}'", field),
            })?;
        let number = as_number(raw).ok_or_else(|| ValidationFailure::InvalidOption {
            option: key.to_string(),
            reason: format!("{} is not a number", raw),
        })?;
        Ok((number, to_text(raw)))
    }
}

impl Validator for Between {
    fn kind(&self) -> &str {
        "Between"
    }

    fn options(&self) -> &Options {
        &self.options
    }

    fn validate(&self, validation: &mut Validation, field: &Field) -> ValidationResult<bool> {
        let name = single_name(field)?;
        let value = validation.get_value(name)?;
        let (minimum, min_text) = self.bound("minimum", name)?;
        let (maximum, max_text) = self.bound("maximum", name)?;

        let in_range = as_number(&value).is_some_and(|n| n >= minimum && n <= maximum);
        if !in_range {
            return Ok(self.report(
                validation,
                field,
                "Between",
                "message",
                &[(":min", min_text), (":max", max_text)],
            ));
        }
        Ok(true)
    }
}

/// What a [`Callback`] receives: the bound entity, else the bound data
pub enum CallbackSubject<'a> {
    Entity(&'a SharedEntity),
    Data(&'a DataSource),
    Nothing,
}

/// Verdict of a [`Callback`]
pub enum CallbackResult {
    Valid(bool),
    /// Run this validator instead and use its verdict.
    Delegate(Rc<dyn Validator>),
}

type CallbackFn = Rc<dyn Fn(CallbackSubject<'_>) -> CallbackResult>;

/// User-supplied predicate over the whole entity or data
#[derive(Clone)]
pub struct Callback {
    options: Options,
    callback: CallbackFn,
}

impl Callback {
    /// Wraps `callback`, which receives the bound entity or else the bound data.
    ///
    /// # Examples
    ///
    /// ```
    /// use fieldcheck::{Callback, CallbackResult, CallbackSubject, Options};
    /// use serde_json::json;
    ///
    /// let accepted = Callback::new(Options::new(), |subject| match subject {
    ///     CallbackSubject::Data(data) => {
    ///         CallbackResult::Valid(data.lookup("terms") == json!(true))
    ///     }
    ///     _ => CallbackResult::Valid(false),
    /// });
    /// ```
    pub fn new<F>(options: Options, callback: F) -> Self
    where
        F: Fn(CallbackSubject<'_>) -> CallbackResult + 'static,
    {
        Self {
            options,
            callback: Rc::new(callback),
        }
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback").field("options", &self.options).finish()
    }
}

impl Validator for Callback {
    fn kind(&self) -> &str {
        "Callback"
    }

    fn options(&self) -> &Options {
        &self.options
    }

    fn validate(&self, validation: &mut Validation, field: &Field) -> ValidationResult<bool> {
        let verdict = {
            let subject = match (validation.entity(), validation.data()) {
                (Some(entity), _) => CallbackSubject::Entity(entity),
                (None, Some(data)) => CallbackSubject::Data(data),
                (None, None) => CallbackSubject::Nothing,
            };
            (self.callback)(subject)
        };

        match verdict {
            CallbackResult::Valid(true) => Ok(true),
            CallbackResult::Valid(false) => {
                Ok(self.report(validation, field, "Callback", "message", &[]))
            }
            CallbackResult::Delegate(validator) => validator.validate(validation, field),
        }
    }
}

/// Uploaded-file check over an upload descriptor object
/// (`error`, `tmp_name`, `name`, `type`, `size`, optional `width`/`height`).
#[derive(Debug, Clone, Default)]
pub struct File {
    options: Options,
}

impl File {
    /// Creates the validator from its options.
    ///
    /// # Arguments
    ///
    /// * `options` - any of `maxSize` (`"2M"`, `"512K"`, `"100"`), `allowedTypes`
    ///   (array of mime types), `minResolution` / `maxResolution` (`"WIDTHxHEIGHT"`),
    ///   and the per-check templates `messageIniSize`, `messageEmpty`,
    ///   `messageValid`, `messageSize`, `messageType`, `messageMinResolution`,
    ///   `messageMaxResolution`
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    fn max_bytes(raw: &Value) -> ValidationResult<f64> {
        let text = to_text(raw);
        let caps = SIZE_REGEX
            .captures(&text)
            .ok_or_else(|| ValidationFailure::InvalidOption {
                option: "maxSize".to_string(),
                reason: format!("'{}' is not a size", text),
            })?;
        let amount: f64 = caps[1].parse().unwrap_or(0.0);
        let shift = match caps.get(2).map(|m| m.as_str().to_ascii_uppercase()).as_deref() {
            Some("K") | Some("KB") => 10,
            Some("M") | Some("MB") => 20,
            Some("G") | Some("GB") => 30,
            Some("T") | Some("TB") => 40,
            _ => 0,
        };
        Ok(amount * 2f64.powi(shift))
    }

    fn resolution(option: &str, raw: &Value) -> ValidationResult<(f64, f64)> {
        let text = to_text(raw);
        let parsed = text.split_once('x').and_then(|(w, h)| {
            Some((w.trim().parse::<f64>().ok()?, h.trim().parse::<f64>().ok()?))
        });
        parsed.ok_or_else(|| ValidationFailure::InvalidOption {
            option: option.to_string(),
            reason: format!("'{}' is not WIDTHxHEIGHT", text),
        })
    }
}

impl Validator for File {
    fn kind(&self) -> &str {
        "File"
    }

    fn options(&self) -> &Options {
        &self.options
    }

    fn validate(&self, validation: &mut Validation, field: &Field) -> ValidationResult<bool> {
        let name = single_name(field)?;
        let value = validation.get_value(name)?;
        let upload = value.as_object();
        let entry = |key: &str| upload.and_then(|u| u.get(key)).filter(|v| !v.is_null());

        let error = entry("error").and_then(Value::as_i64);
        if error == Some(UPLOAD_ERR_INI_SIZE) {
            return Ok(self.report(validation, field, "FileIniSize", "messageIniSize", &[]));
        }

        let on_disk = entry("tmp_name")
            .and_then(Value::as_str)
            .is_some_and(|tmp| Path::new(tmp).is_file());
        if error != Some(UPLOAD_ERR_OK) || !on_disk {
            return Ok(self.report(validation, field, "FileEmpty", "messageEmpty", &[]));
        }

        if entry("name").is_none() || entry("type").is_none() || entry("size").is_none() {
            return Ok(self.report(validation, field, "FileValid", "messageValid", &[]));
        }

        if let Some(max_size) = self.option_for("maxSize", name) {
            let bytes = Self::max_bytes(max_size)?;
            let size = entry("size").and_then(as_number).unwrap_or(0.0);
            if size > bytes {
                return Ok(self.report(
                    validation,
                    field,
                    "FileSize",
                    "messageSize",
                    &[(":max", to_text(max_size))],
                ));
            }
        }

        if let Some(types) = self.option_for("allowedTypes", name) {
            let allowed = types.as_array().ok_or_else(|| ValidationFailure::InvalidOption {
                option: "allowedTypes".to_string(),
                reason: "must be an array".to_string(),
            })?;
            let mime = entry("type").map(to_text).unwrap_or_default();
            if !allowed.iter().any(|t| to_text(t) == mime) {
                return Ok(self.report(
                    validation,
                    field,
                    "FileType",
                    "messageType",
                    &[(":types", to_text(types))],
                ));
            }
        }

        if self.has_option("minResolution") || self.has_option("maxResolution") {
            let min_option = self.option_for("minResolution", name);
            let max_option = self.option_for("maxResolution", name);
            let dimensions = entry("width")
                .and_then(as_number)
                .zip(entry("height").and_then(as_number));
            let Some((width, height)) = dimensions else {
                return Ok(self.report(validation, field, "FileValid", "messageValid", &[]));
            };

            let (min_width, min_height) = match min_option {
                Some(raw) => Self::resolution("minResolution", raw)?,
                None => (1.0, 1.0),
            };
            if width < min_width || height < min_height {
                let min_text = min_option.map(to_text).unwrap_or_else(|| "1x1".to_string());
                return Ok(self.report(
                    validation,
                    field,
                    "FileMinResolution",
                    "messageMinResolution",
                    &[(":min", min_text)],
                ));
            }

            if let Some(raw) = max_option {
                let (max_width, max_height) = Self::resolution("maxResolution", raw)?;
                if width > max_width || height > max_height {
                    return Ok(self.report(
                        validation,
                        field,
                        "FileMaxResolution",
                        "messageMaxResolution",
                        &[(":max", to_text(raw))],
                    ));
                }
            }
        }

        Ok(true)
    }

    /// Empty when nothing was sent or the upload reports "no file".
    fn is_allow_empty(
        &self,
        validation: &mut Validation,
        field: &str,
    ) -> Option<ValidationResult<bool>> {
        Some(validation.get_value(field).map(|value| {
            is_empty(&value)
                || value.get("error").and_then(Value::as_i64) == Some(UPLOAD_ERR_NO_FILE)
        }))
    }
}

/// Number of non-empty values among the fields of a combined rule.
fn filled_count(validation: &mut Validation, field: &Field) -> ValidationResult<usize> {
    let mut filled = 0;
    for name in field.names() {
        if !is_empty(&validation.get_value(name)?) {
            filled += 1;
        }
    }
    Ok(filled)
}

/// Either every listed field is provided or none is
#[derive(Debug, Clone, Default)]
pub struct AllOrNone {
    options: Options,
}

impl AllOrNone {
    pub fn new(options: Options) -> Self {
        Self { options }
    }
}

impl Validator for AllOrNone {
    fn kind(&self) -> &str {
        "AllOrNone"
    }

    fn options(&self) -> &Options {
        &self.options
    }

    fn is_combined(&self) -> bool {
        true
    }

    fn validate(&self, validation: &mut Validation, field: &Field) -> ValidationResult<bool> {
        let filled = filled_count(validation, field)?;
        if filled != 0 && filled != field.names().len() {
            return Ok(self.report(validation, field, "AllOrNone", "message", &[]));
        }
        Ok(true)
    }
}

/// At most one of the listed fields is provided
#[derive(Debug, Clone, Default)]
pub struct MutuallyExclusive {
    options: Options,
}

impl MutuallyExclusive {
    pub fn new(options: Options) -> Self {
        Self { options }
    }
}

impl Validator for MutuallyExclusive {
    fn kind(&self) -> &str {
        "MutuallyExclusive"
    }

    fn options(&self) -> &Options {
        &self.options
    }

    fn is_combined(&self) -> bool {
        true
    }

    fn validate(&self, validation: &mut Validation, field: &Field) -> ValidationResult<bool> {
        if filled_count(validation, field)? > 1 {
            return Ok(self.report(validation, field, "MutuallyExclusive", "message", &[]));
        }
        Ok(true)
    }
}
