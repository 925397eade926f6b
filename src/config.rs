//! Engine configuration: default message templates and field labels.
//!
//! Templates may contain the placeholders `:field`, `:min`, `:max`, `:with`,
//! `:domain` and `:types`.

use std::collections::HashMap;
use std::env;
use std::fs;

use serde::{Deserialize, Serialize};

use crate::error::{ValidationFailure, ValidationResult};

/// Env var naming a JSON file to load with [`ValidationConfig::from_env`].
pub const CONFIG_PATH_VAR: &str = "VALIDATION_CONFIG";

const BUILTIN_MESSAGES: &[(&str, &str)] = &[
    ("Alnum", "Field :field must contain only letters and numbers"),
    ("Alpha", "Field :field must contain only letters"),
    ("Between", "Field :field must be within the range of :min to :max"),
    ("Confirmation", "Field :field must be the same as :with"),
    ("Digit", "Field :field must be numeric"),
    ("Email", "Field :field must be an email address"),
    ("ExclusionIn", "Field :field must not be a part of list: :domain"),
    ("FileEmpty", "Field :field must not be empty"),
    ("FileIniSize", "File :field exceeds the maximum file size"),
    ("FileMaxResolution", "File :field must not exceed :max resolution"),
    ("FileMinResolution", "File :field must be at least :min resolution"),
    ("FileSize", "File :field exceeds the size of :max"),
    ("FileType", "File :field must be of type: :types"),
    ("FileValid", "Field :field is not valid"),
    ("Identical", "Field :field does not have the expected value"),
    ("InclusionIn", "Field :field must be a part of list: :domain"),
    ("Numericality", "Field :field does not have a valid numeric format"),
    ("PresenceOf", "Field :field is required"),
    ("Regex", "Field :field does not match the required format"),
    ("TooLong", "Field :field must not exceed :max characters long"),
    ("TooShort", "Field :field must be at least :min characters long"),
    ("Uniqueness", "Field :field must be unique"),
    ("Url", "Field :field must be a url"),
    ("CreditCard", "Field :field is not valid for a credit card number"),
    ("Date", "Field :field is not a valid date"),
    ("Callback", "Field :field must match the callback"),
    ("AllOrNone", "Fields :field must be provided together"),
    ("MutuallyExclusive", "Only one of :field may be provided"),
];

/// Built-in message templates keyed by validator kind.
pub fn builtin_messages() -> HashMap<String, String> {
    BUILTIN_MESSAGES
        .iter()
        .map(|(kind, template)| (kind.to_string(), template.to_string()))
        .collect()
}

/// Messages and labels merged into a [`Validation`](crate::Validation) at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "builtin_messages")]
    pub default_messages: HashMap<String, String>,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            default_messages: builtin_messages(),
            labels: HashMap::new(),
        }
    }
}

impl ValidationConfig {
    /// Built-in templates with `overrides` merged on top.
    pub fn with_default_messages<I, K, V>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.default_messages = merge_messages(overrides);
        self
    }

    /// Replaces the field labels used for `:field`.
    pub fn with_labels<I, K, V>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.labels = labels
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Parses a JSON document; its `default_messages` are merged over the built-ins.
    ///
    /// ```json
    /// { "default_messages": { "PresenceOf": ":field cannot be blank" },
    ///   "labels": { "email": "E-mail" } }
    /// ```
    pub fn from_json_str(raw: &str) -> ValidationResult<Self> {
        let parsed: ValidationConfig = serde_json::from_str(raw)?;
        Ok(Self {
            default_messages: merge_messages(parsed.default_messages),
            labels: parsed.labels,
        })
    }

    /// Loads `.env`, then the JSON file named by `VALIDATION_CONFIG` if set.
    pub fn from_env() -> ValidationResult<Self> {
        let _ = dotenv::dotenv();
        match env::var(CONFIG_PATH_VAR) {
            Ok(path) => {
                let raw = fs::read_to_string(&path).map_err(|e| {
                    ValidationFailure::Config(format!("cannot read {}: {}", path, e))
                })?;
                log::debug!("loading validation config from {}", path);
                Self::from_json_str(&raw)
            }
            Err(_) => Ok(Self::default()),
        }
    }
}

/// Built-in templates with `overrides` merged on top.
pub fn merge_messages<I, K, V>(overrides: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut messages = builtin_messages();
    messages.extend(overrides.into_iter().map(|(k, v)| (k.into(), v.into())));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_builtin_table() {
        let config = ValidationConfig::default();
        assert_eq!(
            config.default_messages.get("Between").map(String::as_str),
            Some("Field :field must be within the range of :min to :max")
        );
        assert!(config.labels.is_empty());
    }

    #[test]
    fn test_overrides_merge_over_builtins() {
        let config = ValidationConfig::default()
            .with_default_messages([("PresenceOf", ":field cannot be blank")]);
        assert_eq!(config.default_messages["PresenceOf"], ":field cannot be blank");
        assert!(config.default_messages.contains_key("Alnum"));
    }

    #[test]
    fn test_from_json_str() {
        let config = ValidationConfig::from_json_str(
            r#"{"default_messages": {"Alpha": "letters only"}, "labels": {"email": "E-mail"}}"#,
        )
        .unwrap();
        assert_eq!(config.default_messages["Alpha"], "letters only");
        assert_eq!(
            config.default_messages["Alnum"],
            "Field :field must contain only letters and numbers"
        );
        assert_eq!(config.labels["email"], "E-mail");

        let empty = ValidationConfig::from_json_str("{}").unwrap();
        assert_eq!(empty, ValidationConfig::default());
    }

    #[test]
    fn test_from_json_str_rejects_garbage() {
        assert!(matches!(
            ValidationConfig::from_json_str("[1, 2"),
            Err(ValidationFailure::ConfigParse(_))
        ));
    }

    #[test]
    fn test_from_env_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, br#"{"labels": {"age": "Your age"}}"#).unwrap();
        env::set_var(CONFIG_PATH_VAR, file.path());
        let config = ValidationConfig::from_env().unwrap();
        env::remove_var(CONFIG_PATH_VAR);
        assert_eq!(config.labels["age"], "Your age");
    }
}
