//! Rule-Driven Validation Engine
//!
//! Holds the registered (field, validator) rules and runs them in two phases:
//! per-field rules in registration order, then combined-fields rules in
//! registration order. Validators call back into the engine to resolve values
//! and to append messages.

use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use crate::config::{merge_messages, ValidationConfig};
use crate::error::{ValidationFailure, ValidationResult};
use crate::functional::filter::{FilterService, FilterSpec};
use crate::functional::validator::Validator;
use crate::models::entity::{self, DataSource, JsonEntity, SharedEntity};
use crate::models::field::Field;
use crate::models::message::{Message, MessageGroup};
use crate::models::value::{is_empty, is_truthy};

/// Called before any rule runs; returning `false` vetoes the run.
pub type BeforeValidation =
    Rc<dyn Fn(Option<&Value>, Option<&SharedEntity>, &mut MessageGroup) -> bool>;

/// Called after both phases; may only act on the message collection.
pub type AfterValidation = Rc<dyn Fn(Option<&Value>, Option<&SharedEntity>, &mut MessageGroup)>;

#[derive(Clone)]
struct Rule {
    field: Field,
    validator: Rc<dyn Validator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Fields,
    Combined,
}

/// Result of a completed `validate` call
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    /// The before-validation hook returned `false`; no rule ran.
    Vetoed,
    /// Every rule ran (or was skipped/cancelled by policy).
    Checked(MessageGroup),
}

impl ValidationOutcome {
    /// True when the before-validation hook stopped the run.
    pub fn is_vetoed(&self) -> bool {
        matches!(self, ValidationOutcome::Vetoed)
    }

    /// True when the run completed without messages.
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Checked(messages) if messages.is_empty())
    }

    /// Messages of a completed run, `None` when the run was vetoed.
    pub fn messages(&self) -> Option<&MessageGroup> {
        match self {
            ValidationOutcome::Checked(messages) => Some(messages),
            ValidationOutcome::Vetoed => None,
        }
    }

    /// Messages of a completed run; a vetoed run yields an empty group.
    pub fn into_messages(self) -> MessageGroup {
        match self {
            ValidationOutcome::Checked(messages) => messages,
            ValidationOutcome::Vetoed => MessageGroup::new(),
        }
    }
}

/// Declarative field validation over a data map or a bound entity.
///
/// One instance is meant to be used from a single thread; each `validate`
/// call resets the value cache and the active message collection.
pub struct Validation {
    data: Option<DataSource>,
    entity: Option<SharedEntity>,
    validators: Vec<Rule>,
    combined_validators: Vec<Rule>,
    filters: HashMap<String, FilterSpec>,
    filter_service: Option<Rc<dyn FilterService>>,
    labels: HashMap<String, String>,
    default_messages: HashMap<String, String>,
    messages: MessageGroup,
    values: HashMap<String, Value>,
    before_validation: Option<BeforeValidation>,
    after_validation: Option<AfterValidation>,
}

impl Default for Validation {
    fn default() -> Self {
        Self::new()
    }
}

impl Validation {
    /// Creates an engine with the built-in message table and no rules.
    pub fn new() -> Self {
        Self::with_config(ValidationConfig::default())
    }

    /// Creates an engine whose message table and labels come from `config`.
    ///
    /// # Examples
    ///
    /// ```
    /// use fieldcheck::{Validation, ValidationConfig};
    ///
    /// let config = ValidationConfig::default().with_labels([("email", "E-mail")]);
    /// let validation = Validation::with_config(config);
    /// assert_eq!(validation.label(&"email".into()), "E-mail");
    /// ```
    pub fn with_config(config: ValidationConfig) -> Self {
        Self {
            data: None,
            entity: None,
            validators: Vec::new(),
            combined_validators: Vec::new(),
            filters: HashMap::new(),
            filter_service: None,
            labels: config.labels,
            default_messages: config.default_messages,
            messages: MessageGroup::new(),
            values: HashMap::new(),
            before_validation: None,
            after_validation: None,
        }
    }

    /// Creates an engine from prebuilt (field, validator) pairs.
    ///
    /// Combined-fields validators are stored once against their field list.
    /// Other pairs are stored as given; a list selector is not expanded and
    /// is rejected with `InvalidRuleScope` when the run reaches it.
    pub fn with_rules<I>(rules: I) -> Self
    where
        I: IntoIterator<Item = (Field, Rc<dyn Validator>)>,
    {
        let mut validation = Self::new();
        for (field, validator) in rules {
            if validator.is_combined() {
                validation.combined_validators.push(Rule {
                    field: field.into_list(),
                    validator,
                });
            } else {
                validation.validators.push(Rule { field, validator });
            }
        }
        validation
    }

    /// Installs the service used to sanitize fields that have filters.
    pub fn with_filter_service(mut self, service: Rc<dyn FilterService>) -> Self {
        self.filter_service = Some(service);
        self
    }

    /// Installs (or replaces) the filter service on an existing engine.
    pub fn set_filter_service(&mut self, service: Rc<dyn FilterService>) -> &mut Self {
        self.filter_service = Some(service);
        self
    }

    /// Registers `validator` for `field`.
    ///
    /// A non-combined validator registered against a list of names becomes one
    /// rule per name, in list order. A combined-fields validator is always
    /// stored once in the combined list.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when `field` is neither a name nor a list of names.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::rc::Rc;
    /// use fieldcheck::{Between, PresenceOf, Validation};
    ///
    /// let mut validation = Validation::new();
    /// validation.add(["name", "email"], Rc::new(PresenceOf::default()))?;
    /// validation.add("age", Rc::new(Between::range(18, 65)))?;
    /// assert_eq!(validation.validators().len(), 3);
    /// # Ok::<(), fieldcheck::ValidationFailure>(())
    /// ```
    pub fn add<F>(&mut self, field: F, validator: Rc<dyn Validator>) -> ValidationResult<&mut Self>
    where
        F: TryInto<Field>,
        ValidationFailure: From<F::Error>,
    {
        self.register(field.try_into()?, validator);
        Ok(self)
    }

    fn register(&mut self, field: Field, validator: Rc<dyn Validator>) {
        if validator.is_combined() {
            self.combined_validators.push(Rule {
                field: field.into_list(),
                validator,
            });
            return;
        }

        match field {
            Field::Name(name) => self.validators.push(Rule {
                field: Field::Name(name),
                validator,
            }),
            Field::Names(names) => {
                for name in names {
                    self.validators.push(Rule {
                        field: Field::Name(name),
                        validator: Rc::clone(&validator),
                    });
                }
            }
        }
    }

    /// Alias of [`Validation::add`].
    pub fn rule<F>(&mut self, field: F, validator: Rc<dyn Validator>) -> ValidationResult<&mut Self>
    where
        F: TryInto<Field>,
        ValidationFailure: From<F::Error>,
    {
        self.add(field, validator)
    }

    /// Registers every validator in `validators` for `field`, in order.
    pub fn rules<F, I>(&mut self, field: F, validators: I) -> ValidationResult<&mut Self>
    where
        F: TryInto<Field>,
        ValidationFailure: From<F::Error>,
        I: IntoIterator<Item = Rc<dyn Validator>>,
    {
        let field: Field = field.try_into()?;
        for validator in validators {
            self.register(field.clone(), validator);
        }
        Ok(self)
    }

    /// Per-field rules as (field, validator kind) pairs, in registration order.
    pub fn validators(&self) -> Vec<(&Field, &str)> {
        self.validators
            .iter()
            .map(|rule| (&rule.field, rule.validator.kind()))
            .collect()
    }

    /// Combined-fields rules as (field list, validator kind) pairs.
    pub fn combined_validators(&self) -> Vec<(&Field, &str)> {
        self.combined_validators
            .iter()
            .map(|rule| (&rule.field, rule.validator.kind()))
            .collect()
    }

    /// Sets the filters applied to `field` (or to each field of a list).
    pub fn set_filters<F>(
        &mut self,
        field: F,
        filters: impl Into<FilterSpec>,
    ) -> ValidationResult<&mut Self>
    where
        F: TryInto<Field>,
        ValidationFailure: From<F::Error>,
    {
        let field = field.try_into()?;
        let filters = filters.into();
        for name in field.names() {
            self.filters.insert(name.to_string(), filters.clone());
        }
        Ok(self)
    }

    /// Filters keyed by field name.
    pub fn filters(&self) -> &HashMap<String, FilterSpec> {
        &self.filters
    }

    /// Filters configured for `field`, if any.
    pub fn filter_for(&self, field: &str) -> Option<&FilterSpec> {
        self.filters.get(field)
    }

    /// Binds the entity values are read from and filtered values are written to.
    ///
    /// While an entity is bound it takes precedence over the data, and its
    /// values are never cached.
    pub fn set_entity(&mut self, entity: SharedEntity) -> &mut Self {
        self.entity = Some(entity);
        self
    }

    /// Binds a JSON object as the entity; anything else is `InvalidEntity`.
    pub fn set_entity_value(&mut self, entity: Value) -> ValidationResult<&mut Self> {
        let entity = JsonEntity::try_from(entity)?;
        Ok(self.set_entity(entity.into_shared()))
    }

    /// The bound entity, if any.
    pub fn entity(&self) -> Option<&SharedEntity> {
        self.entity.as_ref()
    }

    /// Binds the entity values are read from, together with the raw data.
    pub fn bind(&mut self, entity: SharedEntity, data: Value) -> ValidationResult<&mut Self> {
        let data = DataSource::try_from(data)?;
        self.entity = Some(entity);
        self.data = Some(data);
        Ok(self)
    }

    /// Binds the data read when no entity is bound: a JSON map or an
    /// object-like [`SharedEntity`] read through its public properties.
    ///
    /// # Examples
    ///
    /// ```
    /// use fieldcheck::{share, JsonEntity, Validation};
    /// use serde_json::json;
    ///
    /// let mut validation = Validation::new();
    /// let object = share(JsonEntity::try_from(json!({"age": 15}))?);
    /// validation.set_data(object);
    /// assert_eq!(validation.get_value("age")?, json!(15));
    /// # Ok::<(), fieldcheck::ValidationFailure>(())
    /// ```
    pub fn set_data(&mut self, data: impl Into<DataSource>) -> &mut Self {
        self.data = Some(data.into());
        self
    }

    /// The bound data, if any.
    pub fn data(&self) -> Option<&DataSource> {
        self.data.as_ref()
    }

    /// Resets the message table to the built-ins merged with `overrides`.
    pub fn set_default_messages<I, K, V>(&mut self, overrides: I) -> &HashMap<String, String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.default_messages = merge_messages(overrides);
        &self.default_messages
    }

    /// Template for validator `kind`, or `""` when there is none.
    pub fn default_message(&self, kind: &str) -> &str {
        self.default_messages
            .get(kind)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Replaces the human labels used for `:field` in messages.
    pub fn set_labels<I, K, V>(&mut self, labels: I) -> &mut Self
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

    /// Human label for `field`: list selectors join their names with ", ".
    pub fn label(&self, field: &Field) -> String {
        match field {
            Field::Names(names) => names.join(", "),
            Field::Name(name) => self.labels.get(name).cloned().unwrap_or_else(|| name.clone()),
        }
    }

    /// Appends to the messages of the current run. Validators call this on failure.
    pub fn append_message(&mut self, message: Message) -> &mut Self {
        self.messages.append_message(message);
        self
    }

    /// Messages of the current or most recent run.
    pub fn messages(&self) -> &MessageGroup {
        &self.messages
    }

    /// Registers a hook run before any rule.
    ///
    /// The hook receives the data and entity passed to `validate` and the
    /// (empty) message collection of the run; returning `false` vetoes the
    /// run, which then yields [`ValidationOutcome::Vetoed`].
    ///
    /// # Examples
    ///
    /// ```
    /// use std::rc::Rc;
    /// use fieldcheck::{PresenceOf, Validation};
    /// use serde_json::json;
    ///
    /// let mut validation = Validation::new();
    /// validation.add("name", Rc::new(PresenceOf::default()))?;
    /// validation.before_validation(|data, _, _| data.is_some());
    /// assert!(validation.validate(None, None)?.is_vetoed());
    /// assert!(!validation.validate(Some(json!({})), None)?.is_vetoed());
    /// # Ok::<(), fieldcheck::ValidationFailure>(())
    /// ```
    pub fn before_validation<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(Option<&Value>, Option<&SharedEntity>, &mut MessageGroup) -> bool + 'static,
    {
        self.before_validation = Some(Rc::new(hook));
        self
    }

    /// Registers a hook run after both phases, with the run's messages.
    pub fn after_validation<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(Option<&Value>, Option<&SharedEntity>, &mut MessageGroup) + 'static,
    {
        self.after_validation = Some(Rc::new(hook));
        self
    }

    /// Runs every registered rule against `data` (or the bound entity).
    ///
    /// # Errors
    ///
    /// `NoValidators` when nothing is registered; `InvalidData` when `data` is
    /// not a JSON object; any structural error raised while resolving values.
    /// Validator failures are reported as messages, not errors.
    pub fn validate(
        &mut self,
        data: Option<Value>,
        entity: Option<SharedEntity>,
    ) -> ValidationResult<ValidationOutcome> {
        if self.validators.is_empty() && self.combined_validators.is_empty() {
            return Err(ValidationFailure::NoValidators);
        }

        self.values.clear();
        self.messages = MessageGroup::new();

        if let Some(entity) = &entity {
            self.set_entity(Rc::clone(entity));
        }

        if let Some(hook) = self.before_validation.clone() {
            if !hook(data.as_ref(), entity.as_ref(), &mut self.messages) {
                log::warn!("validation vetoed by before-validation hook");
                return Ok(ValidationOutcome::Vetoed);
            }
        }

        if let Some(raw) = &data {
            self.data = Some(DataSource::try_from(raw.clone())?);
        }

        log::debug!(
            "validating {} field rules and {} combined rules",
            self.validators.len(),
            self.combined_validators.len()
        );

        let rules = self.validators.clone();
        self.run_phase(&rules, Phase::Fields)?;

        let rules = self.combined_validators.clone();
        self.run_phase(&rules, Phase::Combined)?;

        if let Some(hook) = self.after_validation.clone() {
            hook(data.as_ref(), entity.as_ref(), &mut self.messages);
        }

        log::debug!("validation finished with {} messages", self.messages.len());
        Ok(ValidationOutcome::Checked(self.messages.clone()))
    }

    fn run_phase(&mut self, rules: &[Rule], phase: Phase) -> ValidationResult<()> {
        for rule in rules {
            let scope_ok = match phase {
                Phase::Fields => !rule.field.is_list(),
                Phase::Combined => rule.field.is_list(),
            };
            if !scope_ok || !rule.field.is_well_formed() {
                log::warn!("rejecting rule with malformed scope {:?}", rule.field);
                return Err(ValidationFailure::InvalidRuleScope);
            }

            let kind = rule.validator.kind();
            if kind.trim().is_empty() {
                return Err(ValidationFailure::InvalidValidator(kind.to_string()));
            }

            if self.pre_checking(&rule.field, rule.validator.as_ref())? {
                log::debug!("skipping {} on {}: empty value allowed", kind, rule.field);
                continue;
            }

            if !rule.validator.validate(self, &rule.field)?
                && rule.validator.flag("cancelOnFail", &rule.field)
            {
                log::debug!("{} failed on {}; cancelling {:?} phase", kind, rule.field, phase);
                break;
            }
        }
        Ok(())
    }

    /// Resolves the value of `field`.
    ///
    /// With an entity bound: named accessor, then attribute reader, then
    /// public property. Otherwise the bound data, with unfiltered values
    /// cached for the rest of the run. Filters, when configured, are applied
    /// to non-null values and written back to the entity.
    pub fn get_value(&mut self, field: &str) -> ValidationResult<Value> {
        let value = match &self.entity {
            Some(bound) => entity::resolve(&*bound.borrow(), field),
            None => {
                let data = self.data.as_ref().ok_or(ValidationFailure::NoDataToValidate)?;
                if let Some(cached) = self.values.get(field) {
                    return Ok(cached.clone());
                }
                data.lookup(field)
            }
        };

        if value.is_null() {
            return Ok(Value::Null);
        }

        if let Some(spec) = self.filters.get(field).filter(|spec| !spec.is_empty()) {
            let service = self
                .filter_service
                .as_ref()
                .ok_or(ValidationFailure::FilterServiceUnavailable)?;

            let filtered = service.sanitize(&value, spec).map_err(|err| match err {
                ValidationFailure::Filter { reason, .. } => ValidationFailure::Filter {
                    field: field.to_string(),
                    reason,
                },
                other => other,
            })?;

            if let Some(bound) = &self.entity {
                if !entity::write_back(&mut *bound.borrow_mut(), field, &filtered) {
                    log::debug!("no writable accessor for filtered field {}", field);
                }
            }
            return Ok(filtered);
        }

        if self.entity.is_none() {
            self.values.insert(field.to_string(), value.clone());
        }
        Ok(value)
    }

    /// Whether the rule should be skipped because its value is empty and the
    /// validator allows emptiness. For a list, the first skipping field wins.
    fn pre_checking(&mut self, field: &Field, validator: &dyn Validator) -> ValidationResult<bool> {
        match field {
            Field::Names(names) => {
                for name in names {
                    if self.pre_checking(&Field::Name(name.clone()), validator)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Field::Name(name) => {
                let allow_empty = match validator.options().resolve("allowEmpty", name) {
                    Some(value) if is_truthy(value) => value.clone(),
                    _ => return Ok(false),
                };

                if let Some(result) = validator.is_allow_empty(self, name) {
                    return result;
                }

                let value = self.get_value(name)?;
                match allow_empty {
                    Value::Array(sentinels) => Ok(sentinels.contains(&value)),
                    _ => Ok(is_empty(&value)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functional::filter::Filter;
    use crate::functional::validator::Options;
    use serde_json::json;
    use std::cell::{Cell, RefCell};

    /// Fails on every value, records the fields it saw.
    struct Recorder {
        kind: &'static str,
        options: Options,
        seen: Rc<RefCell<Vec<String>>>,
        combined: bool,
        verdict: bool,
    }

    impl Recorder {
        fn new(seen: &Rc<RefCell<Vec<String>>>) -> Self {
            Self {
                kind: "Recorder",
                options: Options::new(),
                seen: Rc::clone(seen),
                combined: false,
                verdict: false,
            }
        }
    }

    impl Validator for Recorder {
        fn kind(&self) -> &str {
            self.kind
        }

        fn options(&self) -> &Options {
            &self.options
        }

        fn is_combined(&self) -> bool {
            self.combined
        }

        fn validate(&self, validation: &mut Validation, field: &Field) -> ValidationResult<bool> {
            self.seen.borrow_mut().push(field.to_string());
            if !self.verdict {
                let message = Message::new("bad").with_field(field.clone()).with_kind(self.kind);
                validation.append_message(message);
            }
            Ok(self.verdict)
        }
    }

    struct CountingFilter {
        calls: Cell<usize>,
    }

    impl FilterService for CountingFilter {
        fn sanitize(&self, value: &Value, spec: &FilterSpec) -> ValidationResult<Value> {
            self.calls.set(self.calls.get() + 1);
            Filter::new().sanitize(value, spec)
        }
    }

    fn seen() -> Rc<RefCell<Vec<String>>> {
        Rc::new(RefCell::new(Vec::new()))
    }

    #[test]
    fn test_list_registration_expands_in_order() {
        let log = seen();
        let mut validation = Validation::new();
        validation.add(["a", "b", "c"], Rc::new(Recorder::new(&log))).unwrap();

        let fields: Vec<_> = validation
            .validators()
            .into_iter()
            .map(|(f, _)| f.to_string())
            .collect();
        assert_eq!(fields, vec!["a", "b", "c"]);
        assert!(validation.combined_validators().is_empty());
    }

    #[test]
    fn test_combined_validator_always_goes_to_combined_list() {
        let log = seen();
        let mut validation = Validation::new();
        let combined = || Rc::new(Recorder { combined: true, ..Recorder::new(&log) });
        validation.add("a", combined()).unwrap();
        validation.rule(vec!["a", "b"], combined()).unwrap();

        assert!(validation.validators().is_empty());
        let combined: Vec<_> = validation
            .combined_validators()
            .into_iter()
            .map(|(f, _)| f.clone())
            .collect();
        assert_eq!(combined, vec![Field::from(["a"]), Field::from(["a", "b"])]);
    }

    #[test]
    fn test_add_rejects_non_name_selectors() {
        let log = seen();
        let mut validation = Validation::new();
        let err = validation.add(json!(12), Rc::new(Recorder::new(&log))).err();
        assert!(matches!(err, Some(ValidationFailure::InvalidArgument(_))));
        assert!(validation.set_filters(json!({"x": 1}), "trim").is_err());
    }

    #[test]
    fn test_rules_adds_each_validator() {
        let log = seen();
        let mut validation = Validation::new();
        let first: Rc<dyn Validator> = Rc::new(Recorder::new(&log));
        let second: Rc<dyn Validator> = Rc::new(Recorder { kind: "Other", ..Recorder::new(&log) });
        validation.rules("name", vec![first, second]).unwrap();
        let kinds: Vec<_> = validation.validators().into_iter().map(|(_, k)| k).collect();
        assert_eq!(kinds, vec!["Recorder", "Other"]);
    }

    #[test]
    fn test_validate_without_rules_fails() {
        let mut validation = Validation::new();
        assert!(matches!(
            validation.validate(Some(json!({})), None),
            Err(ValidationFailure::NoValidators)
        ));
    }

    #[test]
    fn test_validate_rejects_non_object_data() {
        let log = seen();
        let mut validation = Validation::new();
        validation.add("a", Rc::new(Recorder::new(&log))).unwrap();
        assert!(matches!(
            validation.validate(Some(json!("scalar")), None),
            Err(ValidationFailure::InvalidData)
        ));
    }

    #[test]
    fn test_get_value_without_data() {
        let mut validation = Validation::new();
        assert!(matches!(
            validation.get_value("a"),
            Err(ValidationFailure::NoDataToValidate)
        ));
    }

    #[test]
    fn test_unfiltered_values_are_cached_per_run() {
        let mut validation = Validation::new();
        validation.set_data(DataSource::try_from(json!({"a": "x"})).unwrap());
        assert_eq!(validation.get_value("a").unwrap(), json!("x"));

        validation.set_data(DataSource::try_from(json!({"a": "changed"})).unwrap());
        assert_eq!(validation.get_value("a").unwrap(), json!("x"));
    }

    #[test]
    fn test_filtered_values_bypass_cache() {
        let counter = Rc::new(CountingFilter { calls: Cell::new(0) });
        let mut validation = Validation::new().with_filter_service(counter.clone());
        validation.set_filters("name", "upper").unwrap();
        validation.set_data(DataSource::try_from(json!({"name": "ada"})).unwrap());

        assert_eq!(validation.get_value("name").unwrap(), json!("ADA"));
        assert_eq!(validation.get_value("name").unwrap(), json!("ADA"));
        assert_eq!(counter.calls.get(), 2);
    }

    #[test]
    fn test_null_values_are_never_filtered() {
        let counter = Rc::new(CountingFilter { calls: Cell::new(0) });
        let mut validation = Validation::new().with_filter_service(counter.clone());
        validation.set_filters("name", "upper").unwrap();
        validation.set_data(DataSource::try_from(json!({})).unwrap());

        assert_eq!(validation.get_value("name").unwrap(), Value::Null);
        assert_eq!(counter.calls.get(), 0);
    }

    #[test]
    fn test_filter_without_service_fails() {
        let mut validation = Validation::new();
        validation.set_filters(["a", "b"], "trim").unwrap();
        validation.set_data(DataSource::try_from(json!({"b": " x "})).unwrap());
        assert!(matches!(
            validation.get_value("b"),
            Err(ValidationFailure::FilterServiceUnavailable)
        ));
    }

    #[test]
    fn test_filter_errors_name_the_field() {
        let mut validation = Validation::new().with_filter_service(Rc::new(Filter::new()));
        validation.set_filters("a", "nope").unwrap();
        validation.set_data(DataSource::try_from(json!({"a": "x"})).unwrap());
        match validation.get_value("a") {
            Err(ValidationFailure::Filter { field, .. }) => assert_eq!(field, "a"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_entity_values_write_back_and_skip_cache() {
        let profile = JsonEntity::try_from(json!({"name": "  ada "})).unwrap().into_shared();
        let mut validation = Validation::new().with_filter_service(Rc::new(Filter::new()));
        validation.set_filters("name", "trim").unwrap();
        validation.set_entity(Rc::clone(&profile));

        assert_eq!(validation.get_value("name").unwrap(), json!("ada"));
        assert_eq!(entity::resolve(&*profile.borrow(), "name"), json!("ada"));
        assert!(validation.values.is_empty());
    }

    #[test]
    fn test_label_resolution() {
        let mut validation = Validation::new();
        validation.set_labels([("email", "E-mail")]);
        assert_eq!(validation.label(&Field::from("email")), "E-mail");
        assert_eq!(validation.label(&Field::from("age")), "age");
        assert_eq!(validation.label(&Field::from(["a", "b"])), "a, b");
    }

    #[test]
    fn test_default_messages_merge() {
        let mut validation = Validation::new();
        validation.set_default_messages([("Between", "out of range")]);
        assert_eq!(validation.default_message("Between"), "out of range");
        assert_eq!(validation.default_message("PresenceOf"), "Field :field is required");
        assert_eq!(validation.default_message("Unknown"), "");
    }

    #[test]
    fn test_with_rules_rejects_unexpanded_list_at_run_time() {
        let log = seen();
        let recorder: Rc<dyn Validator> = Rc::new(Recorder::new(&log));
        let mut validation = Validation::with_rules(vec![(Field::from(["a", "b"]), recorder)]);
        assert!(matches!(
            validation.validate(Some(json!({})), None),
            Err(ValidationFailure::InvalidRuleScope)
        ));
    }

    #[test]
    fn test_combined_phase_rejects_empty_field_list() {
        let log = seen();
        let mut validation = Validation::new();
        let combined = Recorder { combined: true, ..Recorder::new(&log) };
        validation.add(Vec::<&str>::new(), Rc::new(combined)).unwrap();

        assert_eq!(validation.combined_validators().len(), 1);
        assert!(matches!(
            validation.validate(Some(json!({"a": 1})), None),
            Err(ValidationFailure::InvalidRuleScope)
        ));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_combined_phase_rejects_blank_name_in_list() {
        let log = seen();
        let mut validation = Validation::new();
        let combined = Recorder { combined: true, ..Recorder::new(&log) };
        validation.add(["a", ""], Rc::new(combined)).unwrap();

        assert!(matches!(
            validation.validate(Some(json!({"a": 1})), None),
            Err(ValidationFailure::InvalidRuleScope)
        ));
    }

    #[test]
    fn test_rules_accepts_every_selector_form() {
        let log = seen();
        let mut validation = Validation::new();
        let first: Rc<dyn Validator> = Rc::new(Recorder::new(&log));
        let second: Rc<dyn Validator> = Rc::new(Recorder { kind: "Other", ..Recorder::new(&log) });
        validation.rules(["a", "b"], vec![first.clone(), second.clone()]).unwrap();
        validation.rules(json!("c"), vec![first]).unwrap();
        assert!(validation.rules(json!(3), vec![second]).is_err());

        let rules: Vec<_> = validation
            .validators()
            .into_iter()
            .map(|(f, k)| format!("{}:{}", f, k))
            .collect();
        assert_eq!(rules, vec!["a:Recorder", "b:Recorder", "a:Other", "b:Other", "c:Recorder"]);
    }

    #[test]
    fn test_blank_kind_is_invalid_validator() {
        let log = seen();
        let mut validation = Validation::new();
        validation.add("a", Rc::new(Recorder { kind: " ", ..Recorder::new(&log) })).unwrap();
        assert!(matches!(
            validation.validate(Some(json!({})), None),
            Err(ValidationFailure::InvalidValidator(_))
        ));
    }

    #[test]
    fn test_allow_empty_sentinels_match_strictly() {
        let log = seen();
        let mut validation = Validation::new();
        let recorder = Recorder {
            options: Options::new().with("allowEmpty", json!(["n/a", 0])),
            ..Recorder::new(&log)
        };
        validation.add(["a", "b", "c"], Rc::new(recorder)).unwrap();
        validation
            .validate(Some(json!({"a": "n/a", "b": "0", "c": 0})), None)
            .unwrap();
        assert_eq!(*log.borrow(), vec!["b"]);
    }

    #[test]
    fn test_combined_skip_when_any_field_empty() {
        let log = seen();
        let mut validation = Validation::new();
        let recorder = Recorder {
            combined: true,
            options: Options::new().with("allowEmpty", true),
            ..Recorder::new(&log)
        };
        validation.add(["a", "b"], Rc::new(recorder)).unwrap();

        validation.validate(Some(json!({"a": "x", "b": ""})), None).unwrap();
        assert!(log.borrow().is_empty());

        validation.validate(Some(json!({"a": "x", "b": "y"})), None).unwrap();
        assert_eq!(*log.borrow(), vec!["a, b"]);
    }

    #[test]
    fn test_hooks_see_active_messages() {
        let log = seen();
        let mut validation = Validation::new();
        validation.add("a", Rc::new(Recorder::new(&log))).unwrap();
        validation.before_validation(|_, _, messages| {
            messages.append_message(Message::new("from before"));
            true
        });
        validation.after_validation(|_, _, messages| {
            messages.append_message(Message::new("from after"));
        });

        let outcome = validation.validate(Some(json!({"a": 1})), None).unwrap();
        let texts: Vec<_> = outcome.messages().unwrap().iter().map(|m| m.to_string()).collect();
        assert_eq!(texts, vec!["from before", "bad", "from after"]);
        assert_eq!(validation.messages().len(), 3);
    }

    #[test]
    fn test_before_hook_veto_stops_run() {
        let log = seen();
        let after_called = Rc::new(Cell::new(false));
        let flag = Rc::clone(&after_called);
        let mut validation = Validation::new();
        validation.add("a", Rc::new(Recorder::new(&log))).unwrap();
        validation.before_validation(|_, _, _| false);
        validation.after_validation(move |_, _, _| flag.set(true));

        let outcome = validation.validate(Some(json!({"a": 1})), None).unwrap();
        assert!(outcome.is_vetoed());
        assert!(log.borrow().is_empty());
        assert!(!after_called.get());
    }
}
