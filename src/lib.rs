//! Declarative field validation.
//!
//! Rules pair a field (or a list of fields) with a [`Validator`]. A
//! [`Validation`] runs them against a JSON data map or a bound [`Entity`],
//! optionally sanitizing values first, and collects failures into a
//! [`MessageGroup`].

pub mod config;
pub mod error;
pub mod functional;
pub mod models;
pub mod utils;

pub use config::ValidationConfig;
pub use error::{ValidationFailure, ValidationResult};
pub use functional::filter::{Filter, FilterService, FilterSpec};
pub use functional::validation_engine::{
    AfterValidation, BeforeValidation, Validation, ValidationOutcome,
};
pub use functional::validation_rules::{
    AllOrNone, Alnum, Alpha, Between, Callback, CallbackResult, CallbackSubject, File,
    MutuallyExclusive, Numericality, PresenceOf,
};
pub use functional::validator::{OptionValue, Options, Validator};
pub use models::entity::{share, DataSource, Entity, JsonEntity, SharedEntity};
pub use models::field::Field;
pub use models::message::{Message, MessageGroup};
