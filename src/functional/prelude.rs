//! Prelude for declaring validations
//!
//! Re-exports the engine, the validator contract and the built-in validators
//! so rule declarations need a single import.

pub use crate::functional::filter::{Filter, FilterService, FilterSpec};
pub use crate::functional::validation_engine::{Validation, ValidationOutcome};
pub use crate::functional::validation_rules::{
    AllOrNone, Alnum, Alpha, Between, Callback, CallbackResult, CallbackSubject, File,
    MutuallyExclusive, Numericality, PresenceOf,
};
pub use crate::functional::validator::{OptionValue, Options, Validator};
pub use crate::models::field::Field;
pub use crate::models::message::{Message, MessageGroup};
