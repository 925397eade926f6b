pub mod filter;
pub mod prelude;
pub mod validation_engine;
pub mod validation_rules;
pub mod validator;
