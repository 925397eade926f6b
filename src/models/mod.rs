pub mod entity;
pub mod field;
pub mod message;
pub mod value;
