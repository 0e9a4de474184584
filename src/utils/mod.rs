pub mod error;
pub mod form;
pub mod logger;
pub mod validation;
