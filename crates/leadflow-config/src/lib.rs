//! # LeadFlow Config
//!
//! Configuration management for the LeadFlow outreach engine.

mod error;
mod loader;
mod options;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use options::RuntimeOptions;
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
