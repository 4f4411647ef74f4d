//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Convert the first error into a [`ConfigError`].
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(e) => Err(ConfigError::InvalidValue {
                field: e.path,
                message: e.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_rate_limit(config, &mut result);
        Self::validate_messages(config, &mut result);
        Self::validate_history(config, &mut result);
        Self::validate_recovery(config, &mut result);

        result
    }

    fn validate_rate_limit(config: &Config, result: &mut ValidationResult) {
        let limits = &config.rate_limit;

        if limits.max_per_hour == 0 {
            result.add_error(ValidationError::new(
                "rate_limit.max_per_hour",
                "max_per_hour must be greater than 0",
            ));
        }

        if limits.max_per_day == 0 {
            result.add_error(ValidationError::new(
                "rate_limit.max_per_day",
                "max_per_day must be greater than 0",
            ));
        }

        if limits.max_per_hour > limits.max_per_day {
            result.add_error(ValidationError::new(
                "rate_limit.max_per_hour",
                "max_per_hour cannot exceed max_per_day",
            ));
        }

        if limits.interaction_delay_ms < 1000 {
            result.add_warning(ValidationWarning::new(
                "rate_limit.interaction_delay_ms",
                "delays under one second are likely to trigger platform blocks",
            ));
        }
    }

    fn validate_messages(config: &Config, result: &mut ValidationResult) {
        if config.messages.templates.iter().all(|t| t.trim().is_empty()) {
            result.add_warning(ValidationWarning::new(
                "messages.templates",
                "no message templates configured, the built-in default will be sent",
            ));
        }
    }

    fn validate_history(config: &Config, result: &mut ValidationResult) {
        if config.history.cap_per_scope == 0 {
            result.add_error(ValidationError::new(
                "history.cap_per_scope",
                "cap_per_scope must be greater than 0",
            ));
        }
    }

    fn validate_recovery(config: &Config, result: &mut ValidationResult) {
        if config.recovery.scan_interval_secs == 0 {
            result.add_error(ValidationError::new(
                "recovery.scan_interval_secs",
                "scan_interval_secs must be greater than 0",
            ));
        }

        if config.recovery.consecutive_failure_threshold == 0 {
            result.add_error(ValidationError::new(
                "recovery.consecutive_failure_threshold",
                "consecutive_failure_threshold must be greater than 0",
            ));
        }

        for (i, marker) in config.recovery.failure_markers.iter().enumerate() {
            if let Err(e) = regex::Regex::new(marker) {
                result.add_error(ValidationError::new(
                    format!("recovery.failure_markers[{}]", i),
                    format!("invalid pattern: {}", e),
                ));
            }
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
