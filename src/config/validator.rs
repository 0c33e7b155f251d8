//! Validation of provider configuration.
//!
//! Collects every problem in one pass; the first error becomes the returned
//! [`ConfigError`], the rest stay available on [`ValidationResult`].

use tracing::debug;

use crate::error::{ConfigError, ProviderError, Result};

use super::parser::{ENV_CMA_TOKEN, ENV_ORGANIZATION_ID};
use super::provider::{ProviderConfig, SettleConfig};

/// Settling delays above this many milliseconds trigger a warning.
const SLOW_SETTLE_MS: u64 = 10_000;

/// Validator for provider configuration.
#[derive(Debug, Default)]
pub struct ConfigValidator;

/// Validation result containing all problems found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
    /// Environment variable that can supply the field, for required settings.
    pub env_var: Option<&'static str>,
}

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a provider configuration.
    ///
    /// # Errors
    ///
    /// Returns the first problem found if validation fails.
    pub fn validate(&self, config: &ProviderConfig) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();

        Self::validate_credentials(config, &mut result);
        Self::validate_endpoint(config, &mut result);
        Self::validate_settle(&config.settle, &mut result);

        let Some(first) = result.errors.first() else {
            debug!("Configuration validation passed");
            return Ok(result);
        };

        let error = match first.env_var {
            Some(env_var) => ConfigError::MissingSetting {
                field: first.field.clone(),
                env_var: env_var.to_string(),
            },
            None => ConfigError::validation(first.message.clone(), first.field.clone()),
        };
        Err(ProviderError::Config(error))
    }

    fn validate_credentials(config: &ProviderConfig, result: &mut ValidationResult) {
        if config.cma_token.trim().is_empty() {
            result.errors.push(ValidationError {
                field: String::from("cma_token"),
                message: String::from("A content management token is required"),
                env_var: Some(ENV_CMA_TOKEN),
            });
        }

        if config.organization_id.trim().is_empty() {
            result.errors.push(ValidationError {
                field: String::from("organization_id"),
                message: String::from("An organization ID is required"),
                env_var: Some(ENV_ORGANIZATION_ID),
            });
        }
    }

    fn validate_endpoint(config: &ProviderConfig, result: &mut ValidationResult) {
        let url = config.base_url.as_str();
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            result.errors.push(ValidationError {
                field: String::from("base_url"),
                message: format!("Base URL '{url}' must start with http:// or https://"),
                env_var: None,
            });
        } else if url.starts_with("http://") {
            result
                .warnings
                .push(format!("Base URL '{url}' does not use TLS"));
        }

        if config.environment.trim().is_empty() {
            result.errors.push(ValidationError {
                field: String::from("environment"),
                message: String::from("Environment cannot be empty"),
                env_var: None,
            });
        }
    }

    fn validate_settle(settle: &SettleConfig, result: &mut ValidationResult) {
        if settle.max_attempts == 0 {
            result.errors.push(ValidationError {
                field: String::from("settle.max_attempts"),
                message: String::from("Settling needs at least one attempt"),
                env_var: None,
            });
        }

        if settle.multiplier == 0 {
            result.errors.push(ValidationError {
                field: String::from("settle.multiplier"),
                message: String::from("Settle multiplier must be at least 1"),
                env_var: None,
            });
        }

        if !settle.is_enabled() {
            result.warnings.push(String::from(
                "Asset settling is disabled; lifecycle calls may hit version conflicts",
            ));
        } else if settle.initial_delay_ms > SLOW_SETTLE_MS {
            result.warnings.push(format!(
                "Initial settle delay of {}ms slows down every asset write",
                settle.initial_delay_ms
            ));
        }
    }
}

impl ValidationResult {
    /// Returns true if validation passed (no errors).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of errors.
    #[must_use]
    pub const fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Returns the number of warnings.
    #[must_use]
    pub const fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}
