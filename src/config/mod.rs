//! Provider configuration.
//!
//! - Loading from YAML files, `.env` files and environment variables
//! - Validation of configuration values

mod parser;
mod provider;
mod validator;

pub use parser::{
    ConfigParser, ENV_BASE_URL, ENV_CMA_TOKEN, ENV_DEBUG, ENV_ENVIRONMENT, ENV_ORGANIZATION_ID,
};
pub use provider::{DEFAULT_BASE_URL, DEFAULT_ENVIRONMENT, ProviderConfig, SettleConfig};
pub use validator::{ConfigValidator, ValidationError, ValidationResult};
