//! Provider configuration types.
//!
//! A [`ProviderConfig`] is built once (from a YAML file, the environment, or
//! both) and passed by reference to every reconciler. Nothing here is global.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default content management API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.contentful.com";

/// Default environment entries and assets are reconciled in.
pub const DEFAULT_ENVIRONMENT: &str = "master";

/// Configuration for one provider instance.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Content management API token.
    #[serde(default)]
    pub cma_token: String,
    /// Organization that owns created spaces.
    #[serde(default)]
    pub organization_id: String,
    /// API endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Environment for entries and assets.
    #[serde(default = "default_environment")]
    pub environment: String,
    /// Verbose logging.
    #[serde(default)]
    pub debug: bool,
    /// Asset settling policy.
    #[serde(default)]
    pub settle: SettleConfig,
}

/// Backoff policy used while waiting for a processed asset's version to settle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SettleConfig {
    /// Delay before the first poll, in milliseconds. Zero disables waiting.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Factor applied to the delay after each poll.
    #[serde(default = "default_multiplier")]
    pub multiplier: u32,
    /// Upper bound on polls.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl ProviderConfig {
    /// Creates a configuration with default endpoint, environment and settling.
    #[must_use]
    pub fn new(cma_token: impl Into<String>, organization_id: impl Into<String>) -> Self {
        Self {
            cma_token: cma_token.into(),
            organization_id: organization_id.into(),
            ..Self::default()
        }
    }

    /// Sets the debug flag.
    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Replaces the settling policy.
    #[must_use]
    pub const fn with_settle(mut self, settle: SettleConfig) -> Self {
        self.settle = settle;
        self
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            cma_token: String::new(),
            organization_id: String::new(),
            base_url: default_base_url(),
            environment: default_environment(),
            debug: false,
            settle: SettleConfig::default(),
        }
    }
}

// The token never reaches logs.
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = if self.cma_token.is_empty() { "" } else { "<redacted>" };
        f.debug_struct("ProviderConfig")
            .field("cma_token", &token)
            .field("organization_id", &self.organization_id)
            .field("base_url", &self.base_url)
            .field("environment", &self.environment)
            .field("debug", &self.debug)
            .field("settle", &self.settle)
            .finish()
    }
}

impl SettleConfig {
    /// A policy that never waits.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            initial_delay_ms: 0,
            multiplier: 1,
            max_attempts: 1,
        }
    }

    /// Returns true if settling waits at all.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.initial_delay_ms > 0
    }

    /// Delay before poll number `attempt` (zero-based).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = u64::from(self.multiplier.max(1)).saturating_pow(attempt);
        Duration::from_millis(self.initial_delay_ms.saturating_mul(factor))
    }
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            multiplier: default_multiplier(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_base_url() -> String {
    String::from(DEFAULT_BASE_URL)
}

fn default_environment() -> String {
    String::from(DEFAULT_ENVIRONMENT)
}

const fn default_initial_delay_ms() -> u64 {
    250
}

const fn default_multiplier() -> u32 {
    2
}

const fn default_max_attempts() -> u32 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProviderConfig::default();
        assert_eq!(config.base_url, "https://api.contentful.com");
        assert_eq!(config.environment, "master");
        assert!(!config.debug);
        assert_eq!(config.settle.initial_delay_ms, 250);
        assert_eq!(config.settle.multiplier, 2);
        assert_eq!(config.settle.max_attempts, 5);
    }

    #[test]
    fn test_settle_delay_backoff() {
        let settle = SettleConfig::default();
        assert_eq!(settle.delay(0), Duration::from_millis(250));
        assert_eq!(settle.delay(1), Duration::from_millis(500));
        assert_eq!(settle.delay(3), Duration::from_millis(2000));
        assert!(!SettleConfig::disabled().is_enabled());
        assert_eq!(SettleConfig::disabled().delay(4), Duration::ZERO);
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = ProviderConfig::new("CFPAT-secret", "org");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("CFPAT-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
