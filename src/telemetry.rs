//! Logging setup.
//!
//! Installs the global `tracing` subscriber at most once per process. There
//! is no teardown; later calls leave the first subscriber in place.

use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

use crate::config::ProviderConfig;

static INSTALLED: OnceLock<bool> = OnceLock::new();

/// Builds the log filter: `RUST_LOG` when set, otherwise `debug` or `info`
/// depending on the configuration's debug flag.
#[must_use]
pub fn filter_for(config: &ProviderConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config.debug {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    })
}

/// Installs the global subscriber.
///
/// Returns true only for the call that installed it. Returns false on every
/// later call, and when another subscriber was already set by the host.
pub fn init(config: &ProviderConfig) -> bool {
    let mut installed_now = false;
    INSTALLED.get_or_init(|| {
        installed_now = tracing_subscriber::fmt()
            .with_env_filter(filter_for(config))
            .with_target(false)
            .try_init()
            .is_ok();
        installed_now
    });
    installed_now
}

/// Returns true once a subscriber has been installed by [`init`].
#[must_use]
pub fn is_initialized() -> bool {
    INSTALLED.get().copied().unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_once() {
        let config = ProviderConfig::default().with_debug(true);
        let first = init(&config);
        assert!(!init(&config));
        assert_eq!(is_initialized(), first);
    }
}
