//! Logging setup
//!
//! The engine only emits `tracing` events; hosts decide whether to install a
//! subscriber. [`init`] installs a plain fmt subscriber that honours
//! `RUST_LOG` and otherwise uses the configured level.

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Returns false if one was already set.
pub fn init(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_harmless() {
        let config = LoggingConfig::default();
        let _ = init(&config);
        assert!(!init(&config));
    }
}
