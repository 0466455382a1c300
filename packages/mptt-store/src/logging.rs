//! Logging initialisation
//!
//! Installs a `tracing` subscriber writing to stderr. `MPTT_LOG` (standard
//! `EnvFilter` directives) takes precedence over the configured level.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::{ConfigResult, LogFormat, LoggingConfig};

pub const ENV_LOG_FILTER: &str = "MPTT_LOG";

fn build_env_filter(config: &LoggingConfig) -> ConfigResult<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_env(ENV_LOG_FILTER) {
        return Ok(filter);
    }
    let level = config.level_filter()?;
    Ok(EnvFilter::default().add_directive(level.into()))
}

/// Install the global subscriber
///
/// Returns `Ok(false)` when a subscriber was already installed (tests, or a
/// host application that configured its own).
pub fn init_logging(config: &LoggingConfig) -> ConfigResult<bool> {
    let filter = build_env_filter(config)?;
    let registry = Registry::default().with(filter);

    let installed = match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .is_ok(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .is_ok(),
    };
    Ok(installed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_is_rejected() {
        let config = LoggingConfig {
            level: "chatty".to_string(),
            format: LogFormat::Compact,
        };
        // Only reached when MPTT_LOG is unset, which is the case under cargo test
        if std::env::var(ENV_LOG_FILTER).is_err() {
            assert!(init_logging(&config).is_err());
        }
    }

    #[test]
    fn test_second_init_is_harmless() {
        let config = LoggingConfig::default();
        let _ = init_logging(&config).unwrap();
        assert!(!init_logging(&config).unwrap());
    }
}
