//! Logging setup
//!
//! The library itself only emits `tracing` events. Binaries call
//! [`init_logging`] once to print them to stderr; `RUST_LOG` overrides the
//! configured level when set.

use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::LoggingConfig;
use crate::error::{Error, Result};

/// Initialize logging with default configuration
pub fn init_logging() -> Result<()> {
    init_logging_with_config(&LoggingConfig::default())
}

/// Initialize logging with custom configuration.
///
/// Calling this again after a subscriber is installed is a no-op.
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => build_filter(config)?,
    };

    let (json_layer, text_layer) = if config.json_format {
        let layer = fmt::Layer::new()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true);
        (Some(layer), None)
    } else {
        let layer = fmt::Layer::new()
            .with_writer(std::io::stderr)
            .with_target(false);
        (None, Some(layer))
    };

    let installed = Registry::default()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .try_init();
    if let Err(e) = installed {
        debug!("Logging already initialized: {}", e);
    }
    Ok(())
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let mut filter = EnvFilter::try_new(&config.level).map_err(|e| Error::Config {
        message: format!("invalid log level '{}': {}", config.level, e),
    })?;

    for (module, level) in &config.module_filters {
        let directive = format!("{module}={level}").parse().map_err(|e| Error::Config {
            message: format!("invalid log filter '{module}={level}': {e}"),
        })?;
        filter = filter.add_directive(directive);
    }
    Ok(filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert!(!config.level.is_empty());
        assert!(!config.json_format);
    }

    #[test]
    fn module_filters_become_directives() {
        let mut config = LoggingConfig::default();
        config
            .module_filters
            .insert("tree_projector::selector".to_string(), "debug".to_string());
        assert!(build_filter(&config).is_ok());

        config.module_filters.insert("bad module".to_string(), "???".to_string());
        assert!(matches!(build_filter(&config), Err(Error::Config { .. })));
    }

    #[test]
    fn repeated_initialization_is_harmless() {
        assert!(init_logging().is_ok());
        assert!(init_logging().is_ok());
    }
}
