//! Configuration for rule sets and logging
//!
//! Every section has sensible defaults, so an empty file (or no file at
//! all) is a valid configuration. Values can be overridden from the
//! environment with the `TREE_PROJECTOR_` prefix, using `__` between
//! section and key (e.g. `TREE_PROJECTOR_LOGGING__LEVEL=debug`).

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::selector::MatchStrategy;

const ENV_PREFIX: &str = "TREE_PROJECTOR";
const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub rules: RuleSetConfig,
    pub logging: LoggingConfig,
}

/// Behaviour of a single rule set
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSetConfig {
    /// How compiled selectors test nodes
    pub match_strategy: MatchStrategy,

    /// Warn about visited nodes that no rule matched
    pub warn_unmatched: bool,

    /// Warn when a selector is registered twice in the same mode
    pub warn_redefined: bool,
}

impl Default for RuleSetConfig {
    fn default() -> Self {
        Self {
            match_strategy: MatchStrategy::Cached,
            warn_unmatched: true,
            warn_redefined: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    /// Module-specific log level filters (e.g., "tree_projector::selector": "debug")
    pub module_filters: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            module_filters: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Load from a file (format taken from its extension) plus environment overrides.
    pub fn from_file(path: &Path) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .add_source(::config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let levels = std::iter::once(&self.logging.level).chain(self.logging.module_filters.values());
        for level in levels {
            if !LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
                return Err(Error::Config {
                    message: format!("unknown log level '{level}'"),
                });
            }
        }
        Ok(())
    }
}
