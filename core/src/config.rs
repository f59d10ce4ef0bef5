//! Configuration
//!
//! Layers, lowest to highest priority:
//! 1. Built-in defaults
//! 2. A TOML file (`CADENCE_CONFIG_PATH`, else `cadence.toml` if present)
//! 3. Environment variables (`CADENCE_SCHEDULER__FRAME_RATE=60`, ...)
//! 4. Explicit builder overrides
//!
//! A `.env` file in the working directory is loaded first.

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PREFIX: &str = "CADENCE";
const CONFIG_PATH_VAR: &str = "CADENCE_CONFIG_PATH";
const DEFAULT_CONFIG_FILE: &str = "cadence.toml";
/// 0.75 of a 30 fps frame
const DEFAULT_WORK_TIME: Duration = Duration::from_millis(25);

/// What the scheduler does when a block body fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPolicy {
    /// Propagate out of `step_threads`, ending the frame
    #[default]
    AbortFrame,
    /// Log, retire the failing thread and keep going
    RetireThread,
}

impl ErrorPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorPolicy::AbortFrame => "abort-frame",
            ErrorPolicy::RetireThread => "retire-thread",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Host frames per second
    pub frame_rate: f64,
    /// Keep stepping after a redraw request
    pub turbo: bool,
    /// Share of each frame spent stepping threads
    pub work_fraction: f64,
    pub error_policy: ErrorPolicy,
}

impl SchedulerConfig {
    /// Per-frame work budget. An unusable frame rate or fraction falls back
    /// to the default budget.
    pub fn work_time(&self) -> Duration {
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return DEFAULT_WORK_TIME;
        }
        Duration::try_from_secs_f64(self.work_fraction / self.frame_rate)
            .unwrap_or(DEFAULT_WORK_TIME)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            frame_rate: 30.0,
            turbo: false,
            work_fraction: 0.75,
            error_policy: ErrorPolicy::AbortFrame,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub scheduler: SchedulerConfig,
    pub logging: LoggingConfig,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load from the default sources with no overrides
    pub fn load() -> Result<Self> {
        Self::builder().build()
    }

    pub fn validate(&self) -> Result<()> {
        let s = &self.scheduler;
        ensure!(
            s.frame_rate.is_finite() && s.frame_rate > 0.0,
            "scheduler.frame_rate must be a positive number, got {}",
            s.frame_rate
        );
        ensure!(
            s.work_fraction > 0.0 && s.work_fraction <= 1.0,
            "scheduler.work_fraction must be in (0, 1], got {}",
            s.work_fraction
        );
        Ok(())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to render configuration")
    }
}

/// Builder for [`Config`]
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config_path: Option<PathBuf>,
    frame_rate: Option<f64>,
    turbo: Option<bool>,
    error_policy: Option<ErrorPolicy>,
    environment: bool,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            config_path: None,
            frame_rate: None,
            turbo: None,
            error_policy: None,
            environment: true,
        }
    }
}

impl ConfigBuilder {
    /// Config file path (overrides default search)
    pub fn config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    pub fn frame_rate(mut self, frame_rate: Option<f64>) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    pub fn turbo(mut self, turbo: Option<bool>) -> Self {
        self.turbo = turbo;
        self
    }

    pub fn error_policy(mut self, policy: Option<ErrorPolicy>) -> Self {
        self.error_policy = policy;
        self
    }

    /// Whether `.env` and `CADENCE_*` variables are read (on by default)
    pub fn environment(mut self, enabled: bool) -> Self {
        self.environment = enabled;
        self
    }

    pub fn build(self) -> Result<Config> {
        if self.environment {
            // A missing .env is fine
            let _ = dotenvy::dotenv();
        }

        let defaults = Config::default();
        let mut builder = config::Config::builder()
            .set_default("scheduler.frame_rate", defaults.scheduler.frame_rate)?
            .set_default("scheduler.turbo", defaults.scheduler.turbo)?
            .set_default("scheduler.work_fraction", defaults.scheduler.work_fraction)?
            .set_default("scheduler.error_policy", defaults.scheduler.error_policy.as_str())?
            .set_default("logging.level", defaults.logging.level)?;

        let path = self.config_path.clone().or_else(|| {
            self.environment
                .then(|| std::env::var(CONFIG_PATH_VAR).ok().map(PathBuf::from))
                .flatten()
        });
        match path {
            Some(path) => {
                ensure!(path.exists(), "config file not found: {}", path.display());
                builder = builder.add_source(config::File::from(path));
            }
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                builder = builder.add_source(config::File::with_name(DEFAULT_CONFIG_FILE));
            }
            None => {}
        }

        if self.environment {
            builder = builder.add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        if let Some(frame_rate) = self.frame_rate {
            builder = builder.set_override("scheduler.frame_rate", frame_rate)?;
        }
        if let Some(turbo) = self.turbo {
            builder = builder.set_override("scheduler.turbo", turbo)?;
        }
        if let Some(policy) = self.error_policy {
            builder = builder.set_override("scheduler.error_policy", policy.as_str())?;
        }

        let config: Config = builder
            .build()
            .context("Failed to read configuration sources")?
            .try_deserialize()
            .context("Invalid configuration")?;
        config.validate()?;
        Ok(config)
    }
}
