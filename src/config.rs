//! Run configuration: driver options plus logging options.
//!
//! The binary builds a [`Config`] from `Config::from_env` and then applies
//! its command-line flags on top.

use std::path::PathBuf;

use crate::error::AltsumResult;
use crate::logging::{self, LogFilter, LogFormat, LogLevel, LogSink, LoggerCore};

pub const LOG_ENV: &str = "ALTSUM_LOG";
pub const LOG_LEVEL_ENV: &str = "ALTSUM_LOG_LEVEL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DriverConfig {
    /// Print `n = ` / `m = ` before reading each bound.
    pub prompts: bool,
    /// Give up on the GCD after this many subtractions. `None` runs unbounded.
    pub gcd_limit: Option<u64>,
    pub output: OutputFormat,
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig {
            prompts: true,
            gcd_limit: None,
            output: OutputFormat::Text,
        }
    }
}

impl DriverConfig {
    /// JSON output is machine-read, so prompts are never interleaved with it.
    pub fn show_prompts(&self) -> bool {
        self.prompts && self.output == OutputFormat::Text
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    pub filter: LogFilter,
    pub format: LogFormat,
    pub file: Option<PathBuf>,
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            filter: LogFilter::default(),
            format: LogFormat::Text,
            file: None,
            timestamps: true,
        }
    }
}

impl LogConfig {
    pub fn build_logger(&self) -> LoggerCore {
        let sink = match &self.file {
            Some(path) => LogSink::File {
                path: path.clone(),
                append: true,
                file: None,
                failed: false,
            },
            None => LogSink::Stderr,
        };
        LoggerCore {
            filter: self.filter.clone(),
            format: self.format,
            timestamps: self.timestamps,
            sinks: vec![sink],
        }
    }

    /// Install this configuration as the process-wide logger.
    pub fn install(&self) {
        logging::install(self.build_logger());
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    pub driver: DriverConfig,
    pub log: LogConfig,
}

impl Config {
    /// Defaults, with the log filter taken from `ALTSUM_LOG`, or failing
    /// that a single level from `ALTSUM_LOG_LEVEL`.
    pub fn from_env() -> AltsumResult<Self> {
        Self::from_vars(
            std::env::var(LOG_ENV).ok().as_deref(),
            std::env::var(LOG_LEVEL_ENV).ok().as_deref(),
        )
    }

    pub fn from_vars(log: Option<&str>, log_level: Option<&str>) -> AltsumResult<Self> {
        let mut config = Config::default();
        if let Some(spec) = log {
            config.log.filter = logging::parse_filter(spec)?;
        } else if let Some(level) = log_level.and_then(LogLevel::parse_level) {
            config.log.filter.default = level;
        }
        Ok(config)
    }

    pub fn with_log_filter(mut self, spec: &str) -> AltsumResult<Self> {
        self.log.filter = logging::parse_filter(spec)?;
        Ok(self)
    }
}
