//! Rune animation configuration system
//!
//! This crate provides centralized configuration management for the timing
//! engine and its demo binary, loading settings from `rune.toml` with
//! environment variable overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Lowest tick rate the time manager will run at.
pub const MIN_FPS: u32 = 5;
/// Highest tick rate the time manager will run at.
pub const MAX_FPS: u32 = 50;
/// Default number of unpolled clock events kept before the oldest are dropped.
pub const DEFAULT_EVENT_QUEUE_CAPACITY: usize = 1024;

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct RuneConfig {
    /// Tick source settings
    pub timing: TimingConfig,
    /// Log output settings
    pub logging: LoggingConfig,
    /// Demo application settings
    pub demo: DemoConfig,
}

/// Tick source configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    /// Upper bound on ticks per second, clamped to `[MIN_FPS, MAX_FPS]`
    pub max_fps: u32,
    /// Drive time manually instead of from the OS monotonic clock
    pub manual_time_source: bool,
    /// Unpolled clock events retained; older events are dropped first
    pub event_queue_capacity: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` env-filter directive, e.g. `info` or `rune_timing=trace`
    pub filter: String,
}

/// Demo application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DemoConfig {
    /// How long the demo keeps ticking, in milliseconds
    pub duration_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            max_fps: MAX_FPS,
            manual_time_source: false,
            event_queue_capacity: DEFAULT_EVENT_QUEUE_CAPACITY,
        }
    }
}

impl TimingConfig {
    /// Tick rate after clamping to the supported range.
    pub fn effective_fps(&self) -> u32 {
        self.max_fps.clamp(MIN_FPS, MAX_FPS)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self { duration_ms: 1500 }
    }
}

fn parse_flag(val: &str) -> bool {
    val == "1" || val.eq_ignore_ascii_case("true")
}

impl RuneConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration from the default location (rune.toml in the current directory)
    /// or return default configuration if file doesn't exist
    pub fn load_or_default() -> Self {
        Self::load_from_file("rune.toml").unwrap_or_default()
    }

    /// Merge configuration with environment variables
    ///
    /// Environment variables take precedence over configuration file values.
    pub fn merge_with_env(&mut self) {
        if let Ok(val) = std::env::var("RUNE_MAX_FPS") {
            if let Ok(fps) = val.parse::<u32>() {
                self.timing.max_fps = fps;
            }
        }
        if let Ok(val) = std::env::var("RUNE_MANUAL_TIMESOURCE") {
            self.timing.manual_time_source = parse_flag(&val);
        }
        if let Ok(val) = std::env::var("RUNE_EVENT_QUEUE_CAPACITY") {
            if let Ok(capacity) = val.parse::<usize>() {
                self.timing.event_queue_capacity = capacity;
            }
        }
        if let Ok(filter) = std::env::var("RUNE_LOG") {
            self.logging.filter = filter;
        }
        if let Ok(val) = std::env::var("RUNE_DEMO_DURATION_MS") {
            if let Ok(ms) = val.parse::<u64>() {
                self.demo.duration_ms = ms;
            }
        }
    }

    /// Load configuration with environment variable overrides
    ///
    /// 1. Load from rune.toml (or use defaults if not found)
    /// 2. Override with environment variables if present
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }
}
