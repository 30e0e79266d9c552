//! tgscout: a polite scraper for Telegram catalogue ratings
//!
//! This crate walks the paginated channel and chat ratings of a catalogue site,
//! extracts one record per listed entity (title, subscriber count, `t.me` link)
//! and writes them to a CSV file per content type. Requests are paced with a
//! randomised delay and retried with exponential backoff on rate limiting.

pub mod config;
pub mod crawler;
pub mod output;
pub mod record;
pub mod state;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for tgscout operations
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error for {url}: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("Rate limit still in effect for {url} after {attempts} attempts")]
    RateLimitExceeded { url: String, attempts: u32 },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Unexpected page structure: {message}")]
    ParseAnomaly { message: String },

    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::RunState,
        to: state::RunState,
    },

    #[error("Output error: {0}")]
    Write(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl ScoutError {
    /// Returns true if the error aborts the whole run
    ///
    /// Page-level failures (transport, rate limiting, unexpected statuses and
    /// parse anomalies) are contained by the coordinator; everything else
    /// terminates the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::Transport { .. }
                | Self::RateLimitExceeded { .. }
                | Self::HttpStatus { .. }
                | Self::ParseAnomaly { .. }
        )
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unknown category code '{0}' (see --list-categories)")]
    UnknownCategory(String),

    #[error("Invalid value for environment variable {name}: {value}")]
    Env { name: String, value: String },
}

/// Result type alias for tgscout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{ContentType, RunConfig};
pub use record::Record;
pub use state::RunState;
