//! Configuration module for tgscout
//!
//! Settings arrive in layers (TOML file, environment, command line) that are
//! merged and validated into an immutable [`RunConfig`].
//!
//! # Example
//!
//! ```no_run
//! use tgscout::config::{resolve_config, ConfigLayer};
//!
//! let cli = ConfigLayer {
//!     category: Some("news".to_string()),
//!     pages: Some(3),
//!     ..Default::default()
//! };
//! let config = resolve_config(cli, ConfigLayer::default(), None).unwrap();
//! println!("Will fetch {} pages", config.effective_pages());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ConfigLayer, ContentType, FetchConfig, PacingConfig, RunConfig, Target, DEFAULT_BASE_URL,
};

// Re-export parser functions
pub use parser::{
    env_layer, load_config_file, resolve_config, ENV_DELAY_BASE, ENV_DELAY_JITTER, ENV_PROXY,
};
pub use validation::{MAX_ATTEMPTS_LIMIT, MAX_PAGES};
