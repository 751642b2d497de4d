//! Configuration module for flowbake
//!
//! This module handles loading, parsing, and validating the TOML build descriptor.
//!
//! # Example
//!
//! ```no_run
//! use flowbake::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("flowbake.toml")).unwrap();
//! println!("Exporting {} to {}", config.site, config.target_host);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{BuildConfig, Config, FetchConfig, PlatformConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
