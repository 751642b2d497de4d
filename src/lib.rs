//! flowbake: static exporter for dynamically hosted marketing sites
//!
//! This crate mirrors a live site (the dev host) into a static bundle that
//! references a production target host. It discovers every page from the
//! sitemap and the home page links, fetches pages and shared assets with
//! bounded retries, and rewrites each page so that it embeds a pruned
//! stylesheet and points at locally relocated scripts and images.

pub mod config;
pub mod crawler;
pub mod output;
pub mod rewrite;
pub mod url;

use thiserror::Error;

/// Main error type for flowbake operations
#[derive(Debug, Error)]
pub enum BakeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("No {kind} reference found on the home page")]
    AssetNotFound { kind: crawler::AssetKind },

    #[error("Failed to build page '{path}': {source}")]
    Page {
        path: String,
        #[source]
        source: Box<BakeError>,
    },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Invalid asset pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BakeError {
    /// Wraps an error with the manifest path of the page that produced it
    pub fn for_page(path: &str, source: BakeError) -> Self {
        Self::Page {
            path: path.to_string(),
            source: Box::new(source),
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Terminal fetch failures
///
/// Transient failures never leave the fetcher; they are retried until the
/// attempt budget runs out and only then surface as `GaveUp`.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Giving up on {url} after {attempts} attempts: {reason}")]
    GaveUp {
        url: String,
        attempts: u32,
        reason: String,
    },

    #[error("Request for {url} failed: {reason}")]
    Request { url: String, reason: String },
}

/// Result type alias for flowbake operations
pub type Result<T> = std::result::Result<T, BakeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Exporter, RetryingFetcher};
pub use output::{DirectoryMaterializer, ExportBundle, Materializer};
pub use rewrite::{ContentRewriter, ImageRegistry};
pub use url::Site;
