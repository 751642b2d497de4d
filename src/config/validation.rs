use crate::config::types::{BuildConfig, Config, FetchConfig, PlatformConfig};
use crate::url::normalize_host;
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_hosts(config)?;
    validate_fetch_config(&config.fetch)?;
    validate_build_config(&config.build)?;
    validate_platform_config(&config.platform)?;
    Ok(())
}

/// Validates the dev and target hosts
///
/// Both are required; an empty value is reported as a missing field so the
/// caller can tell "forgot it" apart from "wrote it wrong".
fn validate_hosts(config: &Config) -> Result<(), ConfigError> {
    if config.site.trim().is_empty() {
        return Err(ConfigError::MissingField("site"));
    }
    if config.target_host.trim().is_empty() {
        return Err(ConfigError::MissingField("target-host"));
    }

    normalize_host(&config.site)?;
    normalize_host(&config.target_host)?;
    Ok(())
}

fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_build_config(config: &BuildConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 64 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 64, got {}",
            config.concurrency
        )));
    }

    if config.output_dir.is_empty() {
        return Err(ConfigError::Validation(
            "output-dir cannot be empty".to_string(),
        ));
    }

    if config.assets_dir.is_empty()
        || config.assets_dir.contains('/')
        || config.assets_dir.contains('\\')
        || config.assets_dir.starts_with('.')
    {
        return Err(ConfigError::Validation(format!(
            "assets-dir must be a single plain directory name, got '{}'",
            config.assets_dir
        )));
    }

    validate_marker("image-marker", &config.image_marker)?;
    validate_marker("skip-sitemap-marker", &config.skip_sitemap_marker)?;
    validate_marker("skip-fetch-marker", &config.skip_fetch_marker)?;

    ::url::Url::parse(&config.proxy_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy-url: {}", e)))?;

    Ok(())
}

fn validate_platform_config(config: &PlatformConfig) -> Result<(), ConfigError> {
    if config.asset_hosts.is_empty() {
        return Err(ConfigError::Validation(
            "asset-hosts must list at least one host".to_string(),
        ));
    }
    if config.library_hosts.is_empty() {
        return Err(ConfigError::Validation(
            "library-hosts must list at least one host".to_string(),
        ));
    }

    for host in config.asset_hosts.iter().chain(&config.library_hosts) {
        if host.is_empty() || host.contains('/') || host.chars().any(char::is_whitespace) {
            return Err(ConfigError::Validation(format!(
                "Platform host '{}' must be a bare host name",
                host
            )));
        }
    }

    Ok(())
}

/// Marker attributes end up inside CSS attribute selectors, so they must be
/// plain attribute names.
fn validate_marker(field: &str, marker: &str) -> Result<(), ConfigError> {
    let valid = marker
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic())
        && marker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if !valid {
        return Err(ConfigError::Validation(format!(
            "{} must be a plain attribute name, got '{}'",
            field, marker
        )));
    }
    Ok(())
}
