use crate::ConfigError;
use url::Url;

/// Normalizes a configured host URL
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace
/// 2. Parse the URL; reject if malformed
/// 3. Require an `http` or `https` scheme and a host
/// 4. Drop every trailing slash
///
/// The result is kept as a string: the exporter substitutes the dev host
/// textually, so its exact spelling matters.
///
/// # Examples
///
/// ```
/// use flowbake::url::normalize_host;
///
/// let host = normalize_host(" https://example.webflow.io/ ").unwrap();
/// assert_eq!(host, "https://example.webflow.io");
/// ```
pub fn normalize_host(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();

    let url = Url::parse(trimmed)
        .map_err(|e| ConfigError::InvalidUrl(format!("'{}': {}", trimmed, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Only HTTP and HTTPS hosts are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "'{}' has no host",
            trimmed
        )));
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}

/// Strips the `scheme://host[:port]` prefix from an absolute URL
///
/// Values without a scheme are returned unchanged.
pub fn strip_origin(value: &str) -> &str {
    let Some(scheme_end) = value.find("://") else {
        return value;
    };
    let rest = &value[scheme_end + 3..];
    match rest.find('/') {
        Some(slash) => &rest[slash..],
        None => "",
    }
}

/// Turns a site-relative path into a manifest path (no leading or trailing slash)
pub fn manifest_path(path: &str) -> &str {
    path.trim_matches('/')
}
