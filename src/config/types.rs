use serde::Deserialize;

/// Main configuration structure for flowbake
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Dev host the site is exported from
    #[serde(default)]
    pub site: String,

    /// Production host the exported pages will reference
    #[serde(rename = "target-host", default)]
    pub target_host: String,

    /// Replacement robots.txt; when absent the upstream copy is used
    #[serde(rename = "robots-txt", default)]
    pub robots_txt: Option<String>,

    /// Free-text redirect rules written verbatim to `_redirects`
    #[serde(default)]
    pub redirects: Option<String>,

    /// Free-text header rules written verbatim to `_headers`
    #[serde(default)]
    pub headers: Option<String>,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub platform: PlatformConfig,
}

/// HTTP fetch behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Total attempts per request, including the first one
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts (seconds)
    #[serde(rename = "retry-delay-secs", default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

/// Page rewriting and output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BuildConfig {
    /// Directory the bundle is written to
    #[serde(rename = "output-dir", default = "default_output_dir")]
    pub output_dir: String,

    /// Maximum number of pages fetched and rewritten at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Directory (relative to the output root) holding relocated images
    #[serde(rename = "assets-dir", default = "default_assets_dir")]
    pub assets_dir: String,

    /// Attribute marking images that should be relocated
    #[serde(rename = "image-marker", default = "default_image_marker")]
    pub image_marker: String,

    /// Attribute keeping an anchor out of a generated sitemap
    #[serde(rename = "skip-sitemap-marker", default = "default_skip_sitemap_marker")]
    pub skip_sitemap_marker: String,

    /// Attribute keeping an anchor out of the fetch manifest
    #[serde(rename = "skip-fetch-marker", default = "default_skip_fetch_marker")]
    pub skip_fetch_marker: String,

    /// Proxy that runtime requests to the target host are routed through
    #[serde(rename = "proxy-url", default = "default_proxy_url")]
    pub proxy_url: String,
}

/// Hosts serving the platform's shared assets
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformConfig {
    /// Host suffixes serving the site stylesheet and script bundle
    #[serde(rename = "asset-hosts", default = "default_asset_hosts")]
    pub asset_hosts: Vec<String>,

    /// Host suffixes serving the shared utility library
    #[serde(rename = "library-hosts", default = "default_library_hosts")]
    pub library_hosts: Vec<String>,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    2
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("flowbake/{}", env!("CARGO_PKG_VERSION"))
}

fn default_output_dir() -> String {
    "public".to_string()
}

fn default_concurrency() -> usize {
    8
}

fn default_assets_dir() -> String {
    "sb_assets".to_string()
}

fn default_image_marker() -> String {
    "sb-process".to_string()
}

fn default_skip_sitemap_marker() -> String {
    "sb-skip-sitemap".to_string()
}

fn default_skip_fetch_marker() -> String {
    "sb-skip-fetch".to_string()
}

fn default_proxy_url() -> String {
    "https://corsproxy.io/?".to_string()
}

fn default_asset_hosts() -> Vec<String> {
    vec!["website-files.com".to_string(), "webflow.com".to_string()]
}

fn default_library_hosts() -> Vec<String> {
    vec!["cloudfront.net".to_string()]
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_secs: default_retry_delay_secs(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            concurrency: default_concurrency(),
            assets_dir: default_assets_dir(),
            image_marker: default_image_marker(),
            skip_sitemap_marker: default_skip_sitemap_marker(),
            skip_fetch_marker: default_skip_fetch_marker(),
            proxy_url: default_proxy_url(),
        }
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            asset_hosts: default_asset_hosts(),
            library_hosts: default_library_hosts(),
        }
    }
}
