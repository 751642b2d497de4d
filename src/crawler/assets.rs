//! Extraction of the platform-hosted asset references
//!
//! Every page published by the platform embeds the same three absolute asset
//! URLs: the site stylesheet, the site script bundle, and the shared utility
//! library. They have well-known shapes, so plain patterns are enough here;
//! anchors and images go through the HTML parser instead.

use crate::config::PlatformConfig;
use crate::BakeError;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::fmt;

/// The three kinds of platform asset a page references
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Stylesheet,
    Script,
    Library,
}

impl AssetKind {
    pub const ALL: [AssetKind; 3] = [AssetKind::Stylesheet, AssetKind::Script, AssetKind::Library];

    /// Output file the asset is stored under, relative to the bundle root
    pub fn file_name(&self) -> &'static str {
        match self {
            AssetKind::Stylesheet => "style.css",
            AssetKind::Script => "script.js",
            AssetKind::Library => "jquery.js",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssetKind::Stylesheet => "stylesheet",
            AssetKind::Script => "script",
            AssetKind::Library => "library",
        };
        f.write_str(name)
    }
}

static PLATFORM_PATTERNS: Lazy<AssetPatterns> = Lazy::new(|| {
    AssetPatterns::from_config(&PlatformConfig::default())
        .expect("built-in platform asset patterns are valid")
});

/// Compiled element patterns for the three asset kinds
///
/// Each pattern matches a whole element (`<link …>` or `<script …></script>`)
/// and captures the absolute asset URL in group 1. Matching is
/// case-insensitive and tolerates any attribute order; relative URLs never
/// match.
#[derive(Debug, Clone)]
pub struct AssetPatterns {
    stylesheet: Regex,
    script: Regex,
    library: Regex,
}

impl AssetPatterns {
    /// Compiles patterns for the given host suffixes
    ///
    /// A listed host matches itself and any of its subdomains. Entries may
    /// carry an explicit port (`127.0.0.1:8080`).
    pub fn new(asset_hosts: &[String], library_hosts: &[String]) -> Result<Self, regex::Error> {
        let assets = url_pattern(asset_hosts, "css");
        let scripts = url_pattern(asset_hosts, "js");
        let library = url_pattern(library_hosts, "js");

        Ok(Self {
            stylesheet: Regex::new(&link_element(&assets))?,
            script: Regex::new(&script_element(&scripts))?,
            library: Regex::new(&script_element(&library))?,
        })
    }

    pub fn from_config(config: &PlatformConfig) -> Result<Self, regex::Error> {
        Self::new(&config.asset_hosts, &config.library_hosts)
    }

    /// Patterns for the platform's own hosting domains
    pub fn platform() -> Self {
        PLATFORM_PATTERNS.clone()
    }

    fn pattern(&self, kind: AssetKind) -> &Regex {
        match kind {
            AssetKind::Stylesheet => &self.stylesheet,
            AssetKind::Script => &self.script,
            AssetKind::Library => &self.library,
        }
    }

    /// Returns the URL of the first element of `kind`, in document order
    pub fn find<'h>(&self, kind: AssetKind, html: &'h str) -> Option<&'h str> {
        self.pattern(kind)
            .captures(html)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Replaces every element of `kind` that references exactly `url`
    ///
    /// # Returns
    ///
    /// The rewritten HTML and the number of elements replaced
    pub fn replace_element(
        &self,
        kind: AssetKind,
        html: &str,
        url: &str,
        replacement: &str,
    ) -> (String, usize) {
        let mut replaced = 0;
        let output = self.pattern(kind).replace_all(html, |caps: &Captures| {
            if &caps[1] == url {
                replaced += 1;
                replacement.to_string()
            } else {
                caps[0].to_string()
            }
        });
        (output.into_owned(), replaced)
    }
}

/// Absolute `http(s)` URL on one of `hosts` ending in `.ext`
fn url_pattern(hosts: &[String], ext: &str) -> String {
    let hosts = hosts
        .iter()
        .map(|h| regex::escape(h))
        .collect::<Vec<_>>()
        .join("|");

    format!(
        r#"https?://(?:[^/"'\s<>]+\.)?(?:{hosts})(?::\d+)?/[^"'\s<>]*\.{ext}"#,
        hosts = hosts,
        ext = ext
    )
}

fn link_element(url: &str) -> String {
    format!(
        r#"(?i)<link\b[^>]*?[\s"']href\s*=\s*["']?({url})(?:["'\s][^>]*)?>"#,
        url = url
    )
}

fn script_element(url: &str) -> String {
    format!(
        r#"(?i)<script\b[^>]*?[\s"']src\s*=\s*["']?({url})(?:["'\s][^>]*)?>\s*</script>"#,
        url = url
    )
}

/// Extracts the URL of one asset kind from the home page
///
/// # Returns
///
/// * `Ok(String)` - The first matching absolute URL
/// * `Err(BakeError::AssetNotFound)` - No element of that kind exists
pub fn extract_asset(
    kind: AssetKind,
    html: &str,
    patterns: &AssetPatterns,
) -> Result<String, BakeError> {
    patterns
        .find(kind, html)
        .map(str::to_string)
        .ok_or(BakeError::AssetNotFound { kind })
}

/// The stylesheet, script, and library URLs shared by every page of a site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetTriple {
    pub stylesheet: String,
    pub script: String,
    pub library: String,
}

impl AssetTriple {
    /// Extracts all three asset URLs from the home page
    ///
    /// A missing kind is fatal: every page depends on all three.
    pub fn extract(html: &str, patterns: &AssetPatterns) -> Result<Self, BakeError> {
        Ok(Self {
            stylesheet: extract_asset(AssetKind::Stylesheet, html, patterns)?,
            script: extract_asset(AssetKind::Script, html, patterns)?,
            library: extract_asset(AssetKind::Library, html, patterns)?,
        })
    }

    pub fn url(&self, kind: AssetKind) -> &str {
        match kind {
            AssetKind::Stylesheet => &self.stylesheet,
            AssetKind::Script => &self.script,
            AssetKind::Library => &self.library,
        }
    }
}

/// The asset triple together with the fetched asset contents
#[derive(Debug, Clone)]
pub struct SiteAssets {
    pub urls: AssetTriple,
    pub stylesheet: String,
    pub script: String,
    pub library: String,
}

impl SiteAssets {
    pub fn text(&self, kind: AssetKind) -> &str {
        match kind {
            AssetKind::Stylesheet => &self.stylesheet,
            AssetKind::Script => &self.script,
            AssetKind::Library => &self.library,
        }
    }
}
