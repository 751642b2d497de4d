//! Page manifest resolution
//!
//! Pages are discovered from two independent sources, the sitemap and the
//! home page's anchors. This module reconciles them into one manifest.

use crate::config::BuildConfig;
use crate::crawler::parser::links_from_html;
use crate::crawler::sitemap::{generate_sitemap, paths_from_sitemap, NOT_FOUND_PATH};
use crate::url::{manifest_path, Site};
use std::collections::HashSet;

/// Insertion-ordered set of manifest paths
///
/// Paths are stored without leading or trailing slashes; empty paths (the
/// home page) are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageManifest {
    paths: Vec<String>,
    seen: HashSet<String>,
}

impl PageManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a path, returning `true` if it was not present yet
    pub fn insert(&mut self, path: &str) -> bool {
        let path = manifest_path(path);
        if path.is_empty() || self.seen.contains(path) {
            return false;
        }
        self.seen.insert(path.to_string());
        self.paths.push(path.to_string());
        true
    }

    pub fn contains(&self, path: &str) -> bool {
        self.seen.contains(manifest_path(path))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.paths.clone()
    }
}

impl<S: AsRef<str>> Extend<S> for PageManifest {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for path in iter {
            self.insert(path.as_ref());
        }
    }
}

impl<S: AsRef<str>> FromIterator<S> for PageManifest {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut manifest = Self::new();
        manifest.extend(iter);
        manifest
    }
}

/// Boolean attributes that steer discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    /// Anchor is fetched but not advertised in a generated sitemap
    pub skip_sitemap: String,
    /// Anchor is neither fetched nor rewritten when a sitemap exists
    pub skip_fetch: String,
}

impl Markers {
    pub fn from_config(config: &BuildConfig) -> Self {
        Self {
            skip_sitemap: config.skip_sitemap_marker.clone(),
            skip_fetch: config.skip_fetch_marker.clone(),
        }
    }
}

impl Default for Markers {
    fn default() -> Self {
        Self::from_config(&BuildConfig::default())
    }
}

/// The sitemap to publish and the pages to export
#[derive(Debug, Clone)]
pub struct ResolvedPages {
    pub sitemap_xml: String,
    pub manifest: PageManifest,
}

/// Reconciles the upstream sitemap (if any) with the home page links
///
/// # Without an upstream sitemap
///
/// - the published sitemap is generated from the home page links, minus
///   anchors carrying the skip-from-sitemap marker
/// - the manifest is every home page link plus `"404"`
///
/// # With an upstream sitemap
///
/// - the manifest is the sitemap's paths plus the home page links, minus
///   anchors carrying the skip-from-fetch marker
/// - the published sitemap is the upstream text with every literal
///   occurrence of the dev host replaced by the target host
///
/// The two branches exclude by different markers on purpose.
pub fn resolve_pages(
    dev_sitemap: Option<&str>,
    homepage_html: &str,
    site: &Site,
    markers: &Markers,
) -> ResolvedPages {
    let target = site.target_url();

    match dev_sitemap {
        None => {
            let advertised = links_from_html(homepage_html, target, Some(&markers.skip_sitemap));
            let sitemap_xml = generate_sitemap(site.target_host(), &advertised);

            let mut manifest: PageManifest = links_from_html(homepage_html, target, None)
                .into_iter()
                .collect();
            manifest.insert(NOT_FOUND_PATH);

            tracing::info!(
                "No upstream sitemap; generated one with {} pages, exporting {} pages",
                advertised.len(),
                manifest.len()
            );
            ResolvedPages {
                sitemap_xml,
                manifest,
            }
        }
        Some(xml) => {
            let mut manifest: PageManifest = paths_from_sitemap(xml).into_iter().collect();
            let from_sitemap = manifest.len();
            manifest.extend(links_from_html(
                homepage_html,
                target,
                Some(&markers.skip_fetch),
            ));

            tracing::info!(
                "Upstream sitemap lists {} pages, {} more found on the home page",
                from_sitemap,
                manifest.len() - from_sitemap
            );
            ResolvedPages {
                sitemap_xml: site.retarget(xml),
                manifest,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOME: &str = r#"<html><body>
        <a href="/about">About</a>
        <a href="/thanks" sb-skip-sitemap>Thanks</a>
        <a href="/partners" sb-skip-fetch>Partners</a>
        <a href="/">Home</a>
        <a href="https://elsewhere.com/x">Out</a>
    </body></html>"#;

    fn site() -> Site {
        Site::new("https://dev.example", "https://www.example.com").unwrap()
    }

    #[test]
    fn test_manifest_normalizes_and_dedups() {
        let mut manifest = PageManifest::new();
        assert!(manifest.insert("/about/"));
        assert!(!manifest.insert("about"));
        assert!(!manifest.insert("/"));
        assert!(manifest.insert("blog/post"));

        assert_eq!(manifest.to_vec(), vec!["about", "blog/post"]);
        assert!(manifest.contains("/about"));
    }

    #[test]
    fn test_without_sitemap() {
        let resolved = resolve_pages(None, HOME, &site(), &Markers::default());

        assert_eq!(
            resolved.manifest.to_vec(),
            vec!["about", "thanks", "partners", "404"]
        );
        assert!(resolved
            .sitemap_xml
            .contains("<loc>https://www.example.com/about</loc>"));
        assert!(resolved
            .sitemap_xml
            .contains("<loc>https://www.example.com/partners</loc>"));
        assert!(!resolved.sitemap_xml.contains("thanks"));
        assert!(!resolved.sitemap_xml.contains("/404"));
    }

    #[test]
    fn test_with_sitemap() {
        let upstream = "<urlset>\
            <url><loc>https://dev.example/</loc></url>\
            <url><loc>https://dev.example/about/</loc></url>\
            <url><loc>https://dev.example/pricing</loc></url>\
            </urlset>";

        let resolved = resolve_pages(Some(upstream), HOME, &site(), &Markers::default());

        assert_eq!(
            resolved.manifest.to_vec(),
            vec!["about", "pricing", "404", "thanks"]
        );
        assert!(!resolved.manifest.contains("partners"));
        assert_eq!(
            resolved.sitemap_xml,
            "<urlset>\
            <url><loc>https://www.example.com/</loc></url>\
            <url><loc>https://www.example.com/about/</loc></url>\
            <url><loc>https://www.example.com/pricing</loc></url>\
            </urlset>"
        );
    }

    #[test]
    fn test_sitemap_substitution_is_textual() {
        let upstream = "<loc>https://partner.io/?from=https://dev.example</loc>";
        let resolved = resolve_pages(Some(upstream), "", &site(), &Markers::default());
        assert_eq!(
            resolved.sitemap_xml,
            "<loc>https://partner.io/?from=https://www.example.com</loc>"
        );
    }
}
