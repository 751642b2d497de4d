//! HTML parser for discovering site pages
//!
//! This module walks a document's anchors and turns the ones pointing at the
//! target host into manifest paths.

use crate::url::same_host;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Discovers the site pages linked from an HTML document
///
/// # Link Inclusion Rules
///
/// Each `<a href>` is resolved against `target_host`. A link is kept when:
/// - the resolved URL has the same host (and port) as `target_host`
/// - the resolved path is not the root `/`
/// - the anchor does not carry `skip_marker`, when one is given
///
/// Malformed hrefs are skipped silently. Query strings and fragments are
/// dropped; only the path is kept, without its leading slash. Trailing
/// slashes are left in place.
///
/// # Returns
///
/// Paths in document order, each listed once
///
/// # Example
///
/// ```
/// use flowbake::crawler::links_from_html;
/// use url::Url;
///
/// let html = r#"<a href="/about">About</a><a href="/" >Home</a>"#;
/// let target = Url::parse("https://www.example.com").unwrap();
/// assert_eq!(links_from_html(html, &target, None), vec!["about".to_string()]);
/// ```
pub fn links_from_html(html: &str, target_host: &Url, skip_marker: Option<&str>) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(anchor_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut paths = Vec::new();

    for element in document.select(&anchor_selector) {
        if let Some(marker) = skip_marker {
            if element.value().attr(marker).is_some() {
                continue;
            }
        }

        let Some(href) = element.value().attr("href") else {
            continue;
        };

        let Some(path) = resolve_site_path(href, target_host) else {
            continue;
        };

        if seen.insert(path.clone()) {
            paths.push(path);
        }
    }

    paths
}

/// Resolves an href to a site path, or `None` when it leaves the site
fn resolve_site_path(href: &str, target_host: &Url) -> Option<String> {
    let resolved = target_host.join(href.trim()).ok()?;

    if !same_host(&resolved, target_host) {
        return None;
    }

    let path = resolved.path();
    if path == "/" || path.is_empty() {
        return None;
    }

    Some(path.trim_start_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> Url {
        Url::parse("https://www.example.com").unwrap()
    }

    #[test]
    fn test_relative_and_absolute_links() {
        let html = r#"<html><body>
            <a href="/about">About</a>
            <a href="https://www.example.com/pricing">Pricing</a>
            <a href="contact">Contact</a>
        </body></html>"#;
        assert_eq!(
            links_from_html(html, &target(), None),
            vec!["about", "pricing", "contact"]
        );
    }

    #[test]
    fn test_root_is_never_included() {
        let html = r##"<a href="/">Home</a><a href="https://www.example.com">Home</a><a href="">Self</a><a href="#top">Top</a>"##;
        assert!(links_from_html(html, &target(), None).is_empty());
    }

    #[test]
    fn test_foreign_hosts_excluded() {
        let html = r#"
            <a href="https://twitter.com/example">Twitter</a>
            <a href="https://blog.example.com/post">Blog</a>
            <a href="mailto:hello@example.com">Mail</a>
            <a href="tel:+123">Call</a>
            <a href="/team">Team</a>"#;
        assert_eq!(links_from_html(html, &target(), None), vec!["team"]);
    }

    #[test]
    fn test_skip_marker() {
        let html = r#"<a href="/thanks" sb-skip-sitemap>Thanks</a><a href="/about">About</a>"#;
        assert_eq!(
            links_from_html(html, &target(), Some("sb-skip-sitemap")),
            vec!["about"]
        );
        assert_eq!(
            links_from_html(html, &target(), None),
            vec!["thanks", "about"]
        );
    }

    #[test]
    fn test_duplicates_collapse_and_query_dropped() {
        let html = r#"<a href="/about">A</a><a href="/about?ref=nav">B</a><a href="/about#team">C</a>"#;
        assert_eq!(links_from_html(html, &target(), None), vec!["about"]);
    }

    #[test]
    fn test_trailing_slash_kept() {
        let html = r#"<a href="/blog/">Blog</a><a href="/blog/post-1">Post</a>"#;
        assert_eq!(
            links_from_html(html, &target(), None),
            vec!["blog/", "blog/post-1"]
        );
    }

    #[test]
    fn test_malformed_href_skipped() {
        let html = r#"<a href="http://[::1">Broken</a><a href="/ok">Ok</a>"#;
        assert_eq!(links_from_html(html, &target(), None), vec!["ok"]);
    }

    #[test]
    fn test_nested_markup() {
        let html = r#"<nav><ul><li><div><a href="/deep/link"><span>Deep</span></a></div></li></ul></nav>"#;
        assert_eq!(links_from_html(html, &target(), None), vec!["deep/link"]);
    }
}
