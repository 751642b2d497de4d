//! Page rewriting
//!
//! This module turns one page of the live site into its static counterpart:
//! - marked images are downloaded once per export and relocated
//! - the master stylesheet is pruned per page and inlined
//! - runtime requests to the target host are routed through a proxy
//! - the script bundle and utility library point at local copies

mod images;
mod paths;
mod prune;
mod registry;

pub use images::{absolute_file_urls, image_file_name, marked_image_urls};
pub use paths::{page_file, relative_prefix};
pub use prune::{KeepAllPruner, StylePruner, UsedSelectorPruner};
pub use registry::ImageRegistry;

use crate::config::BuildConfig;
use crate::crawler::{AssetKind, AssetPatterns, RetryingFetcher, SiteAssets};
use crate::url::Site;
use crate::BakeError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static HTML_OPEN_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<html(?:\s[^>]*)?>").expect("Invalid html tag regex"));

/// Knobs for page rewriting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Attribute marking images that should be relocated
    pub image_marker: String,
    /// Directory (relative to the bundle root) holding relocated images
    pub assets_dir: String,
    /// Proxy prefix for runtime requests to the target host
    pub proxy_url: String,
}

impl RewriteOptions {
    pub fn from_config(config: &BuildConfig) -> Self {
        Self {
            image_marker: config.image_marker.clone(),
            assets_dir: config.assets_dir.clone(),
            proxy_url: config.proxy_url.clone(),
        }
    }
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self::from_config(&BuildConfig::default())
    }
}

/// An image downloaded by the page that first referenced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedAsset {
    /// File name inside the assets directory
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Result of rewriting one page
#[derive(Debug, Clone)]
pub struct RewrittenPage {
    /// Manifest path (`index` for the home page)
    pub path: String,
    pub html: String,
    /// Images this page was the first to download
    pub assets: Vec<StagedAsset>,
}

/// Rewrites pages of one site
///
/// A rewriter is built once per export, after the asset triple and its
/// contents are known, and then shared by every page.
pub struct ContentRewriter {
    site: Site,
    assets: SiteAssets,
    patterns: AssetPatterns,
    fetcher: RetryingFetcher,
    registry: Arc<ImageRegistry>,
    pruner: Arc<dyn StylePruner>,
    options: RewriteOptions,
}

impl ContentRewriter {
    /// Creates a rewriter with the platform asset patterns, the used-selector
    /// pruner, and default options
    pub fn new(
        site: Site,
        assets: SiteAssets,
        fetcher: RetryingFetcher,
        registry: Arc<ImageRegistry>,
    ) -> Self {
        Self {
            site,
            assets,
            patterns: AssetPatterns::platform(),
            fetcher,
            registry,
            pruner: Arc::new(UsedSelectorPruner),
            options: RewriteOptions::default(),
        }
    }

    pub fn with_patterns(mut self, patterns: AssetPatterns) -> Self {
        self.patterns = patterns;
        self
    }

    pub fn with_pruner(mut self, pruner: Arc<dyn StylePruner>) -> Self {
        self.pruner = pruner;
        self
    }

    pub fn with_options(mut self, options: RewriteOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &Arc<ImageRegistry> {
        &self.registry
    }

    /// Rewrites one page
    ///
    /// # Pipeline
    ///
    /// 1. Relocate marked images (downloading the ones no other page claimed)
    /// 2. Prune the master stylesheet against the page and the site script
    /// 3. Break the line after the opening `<html>` tag
    /// 4. Inline the pruned stylesheet followed by the fetch redirect
    /// 5. Point the script and library tags at the local copies
    ///
    /// # Errors
    ///
    /// A failed image download fails the page.
    pub async fn rewrite(&self, path: &str, html: &str) -> Result<RewrittenPage, BakeError> {
        let prefix = relative_prefix(path);

        let (html, staged) = self.relocate_images(html.to_string(), &prefix).await?;

        let pruned = self
            .pruner
            .prune(&[html.as_str(), self.assets.script.as_str()], &self.assets.stylesheet);

        let html = break_after_html_tag(&html);

        let style_block = format!("<style>{}</style>{}", pruned, self.fetch_redirect_script());
        let html = self.replace_asset(path, AssetKind::Stylesheet, &html, &style_block);

        let script_tag = format!(
            r#"<script src="{}{}" type="text/javascript"></script>"#,
            prefix,
            AssetKind::Script.file_name()
        );
        let html = self.replace_asset(path, AssetKind::Script, &html, &script_tag);

        let library_tag = format!(
            r#"<script src="{}{}" type="text/javascript"></script>"#,
            prefix,
            AssetKind::Library.file_name()
        );
        let html = self.replace_asset(path, AssetKind::Library, &html, &library_tag);

        tracing::debug!(
            "Rewrote {} ({} bytes, {} new images)",
            path,
            html.len(),
            staged.len()
        );

        Ok(RewrittenPage {
            path: path.to_string(),
            html,
            assets: staged,
        })
    }

    async fn relocate_images(
        &self,
        mut html: String,
        prefix: &str,
    ) -> Result<(String, Vec<StagedAsset>), BakeError> {
        let mut urls = marked_image_urls(&html, &self.options.image_marker);
        // Longest first, so no URL is rewritten inside a longer one
        urls.sort_by(|a, b| b.len().cmp(&a.len()));

        let mut staged = Vec::new();
        for url in urls {
            let file_name = image_file_name(&url);

            // The claim stays even if the download fails; the export aborts then.
            if self.registry.claim(&url) {
                tracing::debug!("Downloading image {}", url);
                let bytes = self.fetcher.fetch_bytes(&url).await?;
                staged.push(StagedAsset {
                    file_name: file_name.clone(),
                    bytes,
                });
            } else {
                tracing::trace!("Image {} already relocated", url);
            }

            let local = format!("{}{}/{}", prefix, self.options.assets_dir, file_name);
            html = html.replace(&url, &local);
        }

        Ok((html, staged))
    }

    fn replace_asset(&self, path: &str, kind: AssetKind, html: &str, replacement: &str) -> String {
        let (output, replaced) =
            self.patterns
                .replace_element(kind, html, self.assets.urls.url(kind), replacement);
        if replaced == 0 {
            tracing::debug!("No {} element on page {}", kind, path);
        }
        output
    }

    /// Script that sends runtime requests for the target host through the proxy
    ///
    /// The exported site cannot answer dynamic requests itself, so a call to
    /// `{target}/rest` becomes `{proxy}{dev}/rest`.
    fn fetch_redirect_script(&self) -> String {
        let target = js_string(self.site.target_host());
        let proxied = js_string(&format!("{}{}", self.options.proxy_url, self.site.dev_host()));

        format!(
            "<script>(function(){{var t={target};var p={proxied};var f=window.fetch;\
             window.fetch=function(r,o){{var u=typeof r==='string'?r:(r&&r.url)||'';\
             if(u.indexOf(t)===0){{r=p+u.slice(t.length);}}return f.call(this,r,o);}};}})();</script>",
            target = target,
            proxied = proxied
        )
    }
}

/// Inserts a newline right after the first opening `<html …>` tag
fn break_after_html_tag(html: &str) -> String {
    match HTML_OPEN_TAG.find(html) {
        Some(tag) => {
            let mut output = String::with_capacity(html.len() + 1);
            output.push_str(&html[..tag.end()]);
            output.push('\n');
            output.push_str(&html[tag.end()..]);
            output
        }
        None => html.to_string(),
    }
}

/// Double-quoted JavaScript string literal, safe inside a `<script>` element
fn js_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '<' => out.push_str("\\u003c"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}
