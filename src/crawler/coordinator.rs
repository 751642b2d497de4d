//! Export coordinator - main build orchestration logic
//!
//! This module contains the pipeline that coordinates a whole export:
//! - Fetching the home page and the shared platform assets
//! - Resolving the page manifest from the sitemap and home page links
//! - Fetching and rewriting every page with bounded concurrency
//! - Assembling the finished bundle

use crate::config::Config;
use crate::crawler::assets::{AssetKind, AssetPatterns, AssetTriple, SiteAssets};
use crate::crawler::fetcher::RetryingFetcher;
use crate::crawler::manifest::{resolve_pages, Markers};
use crate::crawler::sitemap::NOT_FOUND_PATH;
use crate::output::ExportBundle;
use crate::rewrite::{
    page_file, ContentRewriter, ImageRegistry, RewriteOptions, RewrittenPage, StylePruner,
    UsedSelectorPruner,
};
use crate::url::Site;
use crate::BakeError;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use std::time::Instant;

/// Manifest path the home page is exported under
const HOME_PATH: &str = "index";

/// Everything an export needs besides the site and the fetcher
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Maximum number of pages in flight
    pub concurrency: usize,
    pub markers: Markers,
    pub rewrite: RewriteOptions,
    pub patterns: AssetPatterns,
    /// Replacement robots.txt; wins over the upstream copy
    pub robots_txt: Option<String>,
    /// Written verbatim to `_redirects`
    pub redirects: Option<String>,
    /// Written verbatim to `_headers`
    pub headers: Option<String>,
}

impl BuildOptions {
    /// Builds the options from a validated configuration
    ///
    /// # Errors
    ///
    /// Returns `BakeError::InvalidPattern` when the configured asset hosts do
    /// not compile into patterns.
    pub fn from_config(config: &Config) -> Result<Self, BakeError> {
        Ok(Self {
            concurrency: config.build.concurrency.max(1),
            markers: Markers::from_config(&config.build),
            rewrite: RewriteOptions::from_config(&config.build),
            patterns: AssetPatterns::from_config(&config.platform)?,
            robots_txt: config.robots_txt.clone(),
            redirects: config.redirects.clone(),
            headers: config.headers.clone(),
        })
    }
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            concurrency: 8,
            markers: Markers::default(),
            rewrite: RewriteOptions::default(),
            patterns: AssetPatterns::platform(),
            robots_txt: None,
            redirects: None,
            headers: None,
        }
    }
}

/// Main export coordinator
///
/// Phases run strictly in order: home page, asset triple, asset contents,
/// robots.txt, sitemap, manifest, pages. Only the page phase is concurrent.
pub struct Exporter {
    site: Site,
    fetcher: RetryingFetcher,
    options: BuildOptions,
    registry: Arc<ImageRegistry>,
    pruner: Arc<dyn StylePruner>,
}

impl Exporter {
    pub fn new(site: Site, fetcher: RetryingFetcher, options: BuildOptions) -> Self {
        Self {
            site,
            fetcher,
            options,
            registry: Arc::new(ImageRegistry::new()),
            pruner: Arc::new(UsedSelectorPruner),
        }
    }

    /// Uses a shared image registry, e.g. one already holding known images
    pub fn with_registry(mut self, registry: Arc<ImageRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_pruner(mut self, pruner: Arc<dyn StylePruner>) -> Self {
        self.pruner = pruner;
        self
    }

    pub fn registry(&self) -> &Arc<ImageRegistry> {
        &self.registry
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    /// Runs the export
    ///
    /// # Returns
    ///
    /// * `Ok(ExportBundle)` - Every page and asset of the site
    /// * `Err(BakeError)` - The first failure; nothing partial is returned
    pub async fn run(&self) -> Result<ExportBundle, BakeError> {
        let start_time = Instant::now();
        tracing::info!(
            "Exporting {} for {}",
            self.site.dev_host(),
            self.site.target_host()
        );

        let home_url = self.site.dev_url("");
        let homepage = self.fetcher.fetch_text(&home_url).await?;
        tracing::debug!("Fetched home page ({} bytes)", homepage.len());

        let urls = AssetTriple::extract(&homepage, &self.options.patterns)?;
        tracing::info!(
            "Assets: stylesheet {}, script {}, library {}",
            urls.stylesheet,
            urls.script,
            urls.library
        );

        let stylesheet = self.fetcher.fetch_text(&urls.stylesheet).await?;
        let script = self.fetcher.fetch_text(&urls.script).await?;
        let library = self.fetcher.fetch_text(&urls.library).await?;
        let assets = SiteAssets {
            urls,
            stylesheet,
            script,
            library,
        };

        let robots = self.robots_txt().await?;

        let dev_sitemap = self
            .fetcher
            .fetch_optional_text(&self.site.dev_url("sitemap.xml"))
            .await?;
        let resolved = resolve_pages(
            dev_sitemap.as_deref(),
            &homepage,
            &self.site,
            &self.options.markers,
        );

        let rewriter = ContentRewriter::new(
            self.site.clone(),
            assets.clone(),
            self.fetcher.clone(),
            Arc::clone(&self.registry),
        )
        .with_patterns(self.options.patterns.clone())
        .with_pruner(Arc::clone(&self.pruner))
        .with_options(self.options.rewrite.clone());

        let mut paths = vec![HOME_PATH.to_string()];
        paths.extend(resolved.manifest.iter().map(str::to_string));
        tracing::info!(
            "Building {} pages ({} at a time)",
            paths.len(),
            self.options.concurrency
        );

        let homepage = homepage.as_str();
        let rewriter = &rewriter;
        let pages: Vec<RewrittenPage> = stream::iter(paths)
            .map(move |path| async move {
                match self.build_page(rewriter, &path, homepage).await {
                    Ok(page) => Ok(page),
                    Err(e) => {
                        tracing::error!("Page {} failed: {}", path, e);
                        Err(BakeError::for_page(&path, e))
                    }
                }
            })
            .buffer_unordered(self.options.concurrency.max(1))
            .try_collect()
            .await?;

        let bundle = self.assemble(&assets, resolved.sitemap_xml, robots, pages);
        tracing::info!(
            "Export finished: {} pages, {} images, {} files in {:?}",
            resolved.manifest.len() + 1,
            self.registry.len(),
            bundle.len(),
            start_time.elapsed()
        );

        Ok(bundle)
    }

    /// Fetches (unless it is the home page) and rewrites one page
    async fn build_page(
        &self,
        rewriter: &ContentRewriter,
        path: &str,
        homepage: &str,
    ) -> Result<RewrittenPage, BakeError> {
        let html = if path == HOME_PATH {
            homepage.to_string()
        } else if path == NOT_FOUND_PATH {
            self.fetcher
                .fetch_error_page(&self.site.dev_url(path))
                .await?
        } else {
            self.fetcher.fetch_text(&self.site.dev_url(path)).await?
        };
        tracing::debug!("Fetched {} ({} bytes)", path, html.len());

        rewriter.rewrite(path, &html).await
    }

    /// The robots.txt to publish, if any
    ///
    /// Configured text wins. Otherwise the upstream file is used with the dev
    /// host replaced by the target host.
    async fn robots_txt(&self) -> Result<Option<String>, BakeError> {
        if let Some(robots) = &self.options.robots_txt {
            tracing::debug!("Using configured robots.txt");
            return Ok(Some(robots.clone()));
        }

        let upstream = self
            .fetcher
            .fetch_optional_text(&self.site.dev_url("robots.txt"))
            .await?;
        if upstream.is_none() {
            tracing::debug!("Site publishes no robots.txt");
        }
        Ok(upstream.map(|text| self.site.retarget(&text)))
    }

    fn assemble(
        &self,
        assets: &SiteAssets,
        sitemap_xml: String,
        robots: Option<String>,
        pages: Vec<RewrittenPage>,
    ) -> ExportBundle {
        let mut bundle = ExportBundle::new();

        for kind in AssetKind::ALL {
            bundle.insert_text(kind.file_name(), assets.text(kind));
        }
        bundle.insert_text("sitemap.xml", sitemap_xml);
        if let Some(robots) = robots {
            bundle.insert_text("robots.txt", robots);
        }
        if let Some(redirects) = &self.options.redirects {
            bundle.insert_text("_redirects", redirects.as_str());
        }
        if let Some(headers) = &self.options.headers {
            bundle.insert_text("_headers", headers.as_str());
        }

        for page in pages {
            for asset in page.assets {
                bundle.insert_binary(
                    format!("{}/{}", self.options.rewrite.assets_dir, asset.file_name),
                    asset.bytes,
                );
            }
            bundle.insert_text(page_file(&page.path), page.html);
        }

        bundle
    }
}

/// Runs a complete export from configuration
///
/// This is the main entry point. It will:
/// 1. Resolve the dev and target hosts
/// 2. Build the HTTP client and retry policy
/// 3. Run the export pipeline
///
/// # Arguments
///
/// * `config` - The validated configuration
///
/// # Returns
///
/// * `Ok(ExportBundle)` - Export completed successfully
/// * `Err(BakeError)` - Export failed
pub async fn run_export(config: &Config) -> Result<ExportBundle, BakeError> {
    let site = Site::from_config(config)?;
    let fetcher = RetryingFetcher::from_config(&config.fetch)?;
    let options = BuildOptions::from_config(config)?;

    Exporter::new(site, fetcher, options).run().await
}
