//! Crawler module for fetching and discovering a site
//!
//! This module contains the core export logic, including:
//! - HTTP fetching with retry logic
//! - Platform asset extraction
//! - Link discovery from HTML and sitemaps
//! - Page manifest resolution
//! - Overall export coordination

mod assets;
mod coordinator;
mod fetcher;
mod manifest;
mod parser;
mod sitemap;

pub use assets::{extract_asset, AssetKind, AssetPatterns, AssetTriple, SiteAssets};
pub use coordinator::{run_export, BuildOptions, Exporter};
pub use fetcher::{build_http_client, FetchedResource, RetryPolicy, RetryingFetcher};
pub use manifest::{resolve_pages, Markers, PageManifest, ResolvedPages};
pub use parser::links_from_html;
pub use sitemap::{generate_sitemap, paths_from_sitemap, NOT_FOUND_PATH};
