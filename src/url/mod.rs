//! URL handling module for flowbake
//!
//! This module provides the site descriptor, host normalization, and the
//! small path helpers shared by link discovery and sitemap parsing.

mod domain;
mod normalize;
mod site;

pub use domain::same_host;
pub use normalize::{manifest_path, normalize_host, strip_origin};
pub use site::Site;
