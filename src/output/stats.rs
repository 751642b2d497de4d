//! Export statistics
//!
//! Summarizes a finished bundle for the end-of-run report.

use crate::output::{BundleFile, ExportBundle};

/// Counts derived from a bundle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportStatistics {
    /// HTML pages, including `index.html`
    pub pages: usize,

    /// Relocated images under the assets directory
    pub images: usize,

    /// Every other file (shared assets, sitemap, host rules)
    pub support_files: usize,

    /// Total size of all files
    pub total_bytes: usize,
}

impl ExportStatistics {
    /// Classifies every file of a bundle
    ///
    /// # Arguments
    ///
    /// * `bundle` - The finished bundle
    /// * `assets_dir` - Directory holding relocated images
    pub fn from_bundle(bundle: &ExportBundle, assets_dir: &str) -> Self {
        let image_prefix = format!("{}/", assets_dir);
        let mut stats = Self::default();

        for (path, file) in bundle {
            stats.total_bytes += file.len();
            if path.starts_with(&image_prefix) {
                stats.images += 1;
            } else if path.ends_with(".html") && matches!(file, BundleFile::Text(_)) {
                stats.pages += 1;
            } else {
                stats.support_files += 1;
            }
        }

        stats
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &ExportStatistics) {
    println!("=== Export Statistics ===\n");
    println!("  Pages: {}", stats.pages);
    println!("  Images: {}", stats.images);
    println!("  Support files: {}", stats.support_files);
    println!(
        "  Total size: {} bytes ({:.1} KiB)",
        stats.total_bytes,
        stats.total_bytes as f64 / 1024.0
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bundle() {
        let mut bundle = ExportBundle::new();
        bundle.insert_text("index.html", "aa");
        bundle.insert_text("blog/post.html", "bb");
        bundle.insert_text("style.css", "cc");
        bundle.insert_text("sitemap.xml", "dd");
        bundle.insert_binary("sb_assets/a.png", vec![0; 10]);

        let stats = ExportStatistics::from_bundle(&bundle, "sb_assets");

        assert_eq!(
            stats,
            ExportStatistics {
                pages: 2,
                images: 1,
                support_files: 2,
                total_bytes: 18,
            }
        );
    }

    #[test]
    fn test_html_image_counts_as_image() {
        let mut bundle = ExportBundle::new();
        bundle.insert_binary("sb_assets/odd.html", vec![1]);
        let stats = ExportStatistics::from_bundle(&bundle, "sb_assets");
        assert_eq!(stats.images, 1);
        assert_eq!(stats.pages, 0);
    }
}
