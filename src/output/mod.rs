//! Output module for export bundles
//!
//! This module handles:
//! - Collecting exported files in memory
//! - Writing finished bundles to disk
//! - Summarizing what an export produced

mod bundle;
mod materializer;
pub mod stats;

pub use bundle::{BundleFile, ExportBundle};
pub use materializer::{DirectoryMaterializer, Materializer};
pub use stats::{print_statistics, ExportStatistics};
