//! Writing bundles out
//!
//! This module defines the trait interface for materializers and the
//! directory-backed implementation used by the CLI.

use crate::output::ExportBundle;
use crate::BakeError;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Trait for bundle materializers
///
/// A materializer persists every file of a finished bundle somewhere. It is
/// only ever handed complete bundles, so partial exports never reach disk.
pub trait Materializer {
    /// Writes every file of the bundle
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of files written
    /// * `Err(BakeError)` - A file could not be written
    fn materialize(&self, bundle: &ExportBundle) -> Result<usize, BakeError>;
}

/// Writes bundles below a root directory
#[derive(Debug, Clone)]
pub struct DirectoryMaterializer {
    root: PathBuf,
}

impl DirectoryMaterializer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a bundle path below the root, refusing paths that would escape it
    fn target(&self, relative: &str) -> Result<PathBuf, BakeError> {
        let relative = Path::new(relative);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(BakeError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("bundle path {} leaves the output directory", relative.display()),
            )));
        }
        Ok(self.root.join(relative))
    }
}

impl Materializer for DirectoryMaterializer {
    fn materialize(&self, bundle: &ExportBundle) -> Result<usize, BakeError> {
        fs::create_dir_all(&self.root)?;

        let mut written = 0;
        for (relative, file) in bundle {
            let path = self.target(relative)?;
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, file.as_bytes())?;
            tracing::trace!("Wrote {}", path.display());
            written += 1;
        }

        tracing::info!("Wrote {} files to {}", written, self.root.display());
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_writes_nested_files() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("public");

        let mut bundle = ExportBundle::new();
        bundle.insert_text("index.html", "<html>home</html>");
        bundle.insert_text("blog/post-1.html", "<html>post</html>");
        bundle.insert_binary("sb_assets/img1.png", vec![1, 2, 3]);

        let written = DirectoryMaterializer::new(&root).materialize(&bundle).unwrap();

        assert_eq!(written, 3);
        assert_eq!(
            fs::read_to_string(root.join("index.html")).unwrap(),
            "<html>home</html>"
        );
        assert_eq!(
            fs::read_to_string(root.join("blog/post-1.html")).unwrap(),
            "<html>post</html>"
        );
        assert_eq!(fs::read(root.join("sb_assets/img1.png")).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_overwrites_existing_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("style.css"), "old").unwrap();

        let mut bundle = ExportBundle::new();
        bundle.insert_text("style.css", "new");
        DirectoryMaterializer::new(dir.path()).materialize(&bundle).unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("style.css")).unwrap(), "new");
    }

    #[test]
    fn test_rejects_escaping_paths() {
        let dir = TempDir::new().unwrap();
        let mut bundle = ExportBundle::new();
        bundle.insert_text("../outside.html", "x");

        let result = DirectoryMaterializer::new(dir.path().join("out")).materialize(&bundle);
        assert!(matches!(result, Err(BakeError::Io(_))));
        assert!(!dir.path().join("outside.html").exists());
    }

    #[test]
    fn test_empty_bundle_creates_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("empty");
        let written = DirectoryMaterializer::new(&root)
            .materialize(&ExportBundle::new())
            .unwrap();
        assert_eq!(written, 0);
        assert!(root.is_dir());
    }
}
