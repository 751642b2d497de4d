//! In-memory export bundle
//!
//! The exporter never touches the filesystem. Everything it produces lands in
//! an [`ExportBundle`] keyed by bundle-relative path, and a
//! [`Materializer`](super::Materializer) writes it out afterwards.

use std::collections::btree_map;
use std::collections::BTreeMap;

/// One file of the bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleFile {
    Text(String),
    Binary(Vec<u8>),
}

impl BundleFile {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            BundleFile::Text(text) => text.as_bytes(),
            BundleFile::Binary(bytes) => bytes,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            BundleFile::Text(text) => Some(text),
            BundleFile::Binary(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Files of a static export, keyed by `/`-separated relative path
#[derive(Debug, Clone, Default)]
pub struct ExportBundle {
    files: BTreeMap<String, BundleFile>,
}

impl ExportBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a text file, replacing any previous file at `path`
    pub fn insert_text(&mut self, path: impl Into<String>, text: impl Into<String>) {
        self.insert(path, BundleFile::Text(text.into()));
    }

    /// Adds a binary file, replacing any previous file at `path`
    pub fn insert_binary(&mut self, path: impl Into<String>, bytes: Vec<u8>) {
        self.insert(path, BundleFile::Binary(bytes));
    }

    pub fn insert(&mut self, path: impl Into<String>, file: BundleFile) {
        let path = path.into();
        if self.files.insert(path.clone(), file).is_some() {
            tracing::debug!("Bundle file {} replaced", path);
        }
    }

    pub fn get(&self, path: &str) -> Option<&BundleFile> {
        self.files.get(path)
    }

    pub fn text(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(BundleFile::as_text)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Iterates files in path order
    pub fn iter(&self) -> btree_map::Iter<'_, String, BundleFile> {
        self.files.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Sum of all file sizes in bytes
    pub fn total_bytes(&self) -> usize {
        self.files.values().map(BundleFile::len).sum()
    }
}

impl<'a> IntoIterator for &'a ExportBundle {
    type Item = (&'a String, &'a BundleFile);
    type IntoIter = btree_map::Iter<'a, String, BundleFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
