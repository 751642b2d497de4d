use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

/// Source URLs of the images already relocated during one export
///
/// One registry lives for exactly one build and is shared (behind an `Arc`)
/// by every page rewrite. All access goes through a single lock, so
/// [`ImageRegistry::claim`] is an atomic check-and-mark: when two pages race
/// on the same unseen URL, exactly one of them wins the claim.
#[derive(Debug, Default)]
pub struct ImageRegistry {
    seen: Mutex<HashSet<String>>,
}

impl ImageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // The set is never left half-updated, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn has_seen(&self, url: &str) -> bool {
        self.lock().contains(url)
    }

    /// Records a URL as relocated; marking an already known URL is a no-op
    pub fn mark_seen(&self, url: &str) {
        self.lock().insert(url.to_string());
    }

    /// Marks a URL and reports whether this call was the first to do so
    pub fn claim(&self, url: &str) -> bool {
        self.lock().insert(url.to_string())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
