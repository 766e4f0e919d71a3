//! Path exclusion patterns.

use std::path::Path;

use indexmap::IndexSet;

/// Set of literal exclusion patterns.
///
/// A path is excluded when it equals a pattern or ends with one. Matching is
/// on the raw path string, so `cache` excludes both `/var/cache` and
/// `/srv/webcache`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionFilter {
    patterns: IndexSet<String>,
}

impl ExclusionFilter {
    /// Create a filter; duplicate patterns are dropped, first-seen order kept.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.is_empty())
                .collect(),
        }
    }

    /// Check whether a path is excluded.
    pub fn is_excluded(&self, path: &Path) -> bool {
        let bytes = path.as_os_str().as_encoded_bytes();
        self.patterns
            .iter()
            .any(|pattern| bytes == pattern.as_bytes() || bytes.ends_with(pattern.as_bytes()))
    }

    /// Patterns in first-seen order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(String::as_str)
    }

    /// Number of distinct patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Check if the filter excludes nothing.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
