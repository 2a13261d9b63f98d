//! Access to source documents for navigation and toctree expansion.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};

use crate::paths::corpus_path;

/// Read-only view of the source corpus, addressed by corpus-relative paths.
pub trait SourceTree: Sync {
    fn read(&self, doc: &str) -> io::Result<String>;

    /// Documents matching a corpus-relative glob, in sorted order.
    fn glob(&self, pattern: &str) -> Vec<String>;
}

/// Source documents on disk below a root folder.
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SourceTree for FsSource {
    fn read(&self, doc: &str) -> io::Result<String> {
        fs::read_to_string(self.root.join(doc))
    }

    fn glob(&self, pattern: &str) -> Vec<String> {
        let full = format!("{}/{pattern}", Pattern::escape(&self.root.to_string_lossy()));
        let Ok(paths) = glob::glob(&full) else {
            tracing::warn!(pattern = %pattern, "Invalid toctree glob");
            return Vec::new();
        };
        let mut matches: Vec<String> = paths
            .filter_map(Result::ok)
            .filter(|path| path.is_file())
            .map(|path| corpus_path(&self.root, &path))
            .collect();
        matches.sort();
        matches
    }
}

/// In-memory corpus.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    docs: BTreeMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_doc(mut self, doc: &str, text: &str) -> Self {
        self.docs.insert(doc.to_owned(), text.to_owned());
        self
    }
}

impl SourceTree for MemorySource {
    fn read(&self, doc: &str) -> io::Result<String> {
        self.docs
            .get(doc)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, doc.to_owned()))
    }

    fn glob(&self, pattern: &str) -> Vec<String> {
        let Ok(pattern) = Pattern::new(pattern) else {
            return Vec::new();
        };
        let options = MatchOptions {
            require_literal_separator: true,
            ..MatchOptions::new()
        };
        self.docs
            .keys()
            .filter(|doc| pattern.matches_with(doc, options))
            .cloned()
            .collect()
    }
}
