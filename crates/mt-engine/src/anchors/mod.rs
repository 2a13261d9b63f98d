//! Reference labels and document titles for the whole corpus.
//!
//! The index maps two kinds of keys to values:
//!
//! - location keys: `/install/docker.rst` or a label such as `docker_run`,
//!   mapped to `/install/docker.rst` or `/install/docker.rst#docker_run`
//! - title keys: the same key with a `.title` suffix, mapped to heading text
//!
//! It is persisted as a plain `key=value` line file.

mod scan;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::paths;
use crate::warnings::{Warning, Warnings};

pub use scan::{scan_document, scan_heading};

/// Suffix appended to a key to look up its title.
pub const TITLE_SUFFIX: &str = ".title";

/// Errors from building, loading or writing the index.
#[derive(Debug, thiserror::Error)]
pub enum AnchorError {
    #[error("Anchor index not found: {0}")]
    Missing(PathBuf),

    #[error("Failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid source pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Failed to list sources")]
    Glob(#[from] glob::GlobError),
}

/// A successful lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved<'a> {
    pub location: &'a str,
    pub title: Option<&'a str>,
}

/// Ordered key/value index with case-insensitive fallback lookup.
#[derive(Debug, Default, Clone)]
pub struct AnchorIndex {
    entries: Vec<(String, String)>,
    by_key: HashMap<String, usize>,
    by_lower: HashMap<String, usize>,
}

impl AnchorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry, returning the previous value.
    ///
    /// Replaced entries keep their original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        if let Some(&idx) = self.by_key.get(&key) {
            return Some(std::mem::replace(&mut self.entries[idx].1, value));
        }
        let idx = self.entries.len();
        self.by_lower.insert(key.to_lowercase(), idx);
        self.by_key.insert(key.clone(), idx);
        self.entries.push((key, value));
        None
    }

    /// Look up `key` exactly, then ignoring case.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.by_key
            .get(key)
            .or_else(|| self.by_lower.get(&key.to_lowercase()))
            .map(|&idx| self.entries[idx].1.as_str())
    }

    pub fn title(&self, key: &str) -> Option<&str> {
        self.get(&format!("{key}{TITLE_SUFFIX}"))
    }

    pub fn lookup(&self, key: &str) -> Option<Resolved<'_>> {
        self.get(key).map(|location| Resolved {
            location,
            title: self.title(key),
        })
    }

    /// Title for `key`, falling back to a label derived from the key itself.
    pub fn resolve_title(&self, key: &str, doc: &str, warnings: &mut Warnings) -> String {
        if let Some(title) = self.title(key) {
            return title.to_owned();
        }
        warnings.push(doc, format!("Reference '{key}' title not found in anchors"));
        paths::label(key)
    }

    /// Location for `key`, falling back to `<key>-broken.rst`.
    pub fn resolve_location(&self, key: &str, doc: &str, warnings: &mut Warnings) -> String {
        if let Some(location) = self.get(key) {
            return location.to_owned();
        }
        warnings.push(doc, format!("Reference '{key}' location not found in anchors"));
        format!("{key}-broken.rst")
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parse `key=value` lines. Lines without `=` are ignored; values may
    /// contain further `=` characters.
    pub fn parse(text: &str) -> Self {
        let mut index = Self::new();
        for line in text.lines() {
            if let Some((key, value)) = line.split_once('=') {
                index.insert(key, value);
            }
        }
        index
    }

    pub fn to_index_text(&self) -> String {
        let mut text = String::new();
        for (key, value) in &self.entries {
            text.push_str(key);
            text.push('=');
            text.push_str(value);
            text.push('\n');
        }
        text
    }

    pub fn load(path: &Path) -> Result<Self, AnchorError> {
        if !path.exists() {
            return Err(AnchorError::Missing(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|source| AnchorError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    pub fn write(&self, path: &Path) -> Result<(), AnchorError> {
        let write_error = |source| AnchorError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        fs::write(path, self.to_index_text()).map_err(write_error)
    }

    /// Merge scanned entries in order, warning when a key is redefined with
    /// a different value.
    pub fn merge(&mut self, doc: &str, entries: Vec<(String, String)>, warnings: &mut Warnings) {
        for (key, value) in entries {
            if let Some(previous) = self.get_exact(&key)
                && previous != value
            {
                warnings.push(
                    doc,
                    format!("Anchor '{key}' redefined: '{previous}' replaced by '{value}'"),
                );
            }
            self.insert(key, value);
        }
    }

    fn get_exact(&self, key: &str) -> Option<&str> {
        self.by_key.get(key).map(|&idx| self.entries[idx].1.as_str())
    }

    /// Scan every `.rst` file below `root`.
    ///
    /// Files are read in parallel and merged in sorted path order, so the
    /// result is deterministic.
    pub fn build(root: &Path) -> Result<(Self, Vec<Warning>), AnchorError> {
        let pattern = format!("{}/**/*.rst", glob::Pattern::escape(&root.to_string_lossy()));
        let mut files = glob::glob(&pattern)?.collect::<Result<Vec<_>, _>>()?;
        files.sort();

        let scanned = files
            .par_iter()
            .map(|path| {
                let text = fs::read_to_string(path).map_err(|source| AnchorError::Read {
                    path: path.clone(),
                    source,
                })?;
                let doc = paths::corpus_path(root, path);
                let mut warnings = Warnings::new();
                let entries = scan_document(&doc, &text, &mut warnings);
                Ok((doc, entries, warnings))
            })
            .collect::<Result<Vec<_>, AnchorError>>()?;

        let mut index = Self::new();
        let mut warnings = Warnings::new();
        for (doc, entries, file_warnings) in scanned {
            warnings.extend(file_warnings);
            index.merge(&doc, entries, &mut warnings);
        }
        tracing::debug!(files = files.len(), entries = index.len(), "Built anchor index");
        Ok((index, warnings.into_vec()))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn sample() -> AnchorIndex {
        AnchorIndex::parse(
            "/install/docker.rst=/install/docker.rst\n\
             /install/docker.rst.title=Docker\n\
             docker_run=/install/docker.rst#docker_run\n\
             docker_run.title=Running the container\n",
        )
    }

    #[test]
    fn test_lookup_exact() {
        let index = sample();
        let resolved = index.lookup("docker_run").unwrap();
        assert_eq!(resolved.location, "/install/docker.rst#docker_run");
        assert_eq!(resolved.title, Some("Running the container"));
    }

    #[test]
    fn test_lookup_case_insensitive_fallback() {
        let index = sample();
        assert_eq!(index.get("Docker_Run"), Some("/install/docker.rst#docker_run"));
        assert_eq!(index.title("DOCKER_RUN"), Some("Running the container"));
    }

    #[test]
    fn test_exact_match_wins_over_fallback() {
        let mut index = AnchorIndex::new();
        index.insert("intro", "/a.rst#intro");
        index.insert("Intro", "/b.rst#Intro");
        assert_eq!(index.get("intro"), Some("/a.rst#intro"));
        assert_eq!(index.get("Intro"), Some("/b.rst#Intro"));
    }

    #[test]
    fn test_parse_keeps_equals_in_value() {
        let index = AnchorIndex::parse("a.title=x = y\nnot an entry\n");
        assert_eq!(index.get("a.title"), Some("x = y"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_index_text_preserves_order() {
        let text = sample().to_index_text();
        assert_eq!(AnchorIndex::parse(&text).to_index_text(), text);
        assert!(text.starts_with("/install/docker.rst=/install/docker.rst\n"));
    }

    #[test]
    fn test_resolve_title_fallback_warns() {
        let index = AnchorIndex::new();
        let mut warnings = Warnings::new();
        let title = index.resolve_title("getting_started", "index.rst", &mut warnings);
        assert_eq!(title, "Getting Started");
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_resolve_location_broken() {
        let index = AnchorIndex::new();
        let mut warnings = Warnings::new();
        let location = index.resolve_location("missing", "index.rst", &mut warnings);
        assert_eq!(location, "missing-broken.rst");
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_merge_warns_on_conflict() {
        let mut index = AnchorIndex::new();
        let mut warnings = Warnings::new();
        index.merge("a.rst", vec![("x".into(), "/a.rst#x".into())], &mut warnings);
        index.merge("b.rst", vec![("x".into(), "/b.rst#x".into())], &mut warnings);
        index.merge("b.rst", vec![("x".into(), "/b.rst#x".into())], &mut warnings);
        assert_eq!(index.get("x"), Some("/b.rst#x"));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_build_scans_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("install")).unwrap();
        fs::write(root.join("index.rst"), "Welcome\n=======\n\nText.\n").unwrap();
        fs::write(
            root.join("install/docker.rst"),
            ".. _docker:\n\nDocker\n------\n\n.. _docker_run:\n\nRunning\n```````\n",
        )
        .unwrap();

        let (index, warnings) = AnchorIndex::build(root).unwrap();

        assert!(warnings.is_empty());
        assert_eq!(
            index.to_index_text(),
            "/index.rst=/index.rst\n\
             /index.rst.title=Welcome\n\
             docker=/install/docker.rst\n\
             docker.title=Docker\n\
             /install/docker.rst=/install/docker.rst\n\
             /install/docker.rst.title=Docker\n\
             docker_run=/install/docker.rst#docker_run\n\
             docker_run.title=Running\n"
        );
    }

    #[test]
    fn test_write_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("convert/anchors.txt");
        sample().write(&path).unwrap();
        let loaded = AnchorIndex::load(&path).unwrap();
        assert_eq!(loaded.to_index_text(), sample().to_index_text());
    }

    #[test]
    fn test_load_missing() {
        let dir = tempfile::tempdir().unwrap();
        let result = AnchorIndex::load(&dir.path().join("anchors.txt"));
        assert!(matches!(result, Err(AnchorError::Missing(_))));
    }
}
