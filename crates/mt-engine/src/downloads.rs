//! `:download:` targets that live outside a document's own folder.
//!
//! Downloads below the document are copied by the site generator. Anything
//! that climbs above the corpus root has to be staged into a `download/`
//! folder next to the page; the manifest lists what to stage.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::inline::{DOWNLOAD_LABELED_RE, DOWNLOAD_RE};
use crate::paths;

/// Manifest file written into each download folder.
pub const MANIFEST_FILE: &str = "download.txt";

const GITIGNORE: &str = "*\n!download.txt";

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Collect the external download references of `doc`.
///
/// Returned paths are relative to the `download/` folder beside `doc`.
pub fn scan_downloads(doc: &str, text: &str) -> BTreeSet<String> {
    if !text.contains(":download:") {
        return BTreeSet::new();
    }

    let named = DOWNLOAD_LABELED_RE
        .captures_iter(text)
        .map(|caps| caps[2].to_owned());
    let simple = DOWNLOAD_RE.captures_iter(text).map(|caps| caps[1].to_owned());

    let depth = paths::depth(doc);
    named
        .chain(simple)
        .filter_map(|download| {
            let download = match download.strip_prefix('/') {
                Some(rooted) => format!("{}{rooted}", "../".repeat(depth)),
                None => download,
            };
            (depth < download.matches("../").count()).then(|| format!("../{download}"))
        })
        .collect()
}

/// Folder that receives the staged downloads of `doc`.
pub fn download_folder(docs_root: &Path, doc: &str) -> PathBuf {
    let parent = paths::parent_dir(doc);
    if parent.is_empty() {
        docs_root.join("download")
    } else {
        docs_root.join(parent).join("download")
    }
}

/// Download references grouped by destination folder.
#[derive(Debug, Default)]
pub struct DownloadManifest {
    folders: BTreeMap<PathBuf, BTreeSet<String>>,
}

impl DownloadManifest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, folder: PathBuf, downloads: impl IntoIterator<Item = String>) {
        let mut downloads = downloads.into_iter().peekable();
        if downloads.peek().is_none() {
            return;
        }
        self.folders.entry(folder).or_default().extend(downloads);
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &BTreeSet<String>)> {
        self.folders
            .iter()
            .map(|(folder, downloads)| (folder.as_path(), downloads))
    }

    /// Write `download.txt` and a `.gitignore` into every folder.
    ///
    /// Returns the manifest files written.
    pub fn write(&self) -> Result<Vec<PathBuf>, DownloadError> {
        let mut written = Vec::with_capacity(self.folders.len());
        for (folder, downloads) in &self.folders {
            fs::create_dir_all(folder).map_err(|source| DownloadError::Write {
                path: folder.clone(),
                source,
            })?;

            let manifest = folder.join(MANIFEST_FILE);
            let text = downloads.iter().map(String::as_str).collect::<Vec<_>>().join("\n");
            write_file(&manifest, &text)?;
            write_file(&folder.join(".gitignore"), GITIGNORE)?;

            tracing::info!(path = %manifest.display(), count = downloads.len(), "Wrote download manifest");
            written.push(manifest);
        }
        Ok(written)
    }
}

fn write_file(path: &Path, text: &str) -> Result<(), DownloadError> {
    fs::write(path, text).map_err(|source| DownloadError::Write {
        path: path.to_path_buf(),
        source,
    })
}
