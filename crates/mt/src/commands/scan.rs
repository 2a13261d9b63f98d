//! `mkdocs-translate scan` command implementation.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use mt_config::{Config, ProjectConfig};
use mt_engine::anchors::scan_document;
use mt_engine::downloads::{DownloadManifest, download_folder, scan_downloads};
use mt_engine::{AnchorIndex, Warnings, paths};

use super::check_folders;
use crate::discover::{absolute, collect_paths};
use crate::error::CliError;
use crate::output::Output;

/// Which scan to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ScanKind {
    All,
    Index,
    Download,
}

impl ScanKind {
    fn index(self) -> bool {
        matches!(self, Self::All | Self::Index)
    }

    fn download(self) -> bool {
        matches!(self, Self::All | Self::Download)
    }
}

/// Arguments for the scan command.
#[derive(Args)]
pub(crate) struct ScanArgs {
    /// Scan to perform.
    #[arg(long, value_enum, default_value_t = ScanKind::All)]
    scan: ScanKind,

    /// Test scan a single rst file, printing results instead of writing them.
    file: Option<PathBuf>,
}

impl ScanArgs {
    /// Execute the scan command.
    ///
    /// # Errors
    ///
    /// Returns an error if the folders are missing or results cannot be written.
    pub(crate) fn execute(self, config_path: Option<&Path>) -> Result<(), CliError> {
        let output = Output::new();
        let config = Config::load(config_path, None)?;
        let project = &config.project_resolved;
        check_folders(project)?;

        if let Some(file) = &self.file {
            return test_scan(&output, project, &absolute(file), self.scan);
        }

        if self.scan.index() {
            let (index, warnings) = AnchorIndex::build(&project.rst_dir)?;
            index.write(&project.anchor_file)?;
            output.success(&format!(
                "Wrote {} anchor entries to {}",
                index.len(),
                project.anchor_file.display()
            ));
            output.warnings(warnings.len());
        }

        if self.scan.download() {
            let files = collect_paths(std::slice::from_ref(&project.rst_dir), "rst")?;
            tracing::info!(files = files.len(), "Scanning downloads");
            let manifest = download_manifest(project, &files)?;
            for path in manifest.write()? {
                output.result(&path.display().to_string());
            }
        }
        Ok(())
    }
}

/// Group the external downloads of `files` by their docs download folder.
fn download_manifest(project: &ProjectConfig, files: &[PathBuf]) -> Result<DownloadManifest, CliError> {
    let mut manifest = DownloadManifest::new();
    for file in files {
        let doc = paths::corpus_path(&project.rst_dir, file);
        let downloads = scan_downloads(&doc, &fs::read_to_string(file)?);
        warn_missing(project, &doc, &downloads);
        manifest.add(download_folder(&project.docs_dir, &doc), downloads);
    }
    Ok(manifest)
}

/// Warn about downloads that do not resolve inside the rst tree.
fn warn_missing<'a>(project: &ProjectConfig, doc: &str, downloads: impl IntoIterator<Item = &'a String>) {
    let folder = download_folder(&project.rst_dir, doc);
    for download in downloads {
        let check = folder.join(download);
        if !check.exists() {
            tracing::warn!(path = %doc, download = %download, check = %check.display(), "Download not found");
        }
    }
}

fn test_scan(output: &Output, project: &ProjectConfig, file: &Path, kind: ScanKind) -> Result<(), CliError> {
    if !file.starts_with(&project.rst_dir) {
        return Err(CliError::Validation(format!(
            "{} does not contain {}",
            project.rst_dir.display(),
            file.display()
        )));
    }
    let doc = paths::corpus_path(&project.rst_dir, file);
    let text = fs::read_to_string(file)?;

    if kind.index() {
        output.highlight(&format!("Anchor and heading index: {doc}"));
        let mut warnings = Warnings::new();
        for (key, value) in scan_document(&doc, &text, &mut warnings) {
            output.result(&format!("{key}={value}"));
        }
        output.warnings(warnings.len());
    }
    if kind.download() {
        output.highlight(&format!(":download: references: {doc}"));
        let downloads = scan_downloads(&doc, &text);
        warn_missing(project, &doc, &downloads);
        for download in &downloads {
            output.result(download);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_scan_kind_selection() {
        assert!(ScanKind::All.index() && ScanKind::All.download());
        assert!(ScanKind::Index.index() && !ScanKind::Index.download());
        assert!(!ScanKind::Download.index() && ScanKind::Download.download());
    }

    #[test]
    fn test_download_manifest_groups_by_docs_folder() {
        let dir = TempDir::new().unwrap();
        let project = ProjectConfig {
            rst_dir: dir.path().join("source"),
            docs_dir: dir.path().join("docs"),
            ..ProjectConfig::default()
        };
        let page = project.rst_dir.join("data/index.rst");
        fs::create_dir_all(page.parent().unwrap()).unwrap();
        fs::write(&page, "Get :download:`world <../../../data/world.zip>`.\n").unwrap();

        let manifest = download_manifest(&project, &[page]).unwrap();
        let folders: Vec<_> = manifest.iter().collect();
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].0, dir.path().join("docs/data/download"));
        assert_eq!(
            folders[0].1,
            &BTreeSet::from(["../../../../data/world.zip".to_owned()])
        );
    }
}
