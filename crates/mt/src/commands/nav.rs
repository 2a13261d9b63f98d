//! `mkdocs-translate nav` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use mt_config::{Config, ProjectConfig};
use mt_engine::{FsSource, NavBuilder, nav, paths};

use super::{check_folders, load_context};
use crate::discover::absolute;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the nav command.
#[derive(Args)]
pub(crate) struct NavArgs {
    /// Root rst file, or a folder containing `index.rst` (default: the rst folder).
    file: Option<PathBuf>,
}

impl NavArgs {
    /// Execute the nav command.
    ///
    /// # Errors
    ///
    /// Returns an error if the anchor index is missing or the root file cannot be read.
    pub(crate) fn execute(self, config_path: Option<&Path>) -> Result<(), CliError> {
        let output = Output::new();
        let config = Config::load(config_path, None)?;
        let project = &config.project_resolved;
        check_folders(project)?;

        let root = root_document(project, self.file.as_deref())?;
        let ctx = load_context(&config)?;
        let source = FsSource::new(project.rst_dir.clone());

        let doc = paths::corpus_path(&project.rst_dir, &root);
        tracing::info!(path = %doc, "Building navigation");
        let mut builder = NavBuilder::new(&ctx, &source);
        let tree = builder.build(&doc)?;
        let warnings = builder.into_warnings();

        output.result(nav::to_yaml(&tree)?.trim_end());
        output.warnings(warnings.len());
        Ok(())
    }
}

/// Resolve the root document, which must live in the rst folder.
fn root_document(project: &ProjectConfig, file: Option<&Path>) -> Result<PathBuf, CliError> {
    let mut root = file.map_or_else(|| project.rst_dir.clone(), absolute);
    if root.is_dir() {
        root = root.join("index.rst");
    }
    if !root.is_file() {
        return Err(CliError::NotFound(root));
    }
    if !root.starts_with(&project.rst_dir) {
        return Err(CliError::Validation(format!(
            "{} does not contain {}",
            project.rst_dir.display(),
            root.display()
        )));
    }
    Ok(root)
}
