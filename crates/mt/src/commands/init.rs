//! `mkdocs-translate init` command implementation.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use mt_config::Config;

use super::check_rst_folder;
use crate::discover::{absolute, collect_other_files};
use crate::error::CliError;
use crate::output::Output;

/// Files that only matter to the Sphinx build.
const SKIPPED: [&str; 1] = ["conf.py"];

/// Arguments for the init command.
#[derive(Args)]
pub(crate) struct InitArgs {
    /// Folders inside the rst folder to copy (default: the whole rst folder).
    paths: Vec<PathBuf>,
}

impl InitArgs {
    /// Execute the init command.
    ///
    /// # Errors
    ///
    /// Returns an error if the rst folder is missing or a copy fails.
    pub(crate) fn execute(self, config_path: Option<&Path>) -> Result<(), CliError> {
        let output = Output::new();
        let config = Config::load(config_path, None)?;
        let project = &config.project_resolved;
        check_rst_folder(project)?;

        if project.rst_dir == project.docs_dir {
            output.warning("The rst folder is the docs folder, nothing to copy");
            return Ok(());
        }

        let mut roots = Vec::new();
        if self.paths.is_empty() {
            roots.push(project.rst_dir.clone());
        }
        for path in &self.paths {
            let path = absolute(path);
            if !path.exists() {
                return Err(CliError::NotFound(path));
            }
            if path.is_dir() && path.starts_with(&project.rst_dir) {
                roots.push(path);
            } else {
                output.warning(&format!(
                    "{} does not contain folder {}",
                    project.rst_dir.display(),
                    path.display()
                ));
            }
        }

        if !project.docs_dir.exists() {
            tracing::info!(path = %project.docs_dir.display(), "Creating docs folder");
        }
        let copied = copy_assets(&project.rst_dir, &project.docs_dir, &roots)?;
        for path in &copied {
            output.result(&path.display().to_string());
        }
        output.success(&format!("Copied {} file(s)", copied.len()));
        Ok(())
    }
}

/// Copy every non-rst file below `roots` from `rst_dir` into `docs_dir`.
fn copy_assets(rst_dir: &Path, docs_dir: &Path, roots: &[PathBuf]) -> Result<Vec<PathBuf>, CliError> {
    fs::create_dir_all(docs_dir)?;

    let mut copied = Vec::new();
    for root in roots {
        for file in collect_other_files(root, "rst")? {
            let skipped = file
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| SKIPPED.contains(&name));
            if skipped {
                continue;
            }
            let Ok(relative) = file.strip_prefix(rst_dir) else {
                continue;
            };
            let copy = docs_dir.join(relative);
            if let Some(parent) = copy.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&file, &copy)?;
            tracing::debug!(from = %file.display(), to = %copy.display(), "Copied");
            copied.push(copy);
        }
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_copy_assets_skips_rst_and_conf() {
        let dir = TempDir::new().unwrap();
        let rst = dir.path().join("source");
        let docs = dir.path().join("docs");
        for file in ["index.rst", "conf.py", "img/logo.png", "data/sample.sld"] {
            let path = rst.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "x").unwrap();
        }

        let copied = copy_assets(&rst, &docs, &[rst.join("img")]).unwrap();
        assert_eq!(copied, vec![docs.join("img/logo.png")]);

        let copied = copy_assets(&rst, &docs, &[rst.clone()]).unwrap();
        assert_eq!(
            copied,
            vec![docs.join("data/sample.sld"), docs.join("img/logo.png")]
        );
        assert!(!docs.join("conf.py").exists());
        assert!(!docs.join("index.rst").exists());
    }
}
