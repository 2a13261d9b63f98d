//! `mkdocs-translate migrate` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use mt_config::Config;
use mt_convert::Migrator;

use super::{check_folders, load_context};
use crate::discover::{absolute, collect_paths};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the migrate command.
#[derive(Args)]
pub(crate) struct MigrateArgs {
    /// rst files, folders or glob patterns to convert (default: the rst folder).
    paths: Vec<PathBuf>,
}

impl MigrateArgs {
    /// Execute the migrate command.
    ///
    /// A file that fails to convert is reported and skipped; the command
    /// fails at the end if any file did.
    ///
    /// # Errors
    ///
    /// Returns an error if setup fails or any file could not be converted.
    pub(crate) fn execute(self, config_path: Option<&Path>) -> Result<(), CliError> {
        let output = Output::new();
        let config = Config::load(config_path, None)?;
        let project = &config.project_resolved;
        check_folders(project)?;

        let ctx = load_context(&config)?;
        let pandoc = mt_convert::pandoc(&config);
        let migrator = Migrator::new(project, &pandoc);

        let inputs = if self.paths.is_empty() {
            vec![project.rst_dir.clone()]
        } else {
            self.paths.iter().map(|path| absolute(path)).collect()
        };
        let files = collect_paths(&inputs, "rst")?;
        tracing::info!(files = files.len(), "Migrating");

        let mut failed = 0;
        let mut warnings = 0;
        for file in &files {
            match migrator.convert_rst(&ctx, file) {
                Ok(converted) => {
                    warnings += converted.warnings.len();
                    output.result(&converted.output.display().to_string());
                }
                Err(err) => {
                    failed += 1;
                    output.error(&format!("{}: {err}", file.display()));
                }
            }
        }

        output.warnings(warnings);
        if failed > 0 {
            return Err(CliError::Failed {
                failed,
                total: files.len(),
            });
        }
        output.success(&format!("Migrated {} file(s)", files.len()));
        Ok(())
    }
}
