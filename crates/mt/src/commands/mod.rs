//! CLI command implementations.

pub(crate) mod init;
pub(crate) mod migrate;
pub(crate) mod nav;
pub(crate) mod scan;
pub(crate) mod translate;

use mt_config::{Config, ProjectConfig};
use mt_engine::{AnchorError, AnchorIndex, Context};

use crate::error::CliError;

pub(crate) use init::InitArgs;
pub(crate) use migrate::MigrateArgs;
pub(crate) use nav::NavArgs;
pub(crate) use scan::ScanArgs;
pub(crate) use translate::{
    FrenchArgs, InternalDocumentArgs, InternalHtmlArgs, InternalMarkdownArgs,
};

/// Require the docs and rst folders before touching anything.
fn check_folders(project: &ProjectConfig) -> Result<(), CliError> {
    if !project.docs_dir.is_dir() {
        return Err(CliError::Validation(format!(
            "The docs folder does not exist at location: {}",
            project.docs_dir.display()
        )));
    }
    check_rst_folder(project)
}

fn check_rst_folder(project: &ProjectConfig) -> Result<(), CliError> {
    if !project.rst_dir.is_dir() {
        return Err(CliError::Validation(format!(
            "The rst folder does not exist at location: {}",
            project.rst_dir.display()
        )));
    }
    Ok(())
}

/// Engine context with the anchor index written by `scan`.
fn load_context(config: &Config) -> Result<Context, CliError> {
    let anchor_file = &config.project_resolved.anchor_file;
    let anchors = AnchorIndex::load(anchor_file).map_err(|err| match err {
        AnchorError::Missing(path) => CliError::Validation(format!(
            "Anchor index not found at {}, run `mkdocs-translate scan` first",
            path.display()
        )),
        other => other.into(),
    })?;
    tracing::debug!(entries = anchors.len(), path = %anchor_file.display(), "Loaded anchor index");
    Ok(mt_convert::context(config, anchors))
}
