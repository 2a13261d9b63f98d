//! CLI error types.

use std::path::PathBuf;

use mt_config::ConfigError;
use mt_convert::ConvertError;
use mt_deepl::DeeplError;
use mt_engine::downloads::DownloadError;
use mt_engine::{AnchorError, NavError};

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Anchor(#[from] AnchorError),

    #[error("{0}")]
    Nav(#[from] NavError),

    #[error("{0}")]
    Convert(#[from] ConvertError),

    #[error("{0}")]
    Deepl(#[from] DeeplError),

    #[error("{0}")]
    Download(#[from] DownloadError),

    #[error("{0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Path does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("{failed} of {total} file(s) failed")]
    Failed { failed: usize, total: usize },

    #[error("{0}")]
    Validation(String),
}
