//! Error types for the conversion pipeline.

use std::path::PathBuf;

use mt_engine::FenceError;

/// Error converting a single file.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// Input file does not exist.
    #[error("Input file not found: {}", .0.display())]
    MissingInput(PathBuf),

    /// Input file has the wrong extension.
    #[error("Expected a .{expected} file: {}", path.display())]
    Extension {
        path: PathBuf,
        expected: &'static str,
    },

    /// Input file is not below the folder it must be converted from.
    #[error("{} is not inside {}", path.display(), root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("Failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Converter could not be started.
    #[error("Failed to run {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Converter exited unsuccessfully.
    #[error("{program} failed ({status}): {stderr}")]
    Converter {
        program: String,
        status: String,
        stderr: String,
    },

    /// Converter ran past its time limit and was killed.
    #[error("{program} timed out after {secs}s")]
    Timeout { program: String, secs: u64 },

    /// Converter exited successfully without writing its output.
    #[error("Converter did not create {}", .0.display())]
    MissingOutput(PathBuf),

    /// Converter output holds malformed nested blocks.
    #[error("Malformed converter output for {}", path.display())]
    Fence {
        path: PathBuf,
        #[source]
        source: FenceError,
    },
}
