//! Input file discovery.

use std::path::{Path, PathBuf};

use crate::error::CliError;

/// Files with `extension` named by `paths`.
///
/// Each path is a file, a folder searched recursively, or a glob pattern.
/// Results are sorted and unique.
pub(crate) fn collect_paths(paths: &[PathBuf], extension: &str) -> Result<Vec<PathBuf>, CliError> {
    let mut files = Vec::new();
    for path in paths {
        let text = path.to_string_lossy();
        if text.contains('*') {
            files.extend(glob_files(&text)?.into_iter().filter(|f| has_extension(f, extension)));
        } else if path.is_file() {
            if has_extension(path, extension) {
                files.push(path.clone());
            } else {
                tracing::warn!(path = %path.display(), extension, "Skipping file with other extension");
            }
        } else if path.is_dir() {
            let pattern = format!("{}/**/*.{extension}", glob::Pattern::escape(&text));
            files.extend(glob_files(&pattern)?);
        } else {
            return Err(CliError::NotFound(path.clone()));
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Every file below `root` that does not have `extension`.
pub(crate) fn collect_other_files(root: &Path, extension: &str) -> Result<Vec<PathBuf>, CliError> {
    let pattern = format!("{}/**/*", glob::Pattern::escape(&root.to_string_lossy()));
    let mut files: Vec<_> = glob_files(&pattern)?
        .into_iter()
        .filter(|f| !has_extension(f, extension))
        .collect();
    files.sort();
    Ok(files)
}

fn glob_files(pattern: &str) -> Result<Vec<PathBuf>, CliError> {
    let mut files = Vec::new();
    for entry in glob::glob(pattern)? {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(err) => tracing::warn!(error = %err, "Unreadable path"),
        }
    }
    Ok(files)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(extension)
}

/// Make `path` absolute against the current directory.
pub(crate) fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
