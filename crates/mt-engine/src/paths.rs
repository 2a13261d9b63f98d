//! Corpus-relative document paths.
//!
//! Documents are identified by their path relative to the source folder,
//! `/`-separated and without a leading slash (`install/docker.rst`). The
//! depth of a document is the number of `/` separators in that path.

use std::path::Path;

/// Number of directories between the corpus root and `doc`.
pub fn depth(doc: &str) -> usize {
    doc.trim_start_matches('/').matches('/').count()
}

/// Directory portion of `doc`, empty for documents at the corpus root.
pub fn parent_dir(doc: &str) -> &str {
    let doc = doc.trim_start_matches('/');
    doc.rfind('/').map_or("", |idx| &doc[..idx])
}

/// Final path segment.
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Collapse `.` and `..` segments and drop any leading slash.
///
/// `..` segments that climb above the root are kept, so the result may
/// start with one or more `../`.
pub fn normalize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|last| *last != "..") {
                    segments.pop();
                } else {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Resolve `reference` against the directory `dir`.
pub fn join(dir: &str, reference: &str) -> String {
    if dir.is_empty() {
        normalize(reference)
    } else {
        normalize(&format!("{dir}/{reference}"))
    }
}

/// Compute the path from document `from` to corpus path `to`.
///
/// The last segment of `from` is the document itself, so its directory is
/// the base of the result.
///
/// # Examples
///
/// ```
/// use mt_engine::paths::relative_path;
///
/// assert_eq!(relative_path("user/index.rst", "install/docker.rst#run"), "../install/docker.rst#run");
/// assert_eq!(relative_path("index.rst", "setup.rst"), "setup.rst");
/// ```
pub fn relative_path(from: &str, to: &str) -> String {
    let to = normalize(to);
    let from_dir = normalize(parent_dir(from));
    let from_segs: Vec<&str> = from_dir.split('/').filter(|s| !s.is_empty()).collect();
    let to_segs: Vec<&str> = to.split('/').filter(|s| !s.is_empty()).collect();

    let common = from_segs
        .iter()
        .zip(&to_segs)
        .take_while(|(a, b)| a == b)
        .count();

    let ups_part = "../".repeat(from_segs.len() - common);
    let down_part = to_segs[common..].join("/");

    let result = format!("{ups_part}{down_part}");
    if result.is_empty() {
        "./".to_owned()
    } else {
        result
    }
}

/// Rewrite a root-anchored reference (`/install/docker`) so it is relative
/// to `doc`. Other references are returned trimmed but otherwise unchanged.
pub fn rooted_to_relative(doc: &str, reference: &str) -> String {
    let reference = reference.trim();
    match reference.strip_prefix('/') {
        Some(rest) => format!("{}{rest}", "../".repeat(depth(doc))),
        None => reference.to_owned(),
    }
}

/// Replace the `.rst` suffix of `doc` with `extension` (given without a dot).
pub fn with_extension(doc: &str, extension: &str) -> String {
    let stem = doc.strip_suffix(".rst").unwrap_or(doc);
    format!("{stem}.{extension}")
}

/// Navigation key of a source document: `install/docker.rst` becomes
/// `install/docker.md`.
pub fn nav_key(doc: &str) -> String {
    with_extension(doc.trim_start_matches('/'), "md")
}

/// Human-readable fallback title derived from a link.
///
/// Strips `.rst`/`.md` and a trailing `/index`, turns `-`, `_` and `/`
/// into spaces and title-cases the result.
///
/// ```
/// use mt_engine::paths::label;
///
/// assert_eq!(label("wfs-service/index.rst"), "Wfs Service");
/// ```
pub fn label(link: &str) -> String {
    let mut link = link;
    link = link.strip_suffix(".rst").unwrap_or(link);
    link = link.strip_suffix(".md").unwrap_or(link);
    link = link.strip_suffix("/index").unwrap_or(link);
    let spaced = link.replace(['-', '_', '/'], " ");
    title_case(&spaced).trim().to_owned()
}

/// Uppercase the first letter of every alphabetic run and lowercase the rest.
pub fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut previous_cased = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if previous_cased {
                result.extend(ch.to_lowercase());
            } else {
                result.extend(ch.to_uppercase());
            }
            previous_cased = true;
        } else {
            result.push(ch);
            previous_cased = false;
        }
    }
    result
}

/// `/`-separated path of file `path` relative to the corpus `root`.
pub fn corpus_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
