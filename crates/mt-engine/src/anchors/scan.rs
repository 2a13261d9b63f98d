//! Label and heading detection for a single document.

use std::sync::LazyLock;

use regex::Regex;

use super::TITLE_SUFFIX;
use crate::warnings::Warnings;

static LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\.\. _([\w.\-]+):\s*$").unwrap());

/// Characters allowed in a section underline.
const UNDERLINE_CHARS: &str = "#*=-^\"~'+`";

/// Return the heading text when `lines[index]` is underlined by `lines[index + 1]`.
///
/// The underline must repeat one punctuation character and be at least as
/// long as the trimmed heading text.
pub fn scan_heading<'a>(lines: &[&'a str], index: usize) -> Option<&'a str> {
    let text = lines.get(index)?.trim_end();
    let under = lines.get(index + 1)?.trim_end();
    if text.trim().is_empty() {
        return None;
    }

    let mut chars = under.chars();
    let first = chars.next()?;
    if !UNDERLINE_CHARS.contains(first) || !chars.all(|c| c == first) {
        return None;
    }
    if under.chars().count() < text.chars().count() {
        return None;
    }
    Some(text)
}

/// Scan one document for its title and labelled headings.
///
/// `doc` is the corpus-relative path. Returns index entries in the order
/// they were found. A label immediately followed by the first heading of the
/// document points at the document itself rather than at a fragment.
pub fn scan_document(doc: &str, text: &str, warnings: &mut Warnings) -> Vec<(String, String)> {
    let doc_key = format!("/{}", doc.trim_start_matches('/'));
    let lines: Vec<&str> = text.lines().collect();
    let mut entries = Vec::new();
    let mut doc_pending = true;
    let mut label: Option<&str> = None;

    for (idx, line) in lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        let heading = scan_heading(&lines, idx);

        if let (Some(pending), Some(title)) = (label, heading) {
            let location = if doc_pending {
                doc_key.clone()
            } else {
                format!("{doc_key}#{pending}")
            };
            entries.push((pending.to_owned(), location));
            entries.push((format!("{pending}{TITLE_SUFFIX}"), title.to_owned()));
            label = None;
        }

        if doc_pending && let Some(title) = heading {
            entries.push((doc_key.clone(), doc_key.clone()));
            entries.push((format!("{doc_key}{TITLE_SUFFIX}"), title.to_owned()));
            doc_pending = false;
        }

        if let Some(caps) = LABEL_RE.captures(line) {
            if let Some(unpaired) = label {
                warnings.push(doc, format!("Label '{unpaired}' is not followed by a heading"));
            }
            label = caps.get(1).map(|m| m.as_str());
        }
    }

    if let Some(unpaired) = label {
        warnings.push(doc, format!("Label '{unpaired}' is not followed by a heading"));
    }
    entries
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn pairs(entries: &[(String, String)]) -> Vec<(&str, &str)> {
        entries.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
    }

    #[test]
    fn test_scan_heading_underline() {
        let lines = ["Installation", "============", "text"];
        assert_eq!(scan_heading(&lines, 0), Some("Installation"));
        assert_eq!(scan_heading(&lines, 1), None);
    }

    #[test]
    fn test_scan_heading_short_underline() {
        let lines = ["Installation", "====="];
        assert_eq!(scan_heading(&lines, 0), None);
    }

    #[test]
    fn test_scan_heading_mixed_underline() {
        let lines = ["Title", "==-=="];
        assert_eq!(scan_heading(&lines, 0), None);
    }

    #[test]
    fn test_scan_heading_trailing_whitespace() {
        let lines = ["Title   ", "-----  "];
        assert_eq!(scan_heading(&lines, 0), Some("Title"));
    }

    #[test]
    fn test_scan_heading_last_line() {
        let lines = ["Title"];
        assert_eq!(scan_heading(&lines, 0), None);
    }

    #[test]
    fn test_scan_document_title_and_labels() {
        let text = "Styling\n=======\n\nIntro.\n\n.. _sld_cookbook:\n\nCookbook\n--------\n";
        let mut warnings = Warnings::new();
        let entries = scan_document("styling/index.rst", text, &mut warnings);

        assert_eq!(
            pairs(&entries),
            vec![
                ("/styling/index.rst", "/styling/index.rst"),
                ("/styling/index.rst.title", "Styling"),
                ("sld_cookbook", "/styling/index.rst#sld_cookbook"),
                ("sld_cookbook.title", "Cookbook"),
            ]
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_scan_document_label_before_title() {
        let text = ".. _styling:\n\nStyling\n=======\n";
        let mut warnings = Warnings::new();
        let entries = scan_document("styling/index.rst", text, &mut warnings);

        assert_eq!(
            pairs(&entries),
            vec![
                ("styling", "/styling/index.rst"),
                ("styling.title", "Styling"),
                ("/styling/index.rst", "/styling/index.rst"),
                ("/styling/index.rst.title", "Styling"),
            ]
        );
    }

    #[test]
    fn test_scan_document_unpaired_labels_warn() {
        let text = "Title\n=====\n\n.. _first:\n.. _second:\n\nSection\n-------\n\n.. _dangling:\n";
        let mut warnings = Warnings::new();
        let entries = scan_document("page.rst", text, &mut warnings);

        assert_eq!(warnings.len(), 2);
        assert!(entries.contains(&("second".to_owned(), "/page.rst#second".to_owned())));
        assert!(!entries.iter().any(|(k, _)| k == "first" || k == "dangling"));
    }
}
