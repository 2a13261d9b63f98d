//! Cleanup around the translation round trip.
//!
//! Markdown goes out as HTML and comes back translated. Before conversion
//! to HTML, code fences get explicit language tags and `!!!` admonitions
//! become fenced divs. Code elements are wrapped in CDATA so the
//! translation service leaves them alone. On the way back both are undone.

use std::sync::LazyLock;

use regex::Regex;

use crate::fence::{FenceEvent, FenceTracker};

static NOTE_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^<p>:: : note ").unwrap());
static NOTE_CLOSE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^<p>:: :</p>").unwrap());
static CODE_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<code([^>]*)>").unwrap());
static CDATA_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<code([^>]*)><!\[CDATA\[").unwrap());
static ICON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":(fontawesome-\S*)\s:").unwrap());
static TEXT_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(\s*```) ?#text[ \t]*$").unwrap());
static TAGGED_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(\s*```) ?#(\S+)[ \t]*$").unwrap());

const ADMONITION_MARKER: &str = "!!! ";

/// An admonition being gathered.
struct Admonition {
    padding: String,
    title: String,
    lines: Vec<String>,
}

impl Admonition {
    fn content_prefix(&self) -> String {
        format!("{}    ", self.padding)
    }

    fn render(mut self, out: &mut String) {
        while self.lines.last().is_some_and(|line| line.trim().is_empty()) {
            self.lines.pop();
        }
        out.push_str(&format!("{}::: {}\n", self.padding, self.title));
        out.push('\n');
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(&format!("{}:::\n\n", self.padding));
    }
}

/// Prepare Markdown for conversion to HTML.
///
/// Opening code fences are tagged (`` ```#xml ``, `` ```#text ``) so the
/// converter keeps them fenced. `!!!` admonitions become `:::` fenced divs.
pub fn markdown_to_fenced(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut tracker = FenceTracker::new();
    let mut pending: Option<Admonition> = None;

    for line in text.lines() {
        let was_in_code = tracker.in_fence();
        let line = match tracker.update(line) {
            Some(FenceEvent::Open { info }) => tag_fence(line, &info),
            _ => line.to_owned(),
        };

        if let Some(admonition) = pending.as_mut() {
            if line.trim().is_empty() {
                if !admonition.lines.is_empty() {
                    admonition.lines.push(String::new());
                }
                continue;
            }
            let prefix = admonition.content_prefix();
            if let Some(content) = line.strip_prefix(&prefix) {
                admonition.lines.push(format!("{}{content}", admonition.padding));
                continue;
            }
            if let Some(done) = pending.take() {
                done.render(&mut out);
            }
        }

        if !was_in_code && let Some(idx) = line.find(ADMONITION_MARKER) {
            let (padding, rest) = line.split_at(idx);
            if padding.trim().is_empty() {
                pending = Some(Admonition {
                    padding: padding.to_owned(),
                    title: rest[ADMONITION_MARKER.len()..].trim().to_owned(),
                    lines: Vec::new(),
                });
                continue;
            }
        }

        out.push_str(&line);
        out.push('\n');
    }

    if let Some(admonition) = pending {
        admonition.render(&mut out);
    }
    out
}

fn tag_fence(line: &str, info: &str) -> String {
    let end = line.trim_end();
    let tag = if info.is_empty() { "text" } else { info };
    let fence_end = end.len() - end.trim_start().len()
        + end.trim_start().chars().take_while(|c| *c == '`' || *c == '~').count();
    format!("{}#{tag}", &end[..fence_end])
}

/// Wrap code element content in CDATA so the translation service skips it.
pub fn protect_code(html: &str) -> String {
    let html = CODE_OPEN_RE.replace_all(html, "<code${1}><![CDATA[");
    html.replace("</code>", "]]></code>")
}

/// Undo [`protect_code`] and restore note divs mangled by conversion.
pub fn clean_translated_html(html: &str) -> String {
    let html = NOTE_OPEN_RE.replace_all(html, "<div class=\"note\">\n<p>");
    let html = NOTE_CLOSE_RE.replace_all(&html, "</div>");
    let html = CDATA_OPEN_RE.replace_all(&html, "<code${1}>");
    html.replace("]]></code>", "</code>")
}

/// Repair Markdown converted back from translated HTML.
pub fn clean_translated_markdown(text: &str) -> String {
    let text = ICON_RE.replace_all(text, ":${1}:");
    let text = TEXT_FENCE_RE.replace_all(&text, "${1}");
    TAGGED_FENCE_RE.replace_all(&text, "${1}${2}").into_owned()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_fences_tagged() {
        let text = "```\nplain\n```\n\n```xml\n<a/>\n```\n";
        assert_eq!(
            markdown_to_fenced(text),
            "```#text\nplain\n```\n\n```#xml\n<a/>\n```\n"
        );
    }

    #[test]
    fn test_admonition_to_fenced_div() {
        let text = "Intro\n\n!!! note\n\n    First line.\n\n    Second line.\n\nAfter\n";
        assert_eq!(
            markdown_to_fenced(text),
            "Intro\n\n::: note\n\nFirst line.\n\nSecond line.\n:::\n\nAfter\n"
        );
    }

    #[test]
    fn test_nested_admonition_keeps_padding() {
        let text = "1.  Step\n\n    !!! warning \"Careful\"\n\n        Body\n";
        assert_eq!(
            markdown_to_fenced(text),
            "1.  Step\n\n    ::: warning \"Careful\"\n\n    Body\n    :::\n\n"
        );
    }

    #[test]
    fn test_admonition_marker_in_code_ignored() {
        let text = "```\n!!! note\n```\n";
        assert_eq!(markdown_to_fenced(text), "```#text\n!!! note\n```\n");
    }

    #[test]
    fn test_protect_and_clean_code() {
        let html = "<p>Run <code>ls -l</code></p>";
        let protected = protect_code(html);
        assert_eq!(protected, "<p>Run <code><![CDATA[ls -l]]></code></p>");
        assert_eq!(clean_translated_html(&protected), html);
    }

    #[test]
    fn test_clean_note_paragraphs() {
        let html = "<p>:: : note Remarque</p>\n<p>:: :</p>\n";
        assert_eq!(
            clean_translated_html(html),
            "<div class=\"note\">\n<p>Remarque</p>\n</div>\n"
        );
    }

    #[test]
    fn test_clean_translated_markdown() {
        let text = "Click :fontawesome-solid-gear :\n\n``` #text\nls\n```\n\n``` #xml\n<a/>\n```\n";
        assert_eq!(
            clean_translated_markdown(text),
            "Click :fontawesome-solid-gear:\n\n```\nls\n```\n\n```xml\n<a/>\n```\n"
        );
    }
}
