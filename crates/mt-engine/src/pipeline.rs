//! Text passes on either side of the external converter.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::context::{Context, FileScope};
use crate::directive::{self, PASSES};
use crate::fence::{FenceEvent, FenceTracker};
use crate::fenced::{self, FenceError};
use crate::inline;
use crate::paths;

static TITLE_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\{\.title-ref\}").unwrap());
static RST_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(.+?)\]\(([\w\-/.]*?)\.rst(#[^)]*)?\)").unwrap());
static FILE_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*\\`(.*?)\\`\*\*").unwrap());
static HEADER_ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#+) (.*?)\s+\{#(.+?)\s*\}$").unwrap());
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[(.*?)\]\((.*?)\)").unwrap());
static MACRO_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{ .* \}\}").unwrap());

/// Escapes the converter adds that Markdown does not need, in replacement order.
const UNESCAPES: [(&str, &str); 14] = [
    (r"**\`", "**`"),
    (r"\`**", "`**"),
    (r"\<", "<"),
    (r"\>", ">"),
    (r"\_", "_"),
    (r"\`", "`"),
    (r"\'", "'"),
    (r#"\""#, "\""),
    (r"\[", "["),
    (r"\]", "]"),
    (r"\*", "*"),
    (r"\-", "-"),
    (r"\|", "|"),
    (r"\@", "@"),
];

/// Rewrite a source document before conversion: directive passes in order,
/// then inline role rules.
pub fn preprocess(scope: &mut FileScope<'_>, text: &str) -> String {
    let mut text = text.to_owned();
    for pass in PASSES {
        text = directive::apply(*pass, scope, &text);
    }
    inline::resolve(scope, &text)
}

/// Repair converter output for `doc` (corpus-relative source path).
pub fn postprocess(ctx: &Context, doc: &str, text: &str) -> Result<String, FenceError> {
    let text = TITLE_REF_RE.replace_all(text, "``${1}``");
    let mut clean = clean_lines(&text);

    clean = LINK_RE
        .replace_all(&clean, |caps: &Captures<'_>| {
            let target = caps[2]
                .replace("%7B%7B%20", "{{ ")
                .replace("%20%7D%7D", " }}");
            format!("[{}]({target})", &caps[1])
        })
        .into_owned();

    let clean = fenced::reconcile(&clean)?;

    if MACRO_RE.is_match(&clean) {
        let render = !ctx.macro_ignore.contains(&paths::nav_key(doc));
        let header = if render {
            "---\nrender_macros: true\n---\n\n"
        } else {
            "---\n# YAML header\nrender_macros: false\n---\n\n"
        };
        return Ok(format!("{header}{clean}"));
    }
    Ok(clean)
}

/// Line fixups outside code blocks; `raw_markdown` blocks are unwrapped.
fn clean_lines(text: &str) -> String {
    let mut tracker = FenceTracker::new();
    let mut raw = false;
    let mut clean = String::with_capacity(text.len());

    for line in text.lines() {
        match tracker.update(line) {
            Some(FenceEvent::Open { info }) => {
                raw = info.contains("raw_markdown");
                if !raw {
                    clean.push_str(line);
                    clean.push('\n');
                }
                continue;
            }
            Some(FenceEvent::Close) => {
                if !raw {
                    clean.push_str(line);
                    clean.push('\n');
                }
                raw = false;
                continue;
            }
            None if tracker.in_fence() => {
                clean.push_str(line);
                clean.push('\n');
                continue;
            }
            None => {}
        }
        clean.push_str(&clean_line(line));
        clean.push('\n');
    }
    clean
}

fn clean_line(line: &str) -> String {
    let mut line = RST_LINK_RE
        .replace_all(line, "[${1}](${2}.md${3})")
        .into_owned();
    line = FILE_PATH_RE
        .replace_all(&line, |caps: &Captures<'_>| {
            format!("**`{}`**", caps[1].replace(r"\\", r"\"))
        })
        .into_owned();
    for (escaped, plain) in UNESCAPES {
        line = line.replace(escaped, plain);
    }
    if let Some(caps) = HEADER_ANCHOR_RE.captures(&line) {
        line = format!("{} {} {{: #{} }}", &caps[1], &caps[2], &caps[3]);
    }
    line
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_raw_markdown_unwrapped() {
        let text = "Intro\n\n``` raw_markdown\n{% include-markdown \"./a.md\" %}\n```\n\n```xml\n<a>\\_</a>\n```\n";
        let output = postprocess(&Context::default(), "page.rst", text).unwrap();
        assert_eq!(
            output,
            "Intro\n\n{% include-markdown \"./a.md\" %}\n\n```xml\n<a>\\_</a>\n```\n"
        );
    }

    #[test]
    fn test_rst_links_become_md() {
        let text = "See [Docker](../install/docker.rst#run) and [Home](index.rst).\n";
        let output = postprocess(&Context::default(), "page.rst", text).unwrap();
        assert_eq!(
            output,
            "See [Docker](../install/docker.md#run) and [Home](index.md).\n"
        );
    }

    #[test]
    fn test_unescape_and_title_ref() {
        let text = "Use \\<layer\\> and my\\_name with [WMS]{.title-ref}.\n";
        let output = postprocess(&Context::default(), "page.rst", text).unwrap();
        assert_eq!(output, "Use <layer> and my_name with ``WMS``.\n");
    }

    #[test]
    fn test_file_path_duplication() {
        let text = "Open **\\`C:\\\\data\\\\dir\\`**\n";
        let output = postprocess(&Context::default(), "page.rst", text).unwrap();
        assert_eq!(output, "Open **`C:\\data\\dir`**\n");
    }

    #[test]
    fn test_header_anchor() {
        let text = "## Running {#docker_run}\n";
        let output = postprocess(&Context::default(), "page.rst", text).unwrap();
        assert_eq!(output, "## Running {: #docker_run }\n");
    }

    #[test]
    fn test_macro_header_and_link_macros() {
        let text = "Get [it](https://example.org/%7B%7B%20version%20%7D%7D/a.zip) for {{ version }}.\n";
        let output = postprocess(&Context::default(), "page.rst", text).unwrap();
        assert_eq!(
            output,
            "---\nrender_macros: true\n---\n\nGet [it](https://example.org/{{ version }}/a.zip) for {{ version }}.\n"
        );
    }

    #[test]
    fn test_macro_ignore() {
        let ignore = BTreeSet::from(["developer/macros.md".to_owned()]);
        let ctx = Context::default().with_macro_ignore(ignore);
        let output = postprocess(&ctx, "developer/macros.rst", "{{ x }}\n").unwrap();
        assert!(output.starts_with("---\n# YAML header\nrender_macros: false\n---\n\n"));
    }

    #[test]
    fn test_fenced_divs_reconciled() {
        let text = "::: warning\n::: title\nWarning\n:::\n\nDo not \\*do\\* this.\n:::\n";
        let output = postprocess(&Context::default(), "page.rst", text).unwrap();
        assert_eq!(output, "!!! warning\n\n    Do not *do* this.\n");
    }

    #[test]
    fn test_unterminated_fence_fails() {
        let text = "::: note\nTitle\n\nBody\n";
        assert!(postprocess(&Context::default(), "page.rst", text).is_err());
    }
}
