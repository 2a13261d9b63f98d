//! Converter fenced-div admonitions rewritten to `!!!` blocks.
//!
//! The converter writes admonitions as fenced divs:
//!
//! ```text
//! ::: note
//! ::: title
//! Note
//! :::
//!
//! Body text.
//! :::
//! ```
//!
//! which become:
//!
//! ```text
//! !!! note
//!
//!     Body text.
//! ```

use std::sync::LazyLock;

use regex::Regex;

static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*):{3,}\s*(?:\{\s*\.?([\w-]+)[^}]*\}|([\w-]*))\s*$").unwrap()
});

/// Errors for fenced divs that cannot be reconciled.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FenceError {
    #[error("Expected ::: to end fenced div '{kind}' (near output line {line})")]
    Unterminated { kind: String, line: usize },

    #[error("Unexpected line in fenced div '{kind}' title (near output line {line}): {text}")]
    Malformed {
        kind: String,
        line: usize,
        text: String,
    },
}

/// Admonition kinds the converter emits for Sphinx directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmonitionKind {
    Attention,
    Caution,
    Danger,
    Error,
    Hint,
    Important,
    Note,
    Tip,
    Warning,
    Todo,
    Admonition,
    Deprecated,
    SeeAlso,
    VersionAdded,
    VersionChanged,
}

impl AdmonitionKind {
    pub const ALL: [Self; 15] = [
        Self::Attention,
        Self::Caution,
        Self::Danger,
        Self::Error,
        Self::Hint,
        Self::Important,
        Self::Note,
        Self::Tip,
        Self::Warning,
        Self::Todo,
        Self::Admonition,
        Self::Deprecated,
        Self::SeeAlso,
        Self::VersionAdded,
        Self::VersionChanged,
    ];

    /// Class name used on the fenced div.
    pub fn fence_name(self) -> &'static str {
        match self {
            Self::Attention => "attention",
            Self::Caution => "caution",
            Self::Danger => "danger",
            Self::Error => "error",
            Self::Hint => "hint",
            Self::Important => "important",
            Self::Note => "note",
            Self::Tip => "tip",
            Self::Warning => "warning",
            Self::Todo => "todo",
            Self::Admonition => "admonition",
            Self::Deprecated => "deprecated",
            Self::SeeAlso => "seealso",
            Self::VersionAdded => "versionadded",
            Self::VersionChanged => "versionchanged",
        }
    }

    pub fn from_fence_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.fence_name() == name)
    }

    /// Target admonition type and, for kinds without a title line, the
    /// implicit title.
    pub fn target(self) -> (&'static str, Option<&'static str>) {
        match self {
            Self::Attention | Self::Important => ("info", None),
            Self::Caution | Self::Warning => ("warning", None),
            Self::Danger => ("danger", None),
            Self::Error => ("failure", None),
            Self::Hint | Self::Tip => ("tip", None),
            Self::Note => ("note", None),
            Self::Admonition => ("abstract", None),
            Self::Todo => ("info", Some("Todo")),
            Self::Deprecated => ("warning", Some("Deprecated")),
            Self::SeeAlso => ("info", Some("See Also")),
            Self::VersionAdded => ("info", Some("Version Added")),
            Self::VersionChanged => ("info", Some("Version Changed")),
        }
    }
}

/// Map a fence class to the target admonition type. Unknown classes pass
/// through unchanged.
pub fn map_kind(name: &str) -> (String, Option<&'static str>) {
    match AdmonitionKind::from_fence_name(name) {
        Some(kind) => {
            let (target, title) = kind.target();
            (target.to_owned(), title)
        }
        None => (name.to_owned(), None),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Fence {
    Open { indent: usize, kind: String },
    Title { indent: usize },
    Close { indent: usize },
}

fn parse_fence(line: &str) -> Option<Fence> {
    let caps = FENCE_RE.captures(line)?;
    let indent = caps.get(1).map_or(0, |m| m.as_str().len());
    let kind = caps
        .get(2)
        .or_else(|| caps.get(3))
        .map_or("", |m| m.as_str());
    Some(match kind {
        "" => Fence::Close { indent },
        "title" => Fence::Title { indent },
        _ => Fence::Open {
            indent,
            kind: kind.to_owned(),
        },
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Scan,
    AwaitTitle,
    AwaitTitleText,
    AwaitTitleClose,
    Body,
}

struct Admonition {
    indent: String,
    kind: String,
    title: Option<String>,
    body: Vec<String>,
    depth: usize,
}

impl Admonition {
    fn render(self, out: &mut Vec<String>) -> Result<(), FenceError> {
        let mut header = format!("{}!!! {}", self.indent, self.kind);
        if let Some(title) = &self.title
            && title.to_lowercase() != self.kind.to_lowercase()
        {
            header.push_str(&format!(" \"{title}\""));
        }
        out.push(header);
        out.push(String::new());

        let mut body = self.body;
        while body.last().is_some_and(|line| line.trim().is_empty()) {
            body.pop();
        }
        let body = body.join("\n");
        let body = if body.contains(":::") {
            reconcile(&body).map_err(|err| offset(err, out.len()))?
        } else {
            body
        };
        for line in body.lines() {
            if line.trim().is_empty() {
                out.push(String::new());
            } else {
                out.push(format!("    {line}"));
            }
        }
        Ok(())
    }
}

fn offset(err: FenceError, by: usize) -> FenceError {
    match err {
        FenceError::Unterminated { kind, line } => FenceError::Unterminated {
            kind,
            line: line + by,
        },
        FenceError::Malformed { kind, line, text } => FenceError::Malformed {
            kind,
            line: line + by,
            text,
        },
    }
}

/// Rewrite every fenced-div admonition in `text`.
///
/// Text without `:::` is returned unchanged. Nested admonitions are
/// rewritten inside their parent's body.
pub fn reconcile(text: &str) -> Result<String, FenceError> {
    if !text.contains(":::") {
        return Ok(text.to_owned());
    }

    let mut out: Vec<String> = Vec::new();
    let mut state = State::Scan;
    let mut current: Option<Admonition> = None;

    for line in text.lines() {
        let fence = parse_fence(line);
        let blank = line.trim().is_empty();

        let Some(block) = current.as_mut() else {
            match fence {
                Some(Fence::Open { indent, kind }) => {
                    let (target, implicit) = map_kind(&kind);
                    current = Some(Admonition {
                        indent: line[..indent].to_owned(),
                        kind: target,
                        title: implicit.map(str::to_owned),
                        body: Vec::new(),
                        depth: 0,
                    });
                    state = if implicit.is_some() {
                        State::Body
                    } else {
                        State::AwaitTitle
                    };
                }
                _ => out.push(line.to_owned()),
            }
            continue;
        };

        let malformed = |out: &Vec<String>, block: &Admonition| FenceError::Malformed {
            kind: block.kind.clone(),
            line: out.len(),
            text: line.to_owned(),
        };

        match state {
            State::Scan => {}
            State::AwaitTitle => match fence {
                Some(Fence::Title { .. }) => state = State::AwaitTitleText,
                Some(Fence::Close { indent }) if indent <= block.indent.len() => {
                    if let Some(done) = current.take() {
                        done.render(&mut out)?;
                    }
                    state = State::Scan;
                }
                _ if blank => {}
                Some(_) => return Err(malformed(&out, block)),
                None => {
                    block.title = Some(line.trim().to_owned());
                    state = State::Body;
                }
            },
            State::AwaitTitleText => match fence {
                _ if blank => {}
                None => {
                    block.title = Some(line.trim().to_owned());
                    state = State::AwaitTitleClose;
                }
                Some(_) => return Err(malformed(&out, block)),
            },
            State::AwaitTitleClose => match fence {
                _ if blank => {}
                Some(Fence::Close { .. }) => state = State::Body,
                _ => return Err(malformed(&out, block)),
            },
            State::Body => match fence {
                Some(Fence::Title { indent })
                    if block.depth == 0
                        && block.body.is_empty()
                        && indent == block.indent.len() =>
                {
                    state = State::AwaitTitleText;
                }
                Some(Fence::Open { .. } | Fence::Title { .. }) => {
                    block.depth += 1;
                    block.body.push(line.to_owned());
                }
                Some(Fence::Close { indent }) => {
                    if block.depth > 0 {
                        block.depth -= 1;
                        block.body.push(line.to_owned());
                    } else if indent <= block.indent.len() {
                        if let Some(done) = current.take() {
                            done.render(&mut out)?;
                        }
                        state = State::Scan;
                    } else {
                        block.body.push(line.to_owned());
                    }
                }
                None if blank && block.body.is_empty() => {}
                None if blank => block.body.push(String::new()),
                None => block.body.push(line.to_owned()),
            },
        }
    }

    if let Some(block) = current {
        return Err(FenceError::Unterminated {
            kind: block.kind,
            line: out.len(),
        });
    }

    let mut result = out.join("\n");
    if text.ends_with('\n') {
        result.push('\n');
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_kind_table() {
        assert_eq!(map_kind("caution"), ("warning".to_owned(), None));
        assert_eq!(map_kind("error"), ("failure".to_owned(), None));
        assert_eq!(map_kind("seealso"), ("info".to_owned(), Some("See Also")));
        assert_eq!(map_kind("custom"), ("custom".to_owned(), None));
        for kind in AdmonitionKind::ALL {
            assert_eq!(AdmonitionKind::from_fence_name(kind.fence_name()), Some(kind));
        }
    }

    #[test]
    fn test_text_without_fences_unchanged() {
        let text = "# Title\n\nNo fences here.";
        assert_eq!(reconcile(text).unwrap(), text);
    }

    #[test]
    fn test_note_with_title_div() {
        let text = "Intro\n\n::: note\n::: title\nNote\n:::\n\nBody text.\n:::\n\nAfter\n";
        assert_eq!(
            reconcile(text).unwrap(),
            "Intro\n\n!!! note\n\n    Body text.\n\nAfter\n"
        );
    }

    #[test]
    fn test_caution_relabeled_and_custom_passthrough() {
        let text = "::: caution\n::: title\nCaution\n:::\n\nCareful.\n:::\n\n::: custom\nMy title\n\nStuff.\n:::\n";
        assert_eq!(
            reconcile(text).unwrap(),
            "!!! warning \"Caution\"\n\n    Careful.\n\n!!! custom \"My title\"\n\n    Stuff.\n"
        );
    }

    #[test]
    fn test_admonition_with_plain_title() {
        let text = "::: admonition\nExplore Device Differences\n\n- one\n- two\n:::\n";
        assert_eq!(
            reconcile(text).unwrap(),
            "!!! abstract \"Explore Device Differences\"\n\n    - one\n    - two\n"
        );
    }

    #[test]
    fn test_implicit_title_kind() {
        let text = "::: versionadded\n2.21\n:::\n";
        assert_eq!(
            reconcile(text).unwrap(),
            "!!! info \"Version Added\"\n\n    2.21\n"
        );
    }

    #[test]
    fn test_braced_class_and_long_fences() {
        let text = ":::: {.warning}\n::: title\nWarning\n:::\n\nText.\n::::\n";
        assert_eq!(reconcile(text).unwrap(), "!!! warning\n\n    Text.\n");
    }

    #[test]
    fn test_nested_divs() {
        let text = "::: admonition\nOuter\n\nIntro.\n\n    ::: admonition\n    Instructor Notes\n\n    Inner text.\n    :::\n:::\n";
        assert_eq!(
            reconcile(text).unwrap(),
            "!!! abstract \"Outer\"\n\n    Intro.\n\n        !!! abstract \"Instructor Notes\"\n\n            Inner text.\n"
        );
    }

    #[test]
    fn test_same_indent_nesting() {
        let text = ":::: note\n::: title\nNote\n:::\n\n::: tip\n::: title\nTip\n:::\n\nInner.\n:::\n::::\n";
        assert_eq!(
            reconcile(text).unwrap(),
            "!!! note\n\n    !!! tip\n\n        Inner.\n"
        );
    }

    #[test]
    fn test_reconciled_output_is_stable() {
        let text = "::: note\n::: title\nNote\n:::\n\nBody.\n:::\n";
        let once = reconcile(text).unwrap();
        assert_eq!(reconcile(&once).unwrap(), once);
    }

    #[test]
    fn test_unterminated_is_error() {
        let text = "Line\n::: note\n::: title\nNote\n:::\n\nBody\n";
        assert_eq!(
            reconcile(text).unwrap_err(),
            FenceError::Unterminated {
                kind: "note".into(),
                line: 1
            }
        );
    }

    #[test]
    fn test_missing_title_close_is_error() {
        let text = "::: note\n::: title\nNote\nnot a fence\n:::\n";
        assert!(matches!(reconcile(text), Err(FenceError::Malformed { .. })));
    }
}
