//! Inline role rewriting.
//!
//! Roles are rewritten by an ordered list of named rules. Each rule runs
//! over the whole text before the next one starts, and labelled forms
//! (`:doc:`Label <target>``) run before the bare form of the same role so
//! the bare pattern never sees half of a labelled reference.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::context::FileScope;
use crate::paths;

static DOC_LABELED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":doc:`(.+?) <(.+?)(\.rst)?>`").unwrap());
static DOC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":doc:`([\w\-./]+?)(\.rst)?`").unwrap());
static REF_LABELED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":ref:`(.*?) <([\w.\-]*)>`").unwrap());
static REF_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r":ref:`([\w.\-]*?)`").unwrap());
pub(crate) static DOWNLOAD_LABELED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":download:`(.*?) <([\w\-/.]*?)>`").unwrap());
pub(crate) static DOWNLOAD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":download:`([\w\-/.]*?)`").unwrap());
static GUILABEL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r":guilabel:`(.*?)`").unwrap());
static MENUSELECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":menuselection:`(.*?)`").unwrap());
static COMMAND_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r":command:`(.*?)`").unwrap());
static FILE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r":file:`(.*?)`").unwrap());
static KBD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r":kbd:`(.*?)`").unwrap());

/// A named rewrite rule.
pub struct InlineRule {
    pub name: &'static str,
    apply: fn(&mut FileScope<'_>, &str) -> String,
}

impl InlineRule {
    pub fn apply(&self, scope: &mut FileScope<'_>, text: &str) -> String {
        (self.apply)(scope, text)
    }
}

/// Rules in the order they run.
pub static RULES: &[InlineRule] = &[
    InlineRule { name: "doc-labeled", apply: doc_labeled },
    InlineRule { name: "doc", apply: doc },
    InlineRule { name: "ref-labeled", apply: ref_labeled },
    InlineRule { name: "ref", apply: reference },
    InlineRule { name: "download-labeled", apply: download_labeled },
    InlineRule { name: "download", apply: download },
    InlineRule { name: "strip-leading-anchor", apply: strip_leading_anchor },
    InlineRule { name: "guilabel", apply: guilabel },
    InlineRule { name: "menuselection", apply: menuselection },
    InlineRule { name: "command", apply: command },
    InlineRule { name: "file", apply: file },
    InlineRule { name: "kbd", apply: kbd },
    InlineRule { name: "substitutions", apply: substitutions },
    InlineRule { name: "macros", apply: macros },
    InlineRule { name: "extlinks", apply: extlinks },
];

/// Run every rule over `text`.
pub fn resolve(scope: &mut FileScope<'_>, text: &str) -> String {
    RULES
        .iter()
        .fold(text.to_owned(), |text, rule| rule.apply(scope, &text))
}

fn doc_labeled(scope: &mut FileScope<'_>, text: &str) -> String {
    if !text.contains(":doc:") {
        return text.to_owned();
    }
    let doc = scope.doc;
    DOC_LABELED_RE
        .replace_all(text, |caps: &Captures<'_>| {
            let target = paths::rooted_to_relative(doc, &caps[2]);
            format!("`{} <{target}.rst>`_", &caps[1])
        })
        .into_owned()
}

fn doc(scope: &mut FileScope<'_>, text: &str) -> String {
    if !text.contains(":doc:") {
        return text.to_owned();
    }
    DOC_RE
        .replace_all(text, |caps: &Captures<'_>| {
            let link = &caps[1];
            let title = doc_title(scope, link);
            let target = paths::rooted_to_relative(scope.doc, link);
            format!("`{title} <{target}.rst>`_")
        })
        .into_owned()
}

/// Title of a linked document, looked up by its definitive `/dir/doc.rst` key.
fn doc_title(scope: &mut FileScope<'_>, link: &str) -> String {
    let link = link.trim();
    let with_ext = if link.ends_with(".rst") {
        link.to_owned()
    } else {
        format!("{link}.rst")
    };
    let definitive = if with_ext.starts_with('/') {
        paths::normalize(&with_ext)
    } else {
        paths::join(paths::parent_dir(scope.doc), &with_ext)
    };

    let anchors = &scope.ctx.anchors;
    if let Some(title) = anchors
        .title(&format!("/{definitive}"))
        .or_else(|| anchors.title(link))
    {
        return title.to_owned();
    }
    let label = paths::label(link);
    scope.warn(format!("Broken doc '{link}', using title '{label}'"));
    label
}

/// Path from the current document to the target of a `:ref:` label.
fn ref_path(scope: &mut FileScope<'_>, label: &str) -> String {
    let location = scope
        .ctx
        .anchors
        .resolve_location(label, scope.doc, &mut scope.warnings);
    paths::relative_path(scope.doc, location.trim_start_matches('/'))
}

fn ref_labeled(scope: &mut FileScope<'_>, text: &str) -> String {
    if !text.contains(":ref:") {
        return text.to_owned();
    }
    REF_LABELED_RE
        .replace_all(text, |caps: &Captures<'_>| {
            let path = ref_path(scope, &caps[2]);
            format!("`{} <{path}>`_", &caps[1])
        })
        .into_owned()
}

fn reference(scope: &mut FileScope<'_>, text: &str) -> String {
    if !text.contains(":ref:") {
        return text.to_owned();
    }
    REF_RE
        .replace_all(text, |caps: &Captures<'_>| {
            let label = &caps[1];
            let title = scope
                .ctx
                .anchors
                .resolve_title(label, scope.doc, &mut scope.warnings);
            let path = ref_path(scope, label);
            format!("`{title} <{path}>`_")
        })
        .into_owned()
}

/// Link target for a download: in-tree files stay relative, files outside
/// the docs tree point into the per-directory `download/` folder.
pub fn download_path(doc: &str, download: &str) -> String {
    let mut reference = download.strip_prefix("./").unwrap_or(download).to_owned();
    if reference.starts_with('/') {
        reference = paths::rooted_to_relative(doc, &reference);
    }
    if paths::depth(doc) < reference.matches("../").count() {
        format!("download/{}", paths::basename(download))
    } else {
        reference
    }
}

fn download_labeled(scope: &mut FileScope<'_>, text: &str) -> String {
    if !text.contains(":download:") {
        return text.to_owned();
    }
    let doc = scope.doc;
    DOWNLOAD_LABELED_RE
        .replace_all(text, |caps: &Captures<'_>| {
            format!("`{} <{}>`__", &caps[1], download_path(doc, &caps[2]))
        })
        .into_owned()
}

fn download(scope: &mut FileScope<'_>, text: &str) -> String {
    if !text.contains(":download:") {
        return text.to_owned();
    }
    let doc = scope.doc;
    DOWNLOAD_RE
        .replace_all(text, |caps: &Captures<'_>| {
            let target = &caps[1];
            format!("`{} <{}>`__", paths::basename(target), download_path(doc, target))
        })
        .into_owned()
}

/// Drop a label on the very first line; it would otherwise become the page title.
fn strip_leading_anchor(_scope: &mut FileScope<'_>, text: &str) -> String {
    if !text.starts_with(".. _") {
        return text.to_owned();
    }
    text.splitn(3, '\n').nth(2).unwrap_or_default().to_owned()
}

fn guilabel(_scope: &mut FileScope<'_>, text: &str) -> String {
    GUILABEL_RE.replace_all(text, "**${1}**").into_owned()
}

fn menuselection(_scope: &mut FileScope<'_>, text: &str) -> String {
    MENUSELECTION_RE.replace_all(text, "**${1}**").into_owned()
}

fn command(_scope: &mut FileScope<'_>, text: &str) -> String {
    COMMAND_RE.replace_all(text, "***${1}***").into_owned()
}

fn file(_scope: &mut FileScope<'_>, text: &str) -> String {
    FILE_RE.replace_all(text, "**`${1}`**").into_owned()
}

fn kbd(_scope: &mut FileScope<'_>, text: &str) -> String {
    KBD_RE.replace_all(text, "`${1}`").into_owned()
}

fn substitutions(scope: &mut FileScope<'_>, text: &str) -> String {
    let mut text = text.to_owned();
    for (key, value) in &scope.ctx.substitutions {
        text = text.replace(&format!("|{key}|"), value);
    }
    text
}

fn macros(_scope: &mut FileScope<'_>, text: &str) -> String {
    text.replace("|version|", " {{ version }}")
        .replace("|release|", " {{ release }}")
}

fn extlinks(scope: &mut FileScope<'_>, text: &str) -> String {
    let mut text = text.to_owned();
    for ext in &scope.ctx.extlinks {
        let role = format!(":{}:", ext.name);
        if !text.contains(&role) {
            continue;
        }
        let name = regex::escape(&ext.name);
        let url = ext.url.as_str();
        let label = ext.label.as_deref().unwrap_or("%s");

        if let Ok(labeled) = Regex::new(&format!(r":{name}:`(.*?)\s+<(.*?)>`")) {
            text = labeled
                .replace_all(&text, |caps: &Captures<'_>| {
                    format!("`{} <{}>`_", &caps[1], url.replace("%s", &caps[2]))
                })
                .into_owned();
        }
        if let Ok(bare) = Regex::new(&format!(r":{name}:`(.*?)`")) {
            text = bare
                .replace_all(&text, |caps: &Captures<'_>| {
                    let arg = &caps[1];
                    format!("`{} <{}>`_", label.replace("%s", arg), url.replace("%s", arg))
                })
                .into_owned();
        }
    }
    text
}
