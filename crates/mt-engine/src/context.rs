//! Shared per-run configuration and per-document scope.

use std::collections::{BTreeMap, BTreeSet};

use crate::anchors::AnchorIndex;
use crate::nav::SourceTree;
use crate::warnings::Warnings;

/// External link shortcut: `:name:`target`` becomes a link built from `url`.
///
/// `url` and `label` may contain `%s`, replaced by the role target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtLink {
    pub name: String,
    pub url: String,
    pub label: Option<String>,
}

/// Read-only data shared by every document of a migration run.
#[derive(Debug, Default)]
pub struct Context {
    pub anchors: AnchorIndex,
    /// `|name|` substitutions.
    pub substitutions: BTreeMap<String, String>,
    pub extlinks: Vec<ExtLink>,
    /// Navigation title overrides keyed by navigation key (`install/docker.md`).
    pub nav_titles: BTreeMap<String, String>,
    /// Markdown files (relative to the docs folder) that must not render macros.
    pub macro_ignore: BTreeSet<String>,
    /// Collapse simple list tables into pipe tables.
    pub collapse_tables: bool,
}

impl Context {
    pub fn new(anchors: AnchorIndex) -> Self {
        Self {
            anchors,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_substitutions(mut self, substitutions: BTreeMap<String, String>) -> Self {
        self.substitutions = substitutions;
        self
    }

    #[must_use]
    pub fn with_extlinks(mut self, extlinks: Vec<ExtLink>) -> Self {
        self.extlinks = extlinks;
        self
    }

    #[must_use]
    pub fn with_nav_titles(mut self, nav_titles: BTreeMap<String, String>) -> Self {
        self.nav_titles = nav_titles;
        self
    }

    #[must_use]
    pub fn with_macro_ignore(mut self, macro_ignore: BTreeSet<String>) -> Self {
        self.macro_ignore = macro_ignore;
        self
    }

    #[must_use]
    pub fn with_collapse_tables(mut self, collapse_tables: bool) -> Self {
        self.collapse_tables = collapse_tables;
        self
    }
}

/// Everything a transform needs while rewriting one document.
pub struct FileScope<'a> {
    pub ctx: &'a Context,
    /// Corpus-relative path of the document being processed.
    pub doc: &'a str,
    /// Source tree used to expand toctree globs.
    pub source: &'a dyn SourceTree,
    pub warnings: Warnings,
}

impl<'a> FileScope<'a> {
    pub fn new(ctx: &'a Context, doc: &'a str, source: &'a dyn SourceTree) -> Self {
        Self {
            ctx,
            doc,
            source,
            warnings: Warnings::new(),
        }
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(self.doc, message);
    }

    pub fn into_warnings(self) -> Warnings {
        self.warnings
    }
}
