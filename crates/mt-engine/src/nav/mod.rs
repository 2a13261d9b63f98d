//! Site navigation built by following toctree directives.
//!
//! Starting from the corpus root document, every toctree entry is resolved
//! and scanned recursively. Results are folded so a document without
//! children becomes a single entry and a document with children becomes a
//! titled section.

mod link;
mod source;

use std::collections::HashSet;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::context::Context;
use crate::directive::scanner;
use crate::paths;
use crate::warnings::Warnings;

pub use link::Link;
pub use source::{FsSource, MemorySource, SourceTree};

/// Errors from building navigation.
#[derive(Debug, thiserror::Error)]
pub enum NavError {
    #[error("Unable to scan {doc}")]
    Read {
        doc: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize navigation")]
    Serialize(#[from] serde_yaml::Error),
}

/// A navigation entry.
///
/// Serializes the way `mkdocs.yml` expects: an untitled leaf is a bare
/// path, a titled leaf is `{title: path}` and a section is
/// `{title: [children]}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavNode {
    Leaf { title: Option<String>, path: String },
    Section { title: String, children: Vec<NavNode> },
}

impl NavNode {
    pub fn leaf(path: impl Into<String>) -> Self {
        Self::Leaf {
            title: None,
            path: path.into(),
        }
    }

    pub fn titled(title: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Leaf {
            title: Some(title.into()),
            path: path.into(),
        }
    }

    /// Visit every leaf path in this subtree.
    fn collect_paths<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Leaf { path, .. } => out.push(path),
            Self::Section { children, .. } => {
                for child in children {
                    child.collect_paths(out);
                }
            }
        }
    }
}

impl Serialize for NavNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Leaf { title: None, path } => serializer.serialize_str(path),
            Self::Leaf {
                title: Some(title),
                path,
            } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(title, path)?;
                map.end()
            }
            Self::Section { title, children } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(title, children)?;
                map.end()
            }
        }
    }
}

/// Render navigation as the YAML `nav:` block for `mkdocs.yml`.
pub fn to_yaml(nav: &[NavNode]) -> Result<String, NavError> {
    #[derive(serde::Serialize)]
    struct Wrapper<'a> {
        nav: &'a [NavNode],
    }
    Ok(serde_yaml::to_string(&Wrapper { nav })?)
}

/// Walks toctrees from a root document.
pub struct NavBuilder<'a> {
    ctx: &'a Context,
    source: &'a dyn SourceTree,
    warnings: Warnings,
}

impl<'a> NavBuilder<'a> {
    pub fn new(ctx: &'a Context, source: &'a dyn SourceTree) -> Self {
        Self {
            ctx,
            source,
            warnings: Warnings::new(),
        }
    }

    /// Build navigation for `root`, a corpus-relative document path.
    pub fn build(&mut self, root: &str) -> Result<Vec<NavNode>, NavError> {
        let mut visiting = HashSet::new();
        let text = self.source.read(root).map_err(|source| NavError::Read {
            doc: root.to_owned(),
            source,
        })?;
        Ok(self.scan_toctree(root, &text, &mut visiting))
    }

    pub fn warnings(&self) -> &Warnings {
        &self.warnings
    }

    pub fn into_warnings(self) -> Warnings {
        self.warnings
    }

    fn scan_toctree(&mut self, doc: &str, text: &str, visiting: &mut HashSet<String>) -> Vec<NavNode> {
        let self_key = paths::nav_key(doc);
        let blocks = scanner::collect(text, "toctree");
        if blocks.is_empty() {
            return vec![NavNode::leaf(self_key)];
        }

        visiting.insert(doc.to_owned());
        let mut nav = Vec::new();
        let mut matched: HashSet<String> = HashSet::new();

        for block in blocks {
            if matched.insert(self_key.clone()) {
                nav.push(match self.ctx.nav_titles.get(&self_key) {
                    Some(title) => NavNode::titled(title.clone(), self_key.clone()),
                    None => NavNode::leaf(self_key.clone()),
                });
            }

            for entry in block.body_lines().map(str::trim).filter(|l| !l.is_empty()) {
                let link = Link::parse(doc, entry);
                let targets = if link.is_glob() {
                    self.source
                        .glob(&link.glob_pattern())
                        .into_iter()
                        .filter(|file| file.ends_with(".rst") && file != doc)
                        .map(|file| Link::for_match(doc, &file))
                        .collect()
                } else {
                    vec![link]
                };

                for target in targets {
                    if matched.contains(&target.nav_key()) {
                        continue;
                    }
                    let item = self.matched_item(&target, visiting);
                    let mut consumed = Vec::new();
                    item.collect_paths(&mut consumed);
                    matched.extend(consumed.into_iter().map(str::to_owned));
                    matched.insert(target.nav_key());
                    nav.push(item);
                }
            }
        }

        visiting.remove(doc);
        nav
    }

    /// Resolve one toctree target and fold its subtree into a single entry.
    fn matched_item(&mut self, link: &Link, visiting: &mut HashSet<String>) -> NavNode {
        let nav_key = link.nav_key();
        let override_title = link.nav_title(self.ctx).map(str::to_owned);

        if visiting.contains(&link.file) {
            self.warnings.push(
                &link.base,
                format!("Toctree cycle: '{}' is already being scanned", link.file),
            );
            return fold_leaf(None, override_title.or_else(|| link.toc_title.clone()), nav_key);
        }

        let sub_nav = match self.source.read(&link.file) {
            Ok(text) => self.scan_toctree(&link.file, &text, visiting),
            Err(err) => {
                self.warnings.push(
                    &link.base,
                    format!("Toctree entry '{}' could not be read: {err}", link.link),
                );
                Vec::new()
            }
        };

        let explicit = override_title.or_else(|| link.toc_title.clone());
        let mut sub_nav = sub_nav;
        match sub_nav.len() {
            0 => fold_leaf(None, explicit, nav_key),
            1 => match sub_nav.remove(0) {
                NavNode::Leaf { title, path } => fold_leaf(title, explicit, path),
                NavNode::Section { title, children } => NavNode::Section {
                    title: explicit.unwrap_or(title),
                    children,
                },
            },
            _ => {
                if let Some(NavNode::Leaf { title, .. }) = sub_nav.first_mut() {
                    *title = None;
                }
                let title = explicit.unwrap_or_else(|| link.title(&self.ctx.anchors, &mut self.warnings));
                NavNode::Section {
                    title,
                    children: sub_nav,
                }
            }
        }
    }
}

fn fold_leaf(own: Option<String>, explicit: Option<String>, path: String) -> NavNode {
    NavNode::Leaf {
        title: explicit.or(own),
        path,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::anchors::AnchorIndex;

    fn build(ctx: &Context, source: &MemorySource, root: &str) -> (Vec<NavNode>, Warnings) {
        let mut builder = NavBuilder::new(ctx, source);
        let nav = builder.build(root).unwrap();
        (nav, builder.into_warnings())
    }

    #[test]
    fn test_document_without_toctree() {
        let source = MemorySource::new().with_doc("index.rst", "Title\n=====\n");
        let (nav, _) = build(&Context::default(), &source, "index.rst");
        assert_eq!(nav, vec![NavNode::leaf("index.md")]);
    }

    #[test]
    fn test_nested_section_folding() {
        let anchors = AnchorIndex::parse("/install/index.rst.title=Installation\n");
        let ctx = Context::new(anchors);
        let source = MemorySource::new()
            .with_doc("index.rst", ".. toctree::\n   :maxdepth: 2\n\n   intro\n   install/index\n")
            .with_doc("intro.rst", "Intro\n=====\n")
            .with_doc("install/index.rst", ".. toctree::\n\n   docker\n   Binary <binary>\n")
            .with_doc("install/docker.rst", "Docker\n======\n")
            .with_doc("install/binary.rst", "Binary\n======\n");

        let (nav, warnings) = build(&ctx, &source, "index.rst");

        assert_eq!(
            nav,
            vec![
                NavNode::leaf("index.md"),
                NavNode::leaf("intro.md"),
                NavNode::Section {
                    title: "Installation".into(),
                    children: vec![
                        NavNode::leaf("install/index.md"),
                        NavNode::leaf("install/docker.md"),
                        NavNode::titled("Binary", "install/binary.md"),
                    ],
                },
            ]
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_wildcard_skips_recursively_consumed_targets() {
        let source = MemorySource::new()
            .with_doc("index.rst", ".. toctree::\n\n   chapter1\n   chapter1/*\n")
            .with_doc("chapter1.rst", ".. toctree::\n\n   chapter1/intro\n   chapter1/setup\n")
            .with_doc("chapter1/intro.rst", "Intro\n=====\n")
            .with_doc("chapter1/setup.rst", "Setup\n=====\n")
            .with_doc("chapter1/extra.rst", "Extra\n=====\n");
        let ctx = Context::new(AnchorIndex::parse("/chapter1.rst.title=Chapter One\n"));

        let (nav, _) = build(&ctx, &source, "index.rst");

        assert_eq!(
            nav,
            vec![
                NavNode::leaf("index.md"),
                NavNode::Section {
                    title: "Chapter One".into(),
                    children: vec![
                        NavNode::leaf("chapter1.md"),
                        NavNode::leaf("chapter1/intro.md"),
                        NavNode::leaf("chapter1/setup.md"),
                    ],
                },
                NavNode::leaf("chapter1/extra.md"),
            ]
        );
    }

    #[test]
    fn test_duplicate_literal_entry_skipped() {
        let source = MemorySource::new()
            .with_doc("index.rst", ".. toctree::\n\n   a\n   a\n")
            .with_doc("a.rst", "A\n=\n");
        let (nav, _) = build(&Context::default(), &source, "index.rst");
        assert_eq!(nav, vec![NavNode::leaf("index.md"), NavNode::leaf("a.md")]);
    }

    #[test]
    fn test_nav_title_override() {
        let mut titles = BTreeMap::new();
        titles.insert("a.md".to_owned(), "Short".to_owned());
        titles.insert("index.md".to_owned(), "Home".to_owned());
        let ctx = Context::default().with_nav_titles(titles);
        let source = MemorySource::new()
            .with_doc("index.rst", ".. toctree::\n\n   Long title <a>\n")
            .with_doc("a.rst", "A\n=\n");

        let (nav, _) = build(&ctx, &source, "index.rst");

        assert_eq!(
            nav,
            vec![NavNode::titled("Home", "index.md"), NavNode::titled("Short", "a.md")]
        );
    }

    #[test]
    fn test_cycle_becomes_leaf_with_warning() {
        let source = MemorySource::new()
            .with_doc("index.rst", ".. toctree::\n\n   a\n")
            .with_doc("a.rst", ".. toctree::\n\n   b\n")
            .with_doc("b.rst", ".. toctree::\n\n   a\n   index\n");
        let ctx = Context::new(AnchorIndex::parse("/a.rst.title=A\n/b.rst.title=B\n"));

        let (nav, warnings) = build(&ctx, &source, "index.rst");

        assert_eq!(
            nav,
            vec![
                NavNode::leaf("index.md"),
                NavNode::Section {
                    title: "A".into(),
                    children: vec![
                        NavNode::leaf("a.md"),
                        NavNode::Section {
                            title: "B".into(),
                            children: vec![
                                NavNode::leaf("b.md"),
                                NavNode::leaf("a.md"),
                                NavNode::leaf("index.md"),
                            ],
                        },
                    ],
                },
            ]
        );
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_missing_entry_warns() {
        let source = MemorySource::new().with_doc("index.rst", ".. toctree::\n\n   gone\n");
        let (nav, warnings) = build(&Context::default(), &source, "index.rst");
        assert_eq!(nav, vec![NavNode::leaf("index.md"), NavNode::leaf("gone.md")]);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_missing_root_is_error() {
        let source = MemorySource::new();
        let ctx = Context::default();
        let mut builder = NavBuilder::new(&ctx, &source);
        assert!(matches!(builder.build("index.rst"), Err(NavError::Read { .. })));
    }

    #[test]
    fn test_yaml_shape() {
        let nav = vec![
            NavNode::leaf("index.md"),
            NavNode::titled("Short", "a.md"),
            NavNode::Section {
                title: "Install".into(),
                children: vec![NavNode::leaf("install/index.md")],
            },
        ];
        assert_eq!(
            to_yaml(&nav).unwrap(),
            "nav:\n- index.md\n- Short: a.md\n- Install:\n  - install/index.md\n"
        );
    }
}
