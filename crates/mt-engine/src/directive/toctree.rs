//! `toctree` in a page body → grid of card links.
//!
//! Navigation is produced separately; on the page itself a visible toctree
//! becomes a bullet list of links wrapped in a `grid cards` div.

use std::collections::HashSet;

use super::{DirectiveBlock, DirectiveTransform};
use crate::context::FileScope;
use crate::nav::Link;

pub struct Toctree;

impl Toctree {
    /// Expand one entry into the links it names.
    fn expand(entry: &str, scope: &FileScope<'_>) -> Vec<Link> {
        let link = Link::parse(scope.doc, entry);
        if !link.is_glob() {
            return vec![link];
        }
        scope
            .source
            .glob(&link.glob_pattern())
            .into_iter()
            .filter(|file| file.ends_with(".rst") && file != scope.doc)
            .map(|file| Link::for_match(scope.doc, &file))
            .collect()
    }
}

impl DirectiveTransform for Toctree {
    fn name(&self) -> &'static str {
        "toctree"
    }

    fn transform(&self, block: &DirectiveBlock, scope: &mut FileScope<'_>) -> String {
        if block.has_option("hidden") {
            return String::new();
        }

        let indent = &block.indent;
        let mut listed = HashSet::new();
        let mut lines = vec![format!("{indent}<div class=\"grid cards\" markdown>"), String::new()];

        for entry in block.body_lines().map(str::trim).filter(|l| !l.is_empty()) {
            for link in Self::expand(entry, scope) {
                let link_rst = link.link_rst();
                if !listed.insert(link_rst.clone()) {
                    continue;
                }
                let title = link.title(&scope.ctx.anchors, &mut scope.warnings);
                lines.push(format!("{indent}-   `{title} <{link_rst}>`_"));
            }
        }

        lines.push(String::new());
        lines.push(format!("{indent}</div>"));
        lines.push(String::new());
        lines.join("\n") + "\n"
    }
}
