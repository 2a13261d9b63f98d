//! Toctree entries resolved against the document that lists them.

use std::sync::LazyLock;

use regex::Regex;

use crate::anchors::AnchorIndex;
use crate::context::Context;
use crate::paths;
use crate::warnings::Warnings;

static ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.*)<(.*)>$").unwrap());

/// A toctree entry, relative to the document containing the toctree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Document containing the toctree.
    pub base: String,
    /// Link as written, without `.rst` or a trailing `/`.
    pub link: String,
    /// Inline title from `Title <link>` entries.
    pub toc_title: Option<String>,
    /// Corpus-relative target document.
    pub file: String,
}

impl Link {
    pub fn new(base: &str, link: &str, toc_title: Option<String>) -> Self {
        let file = paths::join(paths::parent_dir(base), &format!("{link}.rst"));
        Self {
            base: base.to_owned(),
            link: link.to_owned(),
            toc_title,
            file,
        }
    }

    /// Parse a toctree body line such as `Docker <docker>` or `install/*`.
    pub fn parse(base: &str, entry: &str) -> Self {
        let entry = entry.trim();
        let (title, link) = match ENTRY_RE.captures(entry) {
            Some(caps) => (
                Some(caps[1].trim().to_owned()).filter(|t| !t.is_empty()),
                caps.get(2).map_or("", |m| m.as_str()).trim(),
            ),
            None => (None, entry),
        };
        let link = link.strip_suffix(".rst").unwrap_or(link);
        let link = link.strip_suffix('/').unwrap_or(link);
        Self::new(base, link, title)
    }

    /// Link to a document found by expanding a glob.
    pub fn for_match(base: &str, file: &str) -> Self {
        let relative = paths::relative_path(base, file);
        let link = relative.strip_suffix(".rst").unwrap_or(&relative);
        Self::new(base, link, None)
    }

    pub fn is_glob(&self) -> bool {
        self.link.contains('*')
    }

    /// Corpus-relative glob pattern for wildcard entries.
    pub fn glob_pattern(&self) -> String {
        paths::join(paths::parent_dir(&self.base), &self.link)
    }

    pub fn link_rst(&self) -> String {
        format!("{}.rst", self.link)
    }

    pub fn nav_key(&self) -> String {
        paths::nav_key(&self.file)
    }

    /// Definitive anchor key of the target document.
    pub fn index_key(&self) -> String {
        format!("/{}", self.file)
    }

    /// Display title: inline title, then the target's heading, then a label.
    pub fn title(&self, anchors: &AnchorIndex, warnings: &mut Warnings) -> String {
        if let Some(title) = &self.toc_title {
            return title.clone();
        }
        if let Some(title) = anchors.title(&self.index_key()) {
            return title.to_owned();
        }
        let label = paths::label(&self.file);
        warnings.push(&self.base, format!("Broken doc '{}', using title '{label}'", self.link));
        label
    }

    /// Configured navigation title override.
    pub fn nav_title<'c>(&self, ctx: &'c Context) -> Option<&'c str> {
        ctx.nav_titles.get(&self.nav_key()).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_parse_titled_entry() {
        let link = Link::parse("install/index.rst", "  Docker setup <docker.rst>");
        assert_eq!(link.toc_title.as_deref(), Some("Docker setup"));
        assert_eq!(link.link, "docker");
        assert_eq!(link.file, "install/docker.rst");
        assert_eq!(link.nav_key(), "install/docker.md");
        assert_eq!(link.index_key(), "/install/docker.rst");
    }

    #[test]
    fn test_parse_directory_entry() {
        let link = Link::parse("index.rst", "styling/index/");
        assert_eq!(link.link, "styling/index");
        assert_eq!(link.toc_title, None);
    }

    #[test]
    fn test_parse_parent_entry() {
        let link = Link::parse("user/guide/index.rst", "../intro");
        assert_eq!(link.file, "user/intro.rst");
        assert_eq!(link.link_rst(), "../intro.rst");
    }

    #[test]
    fn test_glob_pattern() {
        let link = Link::parse("chapter1/index.rst", "*");
        assert!(link.is_glob());
        assert_eq!(link.glob_pattern(), "chapter1/*");
    }

    #[test]
    fn test_for_match() {
        let link = Link::for_match("index.rst", "chapter1/setup.rst");
        assert_eq!(link.link, "chapter1/setup");
        assert_eq!(link.file, "chapter1/setup.rst");
    }

    #[test]
    fn test_title_lookup_order() {
        let anchors = AnchorIndex::parse("/setup.rst.title=Installation Guide\n");
        let mut warnings = Warnings::new();

        let titled = Link::parse("index.rst", "Install <setup>");
        assert_eq!(titled.title(&anchors, &mut warnings), "Install");

        let plain = Link::parse("index.rst", "setup");
        assert_eq!(plain.title(&anchors, &mut warnings), "Installation Guide");

        let missing = Link::parse("index.rst", "getting-started");
        assert_eq!(missing.title(&anchors, &mut warnings), "Getting Started");
        assert_eq!(warnings.len(), 1);
    }
}
