//! `only` → titled admonition.

use super::{DirectiveBlock, DirectiveTransform};
use crate::context::FileScope;
use crate::paths;

pub struct Only;

/// Admonition title for a build condition.
pub(crate) fn condition_label(condition: &str) -> String {
    match condition.trim() {
        "snapshot" => "Nightly Build".to_owned(),
        "not snapshot" => "Release".to_owned(),
        other => paths::title_case(other),
    }
}

impl DirectiveTransform for Only {
    fn name(&self) -> &'static str {
        "only"
    }

    fn transform(&self, block: &DirectiveBlock, _scope: &mut FileScope<'_>) -> String {
        let indent = &block.indent;
        let mut lines = vec![format!(
            "{indent}.. admonition:: {}",
            condition_label(&block.value)
        )];
        if block.body.is_some() {
            lines.push(String::new());
            for line in block.body_lines() {
                if line.trim().is_empty() {
                    lines.push(String::new());
                } else {
                    lines.push(format!("{indent}{line}"));
                }
            }
        }
        lines.push(String::new());
        lines.join("\n") + "\n"
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::directive::apply;
    use crate::{Context, MemorySource};

    fn run(text: &str) -> String {
        let ctx = Context::default();
        let source = MemorySource::new();
        let mut scope = FileScope::new(&ctx, "page.rst", &source);
        apply(&Only, &mut scope, text)
    }

    #[test]
    fn test_condition_labels() {
        assert_eq!(condition_label("snapshot"), "Nightly Build");
        assert_eq!(condition_label(" not snapshot "), "Release");
        assert_eq!(condition_label("html or latex"), "Html Or Latex");
    }

    #[test]
    fn test_only_snapshot_body() {
        let text = ".. only:: snapshot\n\n   Nightly builds are available.\n\n   See downloads.\n\nAfter\n";
        assert_eq!(
            run(text),
            ".. admonition:: Nightly Build\n\n   Nightly builds are available.\n\n   See downloads.\n\n\nAfter\n"
        );
    }

    #[test]
    fn test_only_keeps_nested_indent() {
        let text = "* item\n\n  .. only:: not snapshot\n\n     Released text\n";
        assert_eq!(
            run(text),
            "* item\n\n  .. admonition:: Release\n\n     Released text\n\n"
        );
    }
}
