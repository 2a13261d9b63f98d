//! Directives with no Markdown equivalent are removed.

use super::{DirectiveBlock, DirectiveTransform};
use crate::context::FileScope;

/// Removes every block of the named directive.
pub struct Strip(pub &'static str);

impl DirectiveTransform for Strip {
    fn name(&self) -> &'static str {
        self.0
    }

    fn transform(&self, block: &DirectiveBlock, scope: &mut FileScope<'_>) -> String {
        tracing::debug!(path = %scope.doc, directive = self.0, value = %block.value, "Stripped directive");
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::directive::apply;
    use crate::{Context, MemorySource};

    #[test]
    fn test_strip_contents() {
        let ctx = Context::default();
        let source = MemorySource::new();
        let mut scope = FileScope::new(&ctx, "page.rst", &source);
        let text = "Title\n=====\n\n.. contents::\n   :local:\n   :depth: 2\n\nBody\n";
        assert_eq!(
            apply(&Strip("contents"), &mut scope, text),
            "Title\n=====\n\n\nBody\n"
        );
    }

    #[test]
    fn test_strip_index_entries() {
        let ctx = Context::default();
        let source = MemorySource::new();
        let mut scope = FileScope::new(&ctx, "page.rst", &source);
        let text = ".. index:: pair: WMS; GetMap\n\nText\n";
        assert_eq!(apply(&Strip("index"), &mut scope, text), "\nText\n");
    }
}
