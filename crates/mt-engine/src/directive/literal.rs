//! `parsed-literal` → `code-block`.

use super::{DirectiveBlock, DirectiveTransform};
use crate::context::FileScope;

pub struct ParsedLiteral;

impl DirectiveTransform for ParsedLiteral {
    fn name(&self) -> &'static str {
        "parsed-literal"
    }

    fn transform(&self, block: &DirectiveBlock, scope: &mut FileScope<'_>) -> String {
        let indent = &block.indent;
        let language = if block.value.is_empty() {
            "text"
        } else {
            block.value.as_str()
        };

        let mut lines = vec![format!("{indent}.. code-block:: {language}"), String::new()];
        let body = block.dedented_body();
        if body.is_empty() {
            tracing::debug!(path = %scope.doc, "parsed-literal without content");
        }
        for line in body {
            if line.is_empty() {
                lines.push(String::new());
            } else {
                lines.push(format!("{indent}   {line}"));
            }
        }
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
        apply(&ParsedLiteral, &mut scope, text)
    }

    #[test]
    fn test_parsed_literal_defaults_to_text() {
        let text = ".. parsed-literal::\n\n      bin/startup.sh\n        --port 8080\n\nDone\n";
        assert_eq!(
            run(text),
            ".. code-block:: text\n\n   bin/startup.sh\n     --port 8080\n\nDone\n"
        );
    }

    #[test]
    fn test_parsed_literal_language() {
        let text = "  .. parsed-literal:: xml\n\n     <a/>\n";
        assert_eq!(run(text), "  .. code-block:: xml\n\n     <a/>\n");
    }

    #[test]
    fn test_parsed_literal_non_breaking_space_indent() {
        let text = ".. parsed-literal::\n\n   \u{a0}indented with nbsp\n    plain\n";
        assert_eq!(
            run(text),
            ".. code-block:: text\n\n   \u{a0}indented with nbsp\n    plain\n"
        );
    }
}
