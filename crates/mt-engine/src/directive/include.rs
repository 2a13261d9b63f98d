//! `include` and `literalinclude` → raw Markdown include markers.
//!
//! Both produce a `raw_markdown` code block, which the converter passes
//! through verbatim and the postprocess step unwraps again.

use super::{DirectiveBlock, DirectiveTransform};
use crate::context::FileScope;
use crate::paths;

pub struct Include;

pub struct LiteralInclude;

/// Make an include path relative to the including document.
///
/// Rooted paths climb by document depth; other paths get a `./` prefix
/// unless they already start with `.`.
fn include_path(doc: &str, value: &str) -> String {
    let value = value.trim();
    if value.starts_with('/') {
        paths::rooted_to_relative(doc, value)
    } else if value.starts_with('.') {
        value.to_owned()
    } else {
        format!("./{value}")
    }
}

/// Warn about options and content the include markers cannot express.
fn check_unsupported(block: &DirectiveBlock, scope: &mut FileScope<'_>) {
    let name = &block.name;
    let value = &block.value;
    if block.has_option("start-line") {
        scope.warn(format!(
            "{name} {value}: start-line option ignored, use start-after instead"
        ));
    }
    if block.has_option("end-line") {
        scope.warn(format!(
            "{name} {value}: end-line option ignored, use end-before instead"
        ));
    }
    if block.body_lines().any(|line| !line.trim().is_empty()) {
        scope.warn(format!("{name} {value}: directive content ignored"));
    }
}

/// `start="…"` / `end="…"` marker lines.
fn range_markers(block: &DirectiveBlock, prefix: &str) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(start) = block.option("start-after") {
        lines.push(format!("{prefix}start=\"{start}\""));
    }
    if let Some(end) = block.option("end-before") {
        lines.push(format!("{prefix}end=\"{end}\""));
    }
    lines
}

impl DirectiveTransform for Include {
    fn name(&self) -> &'static str {
        "include"
    }

    fn transform(&self, block: &DirectiveBlock, scope: &mut FileScope<'_>) -> String {
        check_unsupported(block, scope);
        let indent = &block.indent;
        let mut path = include_path(scope.doc, &block.value);
        if let Some(stem) = path.strip_suffix(".rst") {
            path = format!("{stem}.md");
        }

        let mut lines = vec![
            format!("{indent}.. code-block:: raw_markdown"),
            String::new(),
            format!("{indent}   {{%"),
            format!("{indent}      include-markdown \"{path}\""),
        ];
        lines.extend(range_markers(block, &format!("{indent}      ")));
        lines.push(format!("{indent}   %}}"));
        lines.join("\n") + "\n"
    }
}

impl DirectiveTransform for LiteralInclude {
    fn name(&self) -> &'static str {
        "literalinclude"
    }

    fn transform(&self, block: &DirectiveBlock, scope: &mut FileScope<'_>) -> String {
        check_unsupported(block, scope);
        let indent = &block.indent;
        let path = include_path(scope.doc, &block.value);
        let language = block.option("language").unwrap_or_default();

        let mut lines = vec![
            format!("{indent}.. code-block:: raw_markdown"),
            format!("{indent}   "),
            format!("{indent}   ~~~{language}"),
            format!("{indent}   {{% "),
            format!("{indent}     include \"{path}\""),
        ];
        lines.extend(range_markers(block, &format!("{indent}      ")));
        lines.push(format!("{indent}   %}}"));
        lines.push(format!("{indent}   ~~~"));
        lines.join("\n") + "\n"
    }
}
