//! Directive blocks and the transforms that rewrite them before conversion.
//!
//! The [`scanner`] isolates one directive kind at a time and hands each
//! [`DirectiveBlock`] to a [`DirectiveTransform`]. Transforms either produce
//! rST the converter handles better (`figure`, `only`, `parsed-literal`) or
//! raw Markdown that survives conversion untouched (`include`,
//! `literalinclude`).

mod figure;
mod include;
mod list_table;
mod literal;
mod only;
pub mod scanner;
mod strip;
mod toctree;

use crate::context::FileScope;

pub use figure::Figure;
pub use include::{Include, LiteralInclude};
pub use list_table::{ListTable, TableLayout, classify_table, to_pipe_table};
pub use literal::ParsedLiteral;
pub use only::Only;
pub use scanner::{collect, scan};
pub use strip::Strip;
pub use toctree::Toctree;

/// A captured directive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveBlock {
    /// Directive name, e.g. `figure`.
    pub name: String,
    /// Text after `::` on the directive line, trimmed.
    pub value: String,
    /// `:key: value` options in source order.
    pub options: Vec<(String, String)>,
    /// Body lines joined by `\n`, dedented by `indent`. `None` when absent.
    pub body: Option<String>,
    /// Leading whitespace of the directive line.
    pub indent: String,
}

impl DirectiveBlock {
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_option(&self, key: &str) -> bool {
        self.options.iter().any(|(k, _)| k == key)
    }

    /// Set an option, replacing an earlier value for the same key in place.
    pub fn set_option(&mut self, key: String, value: String) {
        if let Some(slot) = self.options.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.options.push((key, value));
        }
    }

    pub fn body_lines(&self) -> impl Iterator<Item = &str> {
        self.body.as_deref().into_iter().flat_map(str::lines)
    }

    /// Body lines with their common leading spaces removed.
    ///
    /// Blank lines become empty strings and do not affect the common indent.
    pub fn dedented_body(&self) -> Vec<String> {
        let common = self
            .body_lines()
            .filter(|line| !line.trim().is_empty())
            .map(scanner::indentation)
            .min()
            .unwrap_or(0);
        self.body_lines()
            .map(|line| {
                if line.trim().is_empty() {
                    String::new()
                } else {
                    line[common..].to_owned()
                }
            })
            .collect()
    }
}

/// Rewrites every block of one directive kind.
pub trait DirectiveTransform: Sync {
    /// Directive name handled by this transform.
    fn name(&self) -> &'static str;

    /// Produce the replacement text for `block`.
    ///
    /// The output may omit its final newline; the scanner adds one.
    fn transform(&self, block: &DirectiveBlock, scope: &mut FileScope<'_>) -> String;
}

/// Run `transform` over every matching block in `text`.
pub fn apply(transform: &dyn DirectiveTransform, scope: &mut FileScope<'_>, text: &str) -> String {
    scanner::scan(text, transform.name(), |block| transform.transform(block, scope))
}

/// Directive passes run before conversion, in order.
pub static PASSES: &[&dyn DirectiveTransform] = &[
    &Toctree,
    &Only,
    &Include,
    &LiteralInclude,
    &ParsedLiteral,
    &Figure,
    &ListTable,
    &Strip("index"),
    &Strip("contents"),
];
