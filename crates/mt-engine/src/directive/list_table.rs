//! `list-table` cleanup and the optional pipe-table collapse.

use super::{DirectiveBlock, DirectiveTransform};
use crate::context::FileScope;

pub struct ListTable;

/// Options that only affect layout and confuse the converter.
const LAYOUT_OPTIONS: [&str; 2] = ["width", "widths"];

/// Whether a list table can be collapsed into a pipe table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableLayout {
    /// Every row has exactly two simple single-line cells.
    PipeTable,
    /// Leave the table as a list table.
    Keep,
}

/// Parse the rows of a list table, or `None` when any row holds more than
/// single-line cells.
fn simple_rows(block: &DirectiveBlock) -> Option<Vec<Vec<String>>> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    for line in block.dedented_body() {
        if line.is_empty() {
            continue;
        }
        if let Some(cell) = line.strip_prefix("* - ") {
            rows.push(vec![simple_cell(cell)?]);
        } else if let Some(cell) = line.strip_prefix("  - ") {
            rows.last_mut()?.push(simple_cell(cell)?);
        } else {
            return None;
        }
    }
    Some(rows)
}

fn simple_cell(cell: &str) -> Option<String> {
    let cell = cell.trim();
    if cell.starts_with("..") || cell.contains('|') {
        return None;
    }
    Some(cell.to_owned())
}

/// Decide whether `block` can become a pipe table.
pub fn classify_table(block: &DirectiveBlock) -> TableLayout {
    match simple_rows(block) {
        Some(rows) if !rows.is_empty() && rows.iter().all(|row| row.len() == 2) => {
            TableLayout::PipeTable
        }
        _ => TableLayout::Keep,
    }
}

/// Render a two-column list table as a raw Markdown pipe table.
///
/// Returns `None` unless [`classify_table`] reports [`TableLayout::PipeTable`].
pub fn to_pipe_table(block: &DirectiveBlock) -> Option<String> {
    if classify_table(block) != TableLayout::PipeTable {
        return None;
    }
    let rows = simple_rows(block)?;
    let header_rows = block
        .option("header-rows")
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(0)
        .min(1);

    let indent = &block.indent;
    let row_line = |row: &[String]| format!("{indent}   | {} |", row.join(" | "));
    let mut lines = vec![
        format!("{indent}.. code-block:: raw_markdown"),
        String::new(),
    ];
    let (header, body) = rows.split_at(header_rows);
    match header.first() {
        Some(row) => lines.push(row_line(row.as_slice())),
        None => lines.push(format!("{indent}   |   |   |")),
    }
    lines.push(format!("{indent}   |---|---|"));
    lines.extend(body.iter().map(|row| row_line(row.as_slice())));
    lines.push(String::new());
    Some(lines.join("\n") + "\n")
}

impl DirectiveTransform for ListTable {
    fn name(&self) -> &'static str {
        "list-table"
    }

    fn transform(&self, block: &DirectiveBlock, scope: &mut FileScope<'_>) -> String {
        if scope.ctx.collapse_tables
            && let Some(table) = to_pipe_table(block)
        {
            tracing::debug!(path = %scope.doc, "Collapsed list-table to pipe table");
            return table;
        }

        let indent = &block.indent;
        let mut lines = vec![if block.value.is_empty() {
            format!("{indent}.. list-table::")
        } else {
            format!("{indent}.. list-table:: {}", block.value)
        }];
        for (key, value) in &block.options {
            if LAYOUT_OPTIONS.contains(&key.as_str()) {
                continue;
            }
            lines.push(format!("{indent}   :{key}: {value}").trim_end().to_owned());
        }
        lines.push(String::new());
        for line in block.body_lines() {
            if line.trim().is_empty() {
                lines.push(String::new());
            } else {
                lines.push(format!("{indent}{line}"));
            }
        }
        lines.join("\n") + "\n"
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::directive::{apply, collect};
    use crate::{Context, MemorySource};

    const TWO_COLUMN: &str = ".. list-table::\n   :widths: 30 70\n   :header-rows: 1\n\n   * - Name\n     - Value\n   * - port\n     - 8080\n";

    fn run(ctx: &Context, text: &str) -> String {
        let source = MemorySource::new();
        let mut scope = FileScope::new(ctx, "page.rst", &source);
        apply(&ListTable, &mut scope, text)
    }

    #[test]
    fn test_list_table_drops_widths() {
        assert_eq!(
            run(&Context::default(), TWO_COLUMN),
            ".. list-table::\n   :header-rows: 1\n\n   * - Name\n     - Value\n   * - port\n     - 8080\n"
        );
    }

    #[test]
    fn test_list_table_output_is_stable() {
        let ctx = Context::default();
        let text = format!("{TWO_COLUMN}\nAfter the table.\n");
        let once = run(&ctx, &text);
        let twice = run(&ctx, &once);
        assert_eq!(once, twice);
        assert!(once.ends_with("     - 8080\n\nAfter the table.\n"));
    }

    #[test]
    fn test_classify_two_simple_cells() {
        let block = &collect(TWO_COLUMN, "list-table")[0];
        assert_eq!(classify_table(block), TableLayout::PipeTable);
    }

    #[test]
    fn test_classify_three_columns_kept() {
        let text = ".. list-table::\n\n   * - a\n     - b\n     - c\n";
        let block = &collect(text, "list-table")[0];
        assert_eq!(classify_table(block), TableLayout::Keep);
    }

    #[test]
    fn test_classify_multi_line_cell_kept() {
        let text = ".. list-table::\n\n   * - a\n     - b\n       continued\n";
        let block = &collect(text, "list-table")[0];
        assert_eq!(classify_table(block), TableLayout::Keep);
    }

    #[test]
    fn test_collapse_when_enabled() {
        let ctx = Context::default().with_collapse_tables(true);
        assert_eq!(
            run(&ctx, TWO_COLUMN),
            ".. code-block:: raw_markdown\n\n   | Name | Value |\n   |---|---|\n   | port | 8080 |\n\n"
        );
    }

    #[test]
    fn test_collapse_without_header() {
        let text = ".. list-table::\n\n   * - a\n     - b\n";
        let block = &collect(text, "list-table")[0];
        assert_eq!(
            to_pipe_table(block).unwrap(),
            ".. code-block:: raw_markdown\n\n   |   |   |\n   |---|---|\n   | a | b |\n\n"
        );
    }
}
