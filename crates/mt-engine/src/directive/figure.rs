//! `figure` → image line, emphasized caption and legend note.

use super::{DirectiveBlock, DirectiveTransform};
use crate::context::FileScope;
use crate::paths;

pub struct Figure;

/// Caption and legend split out of a figure body.
///
/// The caption is the first paragraph; everything after the first blank
/// line is the legend.
fn split_body(block: &DirectiveBlock) -> (Vec<&str>, Vec<&str>) {
    let mut caption = Vec::new();
    let mut legend = Vec::new();
    let mut in_legend = false;
    for line in block.body_lines().map(str::trim) {
        if line.is_empty() {
            if !caption.is_empty() {
                if in_legend {
                    legend.push(line);
                }
                in_legend = true;
            }
        } else if in_legend {
            legend.push(line);
        } else {
            caption.push(line);
        }
    }
    while legend.last().is_some_and(|line| line.is_empty()) {
        legend.pop();
    }
    (caption, legend)
}

impl DirectiveTransform for Figure {
    fn name(&self) -> &'static str {
        "figure"
    }

    fn transform(&self, block: &DirectiveBlock, scope: &mut FileScope<'_>) -> String {
        let indent = &block.indent;
        let image = paths::rooted_to_relative(scope.doc, &block.value);
        let mut lines = vec![format!("{indent}.. image:: {image}")];

        let (caption, legend) = split_body(block);
        if !caption.is_empty() {
            let caption = caption.join(" ");
            lines.push(String::new());
            if caption.starts_with('*') || caption.ends_with('*') {
                lines.push(format!("{indent}{caption}"));
            } else {
                lines.push(format!("{indent}*{caption}*"));
            }
        }
        if !legend.is_empty() {
            lines.push(String::new());
            lines.push(format!("{indent}.. note::"));
            lines.push(String::new());
            for line in legend {
                if line.is_empty() {
                    lines.push(String::new());
                } else {
                    lines.push(format!("{indent}   {line}"));
                }
            }
        }

        tracing::debug!(path = %scope.doc, image = %image, "Rewrote figure");
        lines.join("\n") + "\n"
    }
}
