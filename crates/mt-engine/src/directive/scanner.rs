//! Indentation-aware directive scanner.
//!
//! Finds every `.. name::` block of one directive kind, captures its value,
//! options and indented body, and replaces the block with whatever the
//! transform returns. Everything outside matching blocks is copied through
//! unchanged.

use super::DirectiveBlock;

/// Tabs inside captured blocks expand to this many spaces.
const TAB_WIDTH: usize = 3;

/// Scanner position relative to the block being captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Outside any block.
    Scan,
    /// Directive line seen; `:name: value` lines are still options.
    CapturingOptions,
    /// Inside the indented body.
    CapturingBody,
    /// The current line ended the block.
    Closing,
}

/// Classification of a line relative to the block being captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// A `.. name::` line at or above the block indent.
    Opening,
    /// `:name: value` while options are accepted.
    Option,
    /// Non-blank line indented deeper than the directive.
    Body,
    /// Blank line followed by a deeper line.
    BlankInBody,
    /// Blank line not followed by a deeper line.
    BlankOutside,
    /// Non-blank line at or above the directive indent.
    Outside,
}

/// Next scanner state after a line of the given kind.
pub fn transition(state: ScanState, kind: LineKind) -> ScanState {
    use LineKind as K;
    use ScanState as S;

    match (state, kind) {
        (S::Scan | S::Closing, K::Opening) => S::CapturingOptions,
        (S::Scan | S::Closing, _) => S::Scan,
        (S::CapturingOptions, K::Option) => S::CapturingOptions,
        (S::CapturingOptions | S::CapturingBody, K::Body | K::BlankInBody | K::Option) => {
            S::CapturingBody
        }
        (S::CapturingOptions | S::CapturingBody, K::Opening | K::Outside | K::BlankOutside) => {
            S::Closing
        }
    }
}

/// Block under construction.
struct Capture {
    block: DirectiveBlock,
    body: Vec<String>,
    body_started: bool,
}

impl Capture {
    fn open(indent: &str, value: &str, name: &str) -> Self {
        Self {
            block: DirectiveBlock {
                name: name.to_owned(),
                value: value.trim().to_owned(),
                indent: indent.to_owned(),
                ..DirectiveBlock::default()
            },
            body: Vec::new(),
            body_started: false,
        }
    }

    fn indent_len(&self) -> usize {
        self.block.indent.len()
    }

    fn finish(mut self) -> DirectiveBlock {
        if self.body_started || !self.body.is_empty() {
            self.block.body = Some(self.body.join("\n"));
        }
        self.block
    }
}

/// Split a directive line into indent and value when it opens `name`.
fn parse_opening<'a>(line: &'a str, name: &str) -> Option<(&'a str, &'a str)> {
    let rest = line.trim_start_matches(' ');
    let indent = &line[..line.len() - rest.len()];
    let value = rest
        .strip_prefix(".. ")?
        .strip_prefix(name)?
        .strip_prefix("::")?;
    Some((indent, value))
}

/// Parse `:key: value` into its parts.
fn parse_option(line: &str) -> Option<(String, String)> {
    let rest = line.trim_start().strip_prefix(':')?;
    let (key, value) = rest.split_once(':')?;
    if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }
    Some((key.to_owned(), value.trim().to_owned()))
}

/// Leading spaces only; other whitespace is content.
pub(crate) fn indentation(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

fn expand_tabs(line: &str) -> String {
    line.replace('\t', &" ".repeat(TAB_WIDTH))
}

/// Whether the next non-blank line after `idx` is indented deeper than `indent_len`.
fn continues_body(lines: &[&str], idx: usize, indent_len: usize) -> bool {
    lines[idx + 1..]
        .iter()
        .find(|line| !line.trim().is_empty())
        .is_some_and(|line| indentation(&expand_tabs(line)) > indent_len)
}

fn classify(lines: &[&str], idx: usize, state: ScanState, capture: &Capture, name: &str) -> LineKind {
    let line = expand_tabs(lines[idx]);
    let indent_len = capture.indent_len();

    if line.trim().is_empty() {
        return if continues_body(lines, idx, indent_len) {
            LineKind::BlankInBody
        } else {
            LineKind::BlankOutside
        };
    }
    if state == ScanState::CapturingOptions
        && !capture.body_started
        && parse_option(&line).is_some()
    {
        return LineKind::Option;
    }
    if indentation(&line) > indent_len {
        return LineKind::Body;
    }
    if parse_opening(&line, name).is_some() {
        LineKind::Opening
    } else {
        LineKind::Outside
    }
}

/// Replace every `name` block in `text` with the transform's output.
///
/// Blocks of the same kind nested in a body are transformed first. The
/// trailing-newline state of `text` is preserved.
pub fn scan(text: &str, name: &str, mut transform: impl FnMut(&DirectiveBlock) -> String) -> String {
    scan_with(text, name, &mut transform)
}

/// Collect every `name` block without changing the text.
pub fn collect(text: &str, name: &str) -> Vec<DirectiveBlock> {
    let mut blocks = Vec::new();
    scan(text, name, |block| {
        blocks.push(block.clone());
        String::new()
    });
    blocks
}

fn scan_with(text: &str, name: &str, transform: &mut dyn FnMut(&DirectiveBlock) -> String) -> String {
    let marker = format!(".. {name}::");
    if !text.contains(&marker) {
        return text.to_owned();
    }

    let lines: Vec<&str> = text.lines().collect();
    let mut out = String::with_capacity(text.len());
    let mut state = ScanState::Scan;
    let mut capture: Option<Capture> = None;

    for (idx, raw) in lines.iter().enumerate() {
        let kind = match &capture {
            Some(current) => classify(&lines, idx, state, current, name),
            None if parse_opening(&expand_tabs(raw), name).is_some() => LineKind::Opening,
            None => LineKind::Outside,
        };
        let mut next = transition(state, kind);

        if next == ScanState::Closing {
            if let Some(done) = capture.take() {
                emit(&mut out, done, name, transform);
            }
            next = transition(ScanState::Closing, kind);
        }

        match next {
            ScanState::Scan | ScanState::Closing => {
                out.push_str(raw);
                out.push('\n');
            }
            ScanState::CapturingOptions => {
                let line = expand_tabs(raw);
                if kind == LineKind::Opening {
                    if let Some((indent, value)) = parse_opening(&line, name) {
                        capture = Some(Capture::open(indent, value, name));
                    }
                } else if let (Some(current), Some((key, value))) =
                    (capture.as_mut(), parse_option(&line))
                {
                    current.block.set_option(key, value);
                }
            }
            ScanState::CapturingBody => {
                if let Some(current) = capture.as_mut() {
                    push_body_line(current, &expand_tabs(raw), kind);
                }
            }
        }
        state = next;
    }

    if let Some(done) = capture.take() {
        emit(&mut out, done, name, transform);
    }
    if !text.ends_with('\n') && out.ends_with('\n') {
        out.pop();
    }
    out
}

fn push_body_line(current: &mut Capture, line: &str, kind: LineKind) {
    let indent_len = current.indent_len();
    match kind {
        LineKind::BlankInBody if !current.body_started && current.body.is_empty() => {
            current.body_started = true;
        }
        LineKind::BlankInBody => current.body.push(current.block.indent.clone()),
        _ => {
            current.body_started = true;
            let dedented = line.get(indent_len..).unwrap_or_else(|| line.trim_start());
            current.body.push(dedented.to_owned());
        }
    }
}

fn emit(
    out: &mut String,
    capture: Capture,
    name: &str,
    transform: &mut dyn FnMut(&DirectiveBlock) -> String,
) {
    let mut block = capture.finish();
    if let Some(body) = &block.body
        && body.contains(&format!(".. {name}::"))
    {
        block.body = Some(scan_with(body, name, transform));
    }

    let replacement = transform(&block);
    out.push_str(&replacement);
    if !replacement.is_empty() && !replacement.ends_with('\n') {
        out.push('\n');
    }
}
