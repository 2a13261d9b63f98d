//! Code fence tracking for converter output.
//!
//! Postprocessing must leave code blocks alone and unwrap `raw_markdown`
//! blocks, so it needs to know where fences open and close and which info
//! string an opening fence carries.

/// Fence transition reported for a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FenceEvent {
    /// Opening fence with its info string (`raw_markdown`, `xml`, empty).
    Open { info: String },
    Close,
}

/// Tracks code fence state during line-by-line processing.
///
/// Fences use backticks or tildes (three or more). The closing fence must
/// use the same character and be at least as long as the opening fence.
#[derive(Debug, Default)]
pub(crate) struct FenceTracker {
    fence_char: Option<char>,
    fence_len: usize,
}

impl FenceTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn in_fence(&self) -> bool {
        self.fence_char.is_some()
    }

    /// Update fence state based on a line.
    pub(crate) fn update(&mut self, line: &str) -> Option<FenceEvent> {
        let trimmed = line.trim_start();

        if let Some(fence_char) = self.fence_char {
            if is_closing_fence(trimmed, fence_char, self.fence_len) {
                self.fence_char = None;
                self.fence_len = 0;
                return Some(FenceEvent::Close);
            }
            None
        } else {
            let (ch, len) = detect_fence(trimmed)?;
            self.fence_char = Some(ch);
            self.fence_len = len;
            let info = trimmed[len..].trim().trim_start_matches('{').trim_end_matches('}');
            Some(FenceEvent::Open {
                info: info.trim().to_owned(),
            })
        }
    }
}

/// Fence character and length when `trimmed` opens a fence.
fn detect_fence(trimmed: &str) -> Option<(char, usize)> {
    let first = trimmed.chars().next()?;
    if first != '`' && first != '~' {
        return None;
    }

    let count = trimmed.chars().take_while(|&c| c == first).count();
    if count < 3 {
        return None;
    }
    // Backtick info strings may not contain backticks.
    if first == '`' && trimmed[count..].contains('`') {
        return None;
    }
    Some((first, count))
}

fn is_closing_fence(trimmed: &str, expected_char: char, min_len: usize) -> bool {
    let count = trimmed.chars().take_while(|&c| c == expected_char).count();
    if count == 0 || count < min_len {
        return false;
    }
    trimmed[count..].chars().all(char::is_whitespace)
}
