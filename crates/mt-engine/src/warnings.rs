//! Non-fatal diagnostics collected while processing documents.

use std::fmt;

/// A single diagnostic tied to the document that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// Corpus-relative path of the document.
    pub path: String,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Ordered collection of warnings.
///
/// Every pushed warning is also emitted through `tracing`, so callers that
/// only want log output can ignore the collected list.
#[derive(Debug, Default, Clone)]
pub struct Warnings {
    items: Vec<Warning>,
}

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: &str, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(path = %path, "{message}");
        self.items.push(Warning {
            path: path.to_owned(),
            message,
        });
    }

    /// Append already-logged warnings without emitting them again.
    pub fn extend(&mut self, other: impl IntoIterator<Item = Warning>) {
        self.items.extend(other);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Warning> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<Warning> {
        self.items
    }
}

impl IntoIterator for Warnings {
    type Item = Warning;
    type IntoIter = std::vec::IntoIter<Warning>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keeps_order() {
        let mut warnings = Warnings::new();
        warnings.push("a.rst", "first");
        warnings.push("b.rst", String::from("second"));

        let messages: Vec<_> = warnings.iter().map(ToString::to_string).collect();
        assert_eq!(messages, vec!["a.rst: first", "b.rst: second"]);
    }

    #[test]
    fn test_extend_moves_items() {
        let mut first = Warnings::new();
        first.push("a.rst", "one");
        let mut all = Warnings::new();
        all.extend(first);
        assert_eq!(all.len(), 1);
    }
}
