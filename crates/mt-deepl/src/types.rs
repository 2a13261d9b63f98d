//! DeepL document API payloads.

use serde::Deserialize;

/// Identifies an uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DocumentHandle {
    #[serde(rename = "document_id")]
    pub id: String,
    #[serde(rename = "document_key")]
    pub key: String,
}

/// Translation state reported by the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationState {
    Queued,
    Translating,
    Done,
    Error,
}

/// Status endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentStatus {
    pub status: TranslationState,
    /// Estimated seconds until done, only while translating.
    pub seconds_remaining: Option<u64>,
    pub billed_characters: Option<u64>,
    pub error_message: Option<String>,
}

/// Languages and tone of a translation.
#[derive(Debug, Clone)]
pub struct TranslateOptions {
    pub source_lang: String,
    pub target_lang: String,
    pub formality: Option<String>,
}

impl TranslateOptions {
    pub fn new(source_lang: impl Into<String>, target_lang: impl Into<String>) -> Self {
        Self {
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
            formality: None,
        }
    }

    #[must_use]
    pub fn with_formality(mut self, formality: Option<String>) -> Self {
        self.formality = formality;
        self
    }
}
