//! Error types for the translation client.

use std::path::PathBuf;

use crate::types::DocumentHandle;

/// Error from DeepL API operations.
#[derive(Debug, thiserror::Error)]
pub enum DeeplError {
    /// HTTP request failed (network error, timeout, etc).
    #[error("HTTP request failed")]
    HttpRequest(#[from] ureq::Error),

    /// HTTP response error (server returned error status).
    #[error("HTTP error: {status} - {body}")]
    HttpResponse {
        /// HTTP status code.
        status: u16,
        /// Response body (may contain error details).
        body: String,
    },

    /// JSON deserialization error.
    #[error("JSON error")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document could not be uploaded.
    #[error("Upload failed after {attempts} attempt(s)")]
    Upload {
        attempts: u32,
        #[source]
        source: Box<DeeplError>,
    },

    /// Document was uploaded but translation or download failed.
    ///
    /// The handle can be used to fetch the result later.
    #[error("Translation failed for document {} (key {}): {message}", handle.id, handle.key)]
    Document {
        handle: DocumentHandle,
        message: String,
    },
}

impl DeeplError {
    /// Whether retrying the same request may succeed.
    pub(crate) fn is_retryable(&self) -> bool {
        match self {
            Self::HttpRequest(_) => true,
            Self::HttpResponse { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
