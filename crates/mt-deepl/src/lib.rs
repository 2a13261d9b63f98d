//! DeepL document translation for mkdocs-translate.
//!
//! Uploads an HTML document, waits for the translation and downloads the
//! result. Uploads are retried with exponential backoff on transport
//! errors, `429` and `5xx` responses.
//!
//! ```no_run
//! use std::path::Path;
//!
//! use mt_deepl::{DeeplClient, TranslateOptions};
//!
//! let client = DeeplClient::new("https://api-free.deepl.com", "auth-key").with_max_retries(3);
//! let options = TranslateOptions::new("EN", "FR").with_formality(Some("more".to_owned()));
//! client.translate_document(Path::new("index.tmp.html"), Path::new("index.fr.html"), &options)?;
//! # Ok::<(), mt_deepl::DeeplError>(())
//! ```

mod client;
mod error;
mod types;

pub use client::DeeplClient;
pub use error::DeeplError;
pub use types::{DocumentHandle, DocumentStatus, TranslateOptions, TranslationState};
