//! DeepL document API client.
//!
//! A translation is three steps: upload the document, poll its status until
//! done, download the result. Only the upload is retried; once a document is
//! uploaded every failure carries its [`DocumentHandle`].

use std::fs;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use ureq::Agent;

use crate::error::DeeplError;
use crate::types::{DocumentHandle, DocumentStatus, TranslateOptions, TranslationState};

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT: u64 = 60;

/// Longest single wait between status polls.
const MAX_POLL_WAIT: Duration = Duration::from_secs(10);

/// Longest single wait between upload attempts.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// DeepL document translation client.
pub struct DeeplClient {
    agent: Agent,
    api_url: String,
    auth_key: String,
    max_retries: u32,
    backoff: Duration,
    poll_interval: Duration,
    poll_limit: Duration,
}

impl DeeplClient {
    /// Create client for `api_url` (e.g. `https://api-free.deepl.com`).
    pub fn new(api_url: &str, auth_key: &str) -> Self {
        Self {
            agent: agent(Duration::from_secs(DEFAULT_TIMEOUT)),
            api_url: api_url.trim_end_matches('/').to_owned(),
            auth_key: auth_key.to_owned(),
            max_retries: 3,
            backoff: Duration::from_millis(500),
            poll_interval: Duration::from_secs(1),
            poll_limit: Duration::from_secs(15 * 60),
        }
    }

    /// Set the HTTP timeout per request.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = agent(timeout);
        self
    }

    /// Set how many times a failed upload is retried.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the first retry delay; each further retry doubles it.
    #[must_use]
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Set the status poll interval and the total time to wait for a result.
    #[must_use]
    pub fn with_polling(mut self, interval: Duration, limit: Duration) -> Self {
        self.poll_interval = interval;
        self.poll_limit = limit;
        self
    }

    /// Translate `input` and write the result to `output`.
    ///
    /// # Errors
    ///
    /// Returns [`DeeplError::Upload`] when the document never reached the
    /// service and [`DeeplError::Document`] when it did but no result came back.
    pub fn translate_document(
        &self,
        input: &Path,
        output: &Path,
        options: &TranslateOptions,
    ) -> Result<DocumentHandle, DeeplError> {
        let data = fs::read(input).map_err(|source| DeeplError::Read {
            path: input.to_path_buf(),
            source,
        })?;
        let filename = input
            .file_name()
            .map_or_else(|| "document.html".to_owned(), |name| name.to_string_lossy().into_owned());

        let handle = self.upload_with_retry(&filename, &data, options)?;
        tracing::info!(path = %input.display(), document = %handle.id, "Uploaded for translation");

        let translated = self
            .wait_until_done(&handle)
            .and_then(|()| self.download(&handle))
            .map_err(|err| DeeplError::Document {
                handle: handle.clone(),
                message: err.to_string(),
            })?;

        save_result(&handle, output, &translated)?;
        tracing::info!(path = %output.display(), document = %handle.id, "Downloaded translation");
        Ok(handle)
    }

    fn upload_with_retry(
        &self,
        filename: &str,
        data: &[u8],
        options: &TranslateOptions,
    ) -> Result<DocumentHandle, DeeplError> {
        retry(self.max_retries, self.backoff, || {
            self.upload(filename, data, options)
        })
    }

    fn upload(
        &self,
        filename: &str,
        data: &[u8],
        options: &TranslateOptions,
    ) -> Result<DocumentHandle, DeeplError> {
        let url = format!("{}/v2/document", self.api_url);
        let boundary = format!("----MtFormBoundary{}", uuid::Uuid::new_v4().simple());

        let mut fields = vec![
            ("source_lang", options.source_lang.as_str()),
            ("target_lang", options.target_lang.as_str()),
        ];
        if let Some(formality) = &options.formality {
            fields.push(("formality", formality.as_str()));
        }
        let body = multipart_body(&boundary, &fields, filename, data);

        let response = self
            .agent
            .post(&url)
            .header("Authorization", &self.auth_header())
            .header(
                "Content-Type",
                &format!("multipart/form-data; boundary={boundary}"),
            )
            .header("Accept", "application/json")
            .send(&body[..])?;
        read_json(response)
    }

    fn status(&self, handle: &DocumentHandle) -> Result<DocumentStatus, DeeplError> {
        let url = format!("{}/v2/document/{}", self.api_url, handle.id);
        let response = self
            .agent
            .post(&url)
            .header("Authorization", &self.auth_header())
            .header("Accept", "application/json")
            .send_form([("document_key", handle.key.as_str())])?;
        read_json(response)
    }

    fn wait_until_done(&self, handle: &DocumentHandle) -> Result<(), DeeplError> {
        let deadline = Instant::now() + self.poll_limit;
        loop {
            let status = self.status(handle)?;
            match status.status {
                TranslationState::Done => {
                    tracing::debug!(
                        document = %handle.id,
                        billed_characters = status.billed_characters.unwrap_or(0),
                        "Translation done"
                    );
                    return Ok(());
                }
                TranslationState::Error => {
                    return Err(DeeplError::HttpResponse {
                        status: 200,
                        body: status
                            .error_message
                            .unwrap_or_else(|| "translation error".to_owned()),
                    });
                }
                TranslationState::Queued | TranslationState::Translating => {}
            }
            if Instant::now() >= deadline {
                return Err(DeeplError::HttpResponse {
                    status: 200,
                    body: format!("not done after {}s", self.poll_limit.as_secs()),
                });
            }
            let wait = status
                .seconds_remaining
                .map_or(self.poll_interval, Duration::from_secs)
                .clamp(self.poll_interval, MAX_POLL_WAIT.max(self.poll_interval));
            tracing::debug!(document = %handle.id, state = ?status.status, wait_ms = wait.as_millis(), "Waiting for translation");
            thread::sleep(wait);
        }
    }

    fn download(&self, handle: &DocumentHandle) -> Result<Vec<u8>, DeeplError> {
        let url = format!("{}/v2/document/{}/result", self.api_url, handle.id);
        let response = self
            .agent
            .post(&url)
            .header("Authorization", &self.auth_header())
            .send_form([("document_key", handle.key.as_str())])?;

        let status = response.status().as_u16();
        let mut body = response.into_body();
        if status >= 400 {
            return Err(error_response(status, &mut body));
        }
        Ok(body.read_to_vec()?)
    }

    fn auth_header(&self) -> String {
        format!("DeepL-Auth-Key {}", self.auth_key)
    }
}

/// Write a downloaded translation.
///
/// The service only serves a result once, so a failed write still reports
/// the handle.
fn save_result(handle: &DocumentHandle, output: &Path, data: &[u8]) -> Result<(), DeeplError> {
    let written = output
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|()| fs::write(output, data));
    written.map_err(|source| {
        tracing::warn!(
            path = %output.display(),
            document = %handle.id,
            key = %handle.key,
            error = %source,
            "Translated document downloaded but not written"
        );
        DeeplError::Document {
            handle: handle.clone(),
            message: format!("failed to write {}: {source}", output.display()),
        }
    })
}

fn agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

fn read_json<T: DeserializeOwned>(
    response: ureq::http::Response<ureq::Body>,
) -> Result<T, DeeplError> {
    let status = response.status().as_u16();
    let mut body = response.into_body();
    if status >= 400 {
        return Err(error_response(status, &mut body));
    }
    let text = body.read_to_string()?;
    Ok(serde_json::from_str(&text)?)
}

fn error_response(status: u16, body: &mut ureq::Body) -> DeeplError {
    let body = body
        .read_to_string()
        .unwrap_or_else(|_| "(unable to read error body)".to_owned());
    DeeplError::HttpResponse { status, body }
}

/// Run `op`, retrying retryable failures with exponential backoff.
fn retry<T>(
    max_retries: u32,
    backoff: Duration,
    mut op: impl FnMut() -> Result<T, DeeplError>,
) -> Result<T, DeeplError> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt <= max_retries => {
                let wait = backoff_delay(backoff, attempt);
                tracing::warn!(attempt, wait_ms = wait.as_millis(), error = %err, "Upload failed, retrying");
                thread::sleep(wait);
            }
            Err(err) => {
                return Err(DeeplError::Upload {
                    attempts: attempt,
                    source: Box::new(err),
                });
            }
        }
    }
}

/// Delay before retry number `attempt` (1-based).
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(factor).min(MAX_BACKOFF)
}

/// Build a `multipart/form-data` body with text `fields` and one file part.
fn multipart_body(boundary: &str, fields: &[(&str, &str)], filename: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(data.len() + 512);
    for (name, value) in fields {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: text/html\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(b"\r\n");

    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use pretty_assertions::assert_eq;

    use super::*;

    fn server_error(status: u16) -> DeeplError {
        DeeplError::HttpResponse {
            status,
            body: String::new(),
        }
    }

    #[test]
    fn test_multipart_body() {
        let body = multipart_body("XYZ", &[("target_lang", "FR")], "index.html", b"<p>Hi</p>");
        assert_eq!(
            String::from_utf8(body).unwrap(),
            "--XYZ\r\n\
             Content-Disposition: form-data; name=\"target_lang\"\r\n\r\n\
             FR\r\n\
             --XYZ\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"index.html\"\r\n\
             Content-Type: text/html\r\n\r\n\
             <p>Hi</p>\r\n\
             --XYZ--\r\n"
        );
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let base = Duration::from_millis(500);
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(500));
        assert_eq!(backoff_delay(base, 2), Duration::from_secs(1));
        assert_eq!(backoff_delay(base, 3), Duration::from_secs(2));
        assert_eq!(backoff_delay(base, 20), MAX_BACKOFF);
    }

    #[test]
    fn test_retry_until_success() {
        let calls = Cell::new(0);
        let result = retry(3, Duration::ZERO, || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(server_error(503))
            } else {
                Ok("done")
            }
        });
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_retry_gives_up() {
        let calls = Cell::new(0);
        let result: Result<(), _> = retry(2, Duration::ZERO, || {
            calls.set(calls.get() + 1);
            Err(server_error(429))
        });
        assert_eq!(calls.get(), 3);
        assert!(matches!(result, Err(DeeplError::Upload { attempts: 3, .. })));
    }

    #[test]
    fn test_client_error_not_retried() {
        let calls = Cell::new(0);
        let result: Result<(), _> = retry(5, Duration::ZERO, || {
            calls.set(calls.get() + 1);
            Err(server_error(403))
        });
        assert_eq!(calls.get(), 1);
        assert!(matches!(result, Err(DeeplError::Upload { attempts: 1, .. })));
    }

    #[test]
    fn test_missing_input_fails_before_upload() {
        let client = DeeplClient::new("https://api-free.deepl.com/", "key");
        let options = TranslateOptions::new("EN", "FR");
        let result = client.translate_document(
            Path::new("/nonexistent/index.html"),
            Path::new("/nonexistent/index.fr.html"),
            &options,
        );
        assert!(matches!(result, Err(DeeplError::Read { .. })));
        assert_eq!(client.api_url, "https://api-free.deepl.com");
    }

    #[test]
    fn test_failed_write_keeps_handle() {
        let dir = tempfile::TempDir::new().unwrap();
        let blocker = dir.path().join("download");
        fs::write(&blocker, "not a folder").unwrap();
        let handle = DocumentHandle {
            id: "doc-1".to_owned(),
            key: "key-1".to_owned(),
        };

        let result = save_result(&handle, &blocker.join("index.fr.html"), b"<p>Bonjour</p>");
        match result {
            Err(DeeplError::Document { handle: kept, .. }) => assert_eq!(kept, handle),
            other => panic!("expected document error, got {other:?}"),
        }
    }

    #[test]
    fn test_save_result_creates_folders() {
        let dir = tempfile::TempDir::new().unwrap();
        let output = dir.path().join("download/install/index.fr.html");
        let handle = DocumentHandle {
            id: "doc-1".to_owned(),
            key: "key-1".to_owned(),
        };
        save_result(&handle, &output, b"<p>Bonjour</p>").unwrap();
        assert_eq!(fs::read_to_string(output).unwrap(), "<p>Bonjour</p>");
    }
}
