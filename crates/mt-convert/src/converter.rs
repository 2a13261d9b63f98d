//! External format converter.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::ConvertError;

/// Markdown dialect written when converting to Markdown.
pub const MARKDOWN_OUT: &str = "markdown+definition_lists+fenced_divs+backtick_code_blocks+fenced_code_attributes-simple_tables+pipe_tables";

/// Markdown dialect read when converting from Markdown.
pub const MARKDOWN_IN: &str =
    "markdown+definition_lists+fenced_divs+backtick_code_blocks+fenced_code_attributes+pipe_tables";

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Converts one file between markup formats.
pub trait Converter: Sync {
    /// Convert `input` (format `from`) into `output` (format `to`).
    ///
    /// Succeeds only when `output` exists afterwards.
    fn convert(&self, from: &str, to: &str, input: &Path, output: &Path)
    -> Result<(), ConvertError>;
}

/// Runs `pandoc` as a child process with a time limit.
#[derive(Debug, Clone)]
pub struct Pandoc {
    program: String,
    timeout: Duration,
}

impl Pandoc {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    fn timed_out(&self) -> ConvertError {
        ConvertError::Timeout {
            program: self.program.clone(),
            secs: self.timeout.as_secs(),
        }
    }
}

impl Default for Pandoc {
    fn default() -> Self {
        Self::new("pandoc", Duration::from_secs(120))
    }
}

impl Converter for Pandoc {
    fn convert(
        &self,
        from: &str,
        to: &str,
        input: &Path,
        output: &Path,
    ) -> Result<(), ConvertError> {
        tracing::debug!(input = %input.display(), output = %output.display(), from, to, "Running converter");

        let mut child = Command::new(&self.program)
            .args(["--from", from, "--to", to, "--wrap=none", "--eol=lf", "-o"])
            .arg(output)
            .arg(input)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ConvertError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // A full stderr pipe would block the child.
        let stderr = child.stderr.take();
        let reader = thread::spawn(move || {
            let mut text = String::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_string(&mut text);
            }
            text
        });

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    let _ = reader.join();
                    tracing::warn!(input = %input.display(), "Converter timed out");
                    return Err(self.timed_out());
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(source) => {
                    let _ = child.kill();
                    return Err(ConvertError::Spawn {
                        program: self.program.clone(),
                        source,
                    });
                }
            }
        };
        let stderr = reader.join().unwrap_or_default();

        if !status.success() {
            return Err(ConvertError::Converter {
                program: self.program.clone(),
                status: status.to_string(),
                stderr: stderr.trim().to_owned(),
            });
        }
        if !stderr.trim().is_empty() {
            tracing::debug!(input = %input.display(), stderr = %stderr.trim(), "Converter diagnostics");
        }
        if !output.exists() {
            return Err(ConvertError::MissingOutput(output.to_path_buf()));
        }
        Ok(())
    }
}
