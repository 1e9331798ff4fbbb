//! Prompt detection on live process output
//!
//! [`PromptScanningReader`] sits between a process's output stream and
//! whoever consumes it. Every byte passes through unchanged; when the prompt
//! pattern shows up in the recent output, the response is written to the
//! process's input stream, once.

use std::fmt;
use std::io::{self, Read, Write};

use regex::bytes::Regex;
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroizing;

use crate::error::{ExecError, ExecResult};

/// Default pattern for sudo password prompts
pub const DEFAULT_PASSWORD_PROMPT: &str = ".*[Pp]assword.*:";

/// Upper bound of the scanned window, in bytes
pub const MAX_WINDOW_BYTES: usize = 4096;

/// Lower bound of the scanned window, in bytes
pub const MIN_WINDOW_BYTES: usize = 256;

/// Window size per byte of pattern text
const WINDOW_PATTERN_MULTIPLE: usize = 8;

/// A validated prompt-detection pattern
#[derive(Clone)]
pub struct PromptPattern {
    source: String,
    regex: Regex,
}

impl PromptPattern {
    /// Compiles a prompt pattern
    ///
    /// # Errors
    ///
    /// Returns `ExecError::InvalidConfiguration` if the pattern ends in a
    /// wildcard (`*` or `?`) or is not a valid regular expression.
    pub fn new(pattern: &str) -> ExecResult<Self> {
        validate_prompt_pattern(pattern)?;
        let regex = Regex::new(pattern).map_err(|e| {
            ExecError::InvalidConfiguration(format!(
                "Failed to compile prompt pattern '{pattern}': {e}"
            ))
        })?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Returns the pattern text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns how many trailing output bytes are scanned for this pattern
    ///
    /// A small multiple of the pattern length, kept within
    /// [`MIN_WINDOW_BYTES`] and [`MAX_WINDOW_BYTES`].
    #[must_use]
    pub fn window_limit(&self) -> usize {
        self.source
            .len()
            .saturating_mul(WINDOW_PATTERN_MULTIPLE)
            .clamp(MIN_WINDOW_BYTES, MAX_WINDOW_BYTES)
    }

    /// Returns true if the pattern occurs anywhere in `haystack`
    #[must_use]
    pub fn is_match(&self, haystack: &[u8]) -> bool {
        self.regex.is_match(haystack)
    }
}

impl fmt::Debug for PromptPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PromptPattern").field(&self.source).finish()
    }
}

/// Checks that a prompt pattern does not end in a wildcard
///
/// A trailing wildcard would let the pattern match before the prompt has
/// been fully written.
///
/// # Errors
///
/// Returns `ExecError::InvalidConfiguration` if the pattern ends in `*` or `?`.
pub fn validate_prompt_pattern(pattern: &str) -> ExecResult<()> {
    if pattern.ends_with('*') || pattern.ends_with('?') {
        return Err(ExecError::InvalidConfiguration(format!(
            "Prompt pattern '{pattern}' should not end in a wildcard"
        )));
    }
    Ok(())
}

/// A prompt pattern paired with the response that answers it
#[derive(Clone)]
pub struct PromptResponder {
    pattern: PromptPattern,
    secret: SecretString,
}

impl PromptResponder {
    /// Creates a responder answering `pattern` with `secret` followed by a
    /// line terminator
    #[must_use]
    pub const fn new(pattern: PromptPattern, secret: SecretString) -> Self {
        Self { pattern, secret }
    }

    /// Returns the prompt pattern
    #[must_use]
    pub const fn pattern(&self) -> &PromptPattern {
        &self.pattern
    }

    /// Wraps a process output stream, answering prompts on `input`
    pub fn wrap<R: Read, W: Write>(&self, output: R, input: W) -> PromptScanningReader<R, W> {
        let mut response = Zeroizing::new(self.secret.expose_secret().as_bytes().to_vec());
        response.extend_from_slice(b"\r\n");
        PromptScanningReader::new(output, input, self.pattern.clone(), response)
    }
}

impl fmt::Debug for PromptResponder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromptResponder")
            .field("pattern", &self.pattern)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Pass-through reader that answers a prompt on the paired input stream
pub struct PromptScanningReader<R, W> {
    output: R,
    input: W,
    pattern: PromptPattern,
    response: Zeroizing<Vec<u8>>,
    window: Vec<u8>,
    window_limit: usize,
    has_responded: bool,
}

impl<R: Read, W: Write> PromptScanningReader<R, W> {
    /// Creates a reader that writes `response` to `input` the first time
    /// `pattern` matches the recent output
    #[must_use]
    pub fn new(output: R, input: W, pattern: PromptPattern, response: Zeroizing<Vec<u8>>) -> Self {
        let window_limit = pattern.window_limit();
        Self {
            output,
            input,
            pattern,
            response,
            window: Vec::new(),
            window_limit,
            has_responded: false,
        }
    }

    /// Returns true once the response has been written
    #[must_use]
    pub const fn has_responded(&self) -> bool {
        self.has_responded
    }

    /// Returns the paired input stream
    pub fn input_mut(&mut self) -> &mut W {
        &mut self.input
    }

    fn scan(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.window.extend_from_slice(bytes);
        trim_window(&mut self.window, self.window_limit);

        if self.pattern.is_match(&self.window) {
            tracing::debug!(pattern = %self.pattern.as_str(), "Prompt detected, sending response");
            self.input.write_all(&self.response)?;
            self.input.flush()?;
            self.has_responded = true;
            self.window = Vec::new();
        }
        Ok(())
    }
}

impl<R: Read, W: Write> Read for PromptScanningReader<R, W> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.output.read(buf)?;
        if n > 0 && !self.has_responded {
            self.scan(&buf[..n])?;
        }
        Ok(n)
    }
}

impl<R, W> fmt::Debug for PromptScanningReader<R, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromptScanningReader")
            .field("pattern", &self.pattern)
            .field("window_len", &self.window.len())
            .field("has_responded", &self.has_responded)
            .finish_non_exhaustive()
    }
}

/// Drops bytes from the front so at most `max` remain, starting on a
/// character boundary
fn trim_window(window: &mut Vec<u8>, max: usize) {
    if window.len() <= max {
        return;
    }
    let mut start = window.len() - max;
    while start < window.len() && is_continuation_byte(window[start]) {
        start += 1;
    }
    window.drain(..start);
}

const fn is_continuation_byte(byte: u8) -> bool {
    byte & 0b1100_0000 == 0b1000_0000
}
