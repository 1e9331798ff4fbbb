//! Process output handlers
//!
//! Executors deliver remote output line by line to an [`OutputHandler`].
//! Lines are delivered without their terminator.

use std::io::Write;

/// Receives output produced by a remote command
pub trait OutputHandler {
    /// Called for every complete line on the output stream
    fn handle_output_line(&mut self, line: &str);

    /// Called for every complete line on the error stream
    fn handle_error_line(&mut self, line: &str);

    /// Called for every character on the output stream, for handlers that
    /// need unbuffered output. Executors in this crate deliver lines only.
    fn handle_output_char(&mut self, _c: char) {}
}

impl<H: OutputHandler + ?Sized> OutputHandler for &mut H {
    fn handle_output_line(&mut self, line: &str) {
        (**self).handle_output_line(line);
    }

    fn handle_error_line(&mut self, line: &str) {
        (**self).handle_error_line(line);
    }

    fn handle_output_char(&mut self, c: char) {
        (**self).handle_output_char(c);
    }
}

/// Sends output to `tracing`: output lines at INFO, error lines at ERROR
#[derive(Debug, Clone)]
pub struct LoggingOutputHandler {
    prefix: String,
}

impl LoggingOutputHandler {
    /// Creates a handler that tags every event with the given prefix
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for LoggingOutputHandler {
    fn default() -> Self {
        Self::new("remote")
    }
}

impl OutputHandler for LoggingOutputHandler {
    fn handle_output_line(&mut self, line: &str) {
        tracing::info!(source = %self.prefix, "{line}");
    }

    fn handle_error_line(&mut self, line: &str) {
        tracing::error!(source = %self.prefix, "{line}");
    }
}

/// A line captured by [`CapturingOutputHandler`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapturedLine {
    /// Line from the output stream
    Output(String),
    /// Line from the error stream
    Error(String),
}

/// Collects every line in arrival order
#[derive(Debug, Clone, Default)]
pub struct CapturingOutputHandler {
    lines: Vec<CapturedLine>,
}

impl CapturingOutputHandler {
    /// Creates an empty capturing handler
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all captured lines, interleaved in arrival order
    #[must_use]
    pub fn lines(&self) -> &[CapturedLine] {
        &self.lines
    }

    /// Returns the output lines only
    #[must_use]
    pub fn output_lines(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter_map(|l| match l {
                CapturedLine::Output(s) => Some(s.as_str()),
                CapturedLine::Error(_) => None,
            })
            .collect()
    }

    /// Returns the error lines only
    #[must_use]
    pub fn error_lines(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter_map(|l| match l {
                CapturedLine::Error(s) => Some(s.as_str()),
                CapturedLine::Output(_) => None,
            })
            .collect()
    }
}

impl OutputHandler for CapturingOutputHandler {
    fn handle_output_line(&mut self, line: &str) {
        self.lines.push(CapturedLine::Output(line.to_string()));
    }

    fn handle_error_line(&mut self, line: &str) {
        self.lines.push(CapturedLine::Error(line.to_string()));
    }
}

/// Writes output lines to stdout and error lines to stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct StreamingOutputHandler;

impl OutputHandler for StreamingOutputHandler {
    fn handle_output_line(&mut self, line: &str) {
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{line}") {
            tracing::warn!(error = %e, "Failed to write output line");
        }
    }

    fn handle_error_line(&mut self, line: &str) {
        let mut stderr = std::io::stderr().lock();
        if let Err(e) = writeln!(stderr, "{line}") {
            tracing::warn!(error = %e, "Failed to write error line");
        }
    }
}
