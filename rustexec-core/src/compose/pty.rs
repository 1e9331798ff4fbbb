//! Pseudo-terminal requests

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ExecError;

/// Accepted format of an explicit terminal specification
pub const PTY_PATTERN: &str = r"^(\w+):(\d+):(\d+):(\d+):(\d+)$";

static PTY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PTY_PATTERN).expect("PTY_PATTERN is a valid regex pattern"));

/// Explicit terminal type and geometry, written `TERM:COLS:ROWS:WIDTH:HEIGHT`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PtySpec {
    /// Terminal type, e.g. `vt220`
    pub term: String,
    /// Width in characters
    pub cols: u32,
    /// Height in rows
    pub rows: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl FromStr for PtySpec {
    type Err = ExecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            ExecError::InvalidConfiguration(format!(
                "Value for allocate_pty [{s}] does not match pattern \"{PTY_PATTERN}\""
            ))
        };
        let caps = PTY_REGEX.captures(s).ok_or_else(invalid)?;
        let number = |i: usize| caps[i].parse::<u32>().map_err(|_| invalid());

        Ok(Self {
            term: caps[1].to_string(),
            cols: number(2)?,
            rows: number(3)?,
            width: number(4)?,
            height: number(5)?,
        })
    }
}

impl fmt::Display for PtySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}",
            self.term, self.cols, self.rows, self.width, self.height
        )
    }
}

/// Pseudo-terminal to request for a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PtyRequest {
    /// Whatever terminal the transport allocates by default
    Default,
    /// A terminal with the given type and geometry
    Explicit(PtySpec),
}

impl PtyRequest {
    /// Returns the terminal type, if one was requested explicitly
    #[must_use]
    pub fn term(&self) -> Option<&str> {
        match self {
            Self::Default => None,
            Self::Explicit(spec) => Some(&spec.term),
        }
    }
}

impl fmt::Display for PtyRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Explicit(spec) => spec.fmt(f),
        }
    }
}
