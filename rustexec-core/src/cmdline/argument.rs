//! Command line arguments and their OS-specific encoding

use std::fmt;

use crate::error::{ExecError, ExecResult};

use super::{CmdLine, OperatingSystemFamily};

/// Characters that force an argument to be quoted or escaped
pub const SPECIAL_CHARS: &str = " '\"\\;()${}*?";

/// Encoding of an empty argument
pub const EMPTY_ARGUMENT: &str = "\"\"";

/// Replacement for secret arguments in logging mode
pub const SECRET_MASK: &str = "********";

/// Kind of a text argument, used by [`CmdLineArgument::new`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentKind {
    /// Regular argument, escaped for the target OS
    Plain,
    /// Escaped like `Plain` for execution, masked when logged
    Secret,
    /// Passed through verbatim
    Raw,
}

/// A single command line argument
#[derive(Clone, PartialEq, Eq)]
pub enum CmdLineArgument {
    /// Regular argument
    Plain(String),
    /// Password or other secret; rendered as [`SECRET_MASK`] for logging
    Secret(String),
    /// Verbatim text such as a command separator or redirection
    Raw(String),
    /// A whole command line quoted as a single token, e.g. for `su -c`
    Nested(CmdLine),
}

impl CmdLineArgument {
    /// Creates a text argument of the given kind
    ///
    /// # Errors
    ///
    /// Returns `ExecError::InvalidArgument` if `text` is `None`.
    pub fn new(kind: ArgumentKind, text: Option<&str>) -> ExecResult<Self> {
        let text = text.ok_or_else(|| {
            ExecError::InvalidArgument(format!("Cannot create a null {kind:?} argument"))
        })?;
        Ok(match kind {
            ArgumentKind::Plain => Self::Plain(text.to_string()),
            ArgumentKind::Secret => Self::Secret(text.to_string()),
            ArgumentKind::Raw => Self::Raw(text.to_string()),
        })
    }

    /// Creates a nested argument
    ///
    /// # Errors
    ///
    /// Returns `ExecError::InvalidArgument` if `line` is `None`.
    pub fn try_nested(line: Option<CmdLine>) -> ExecResult<Self> {
        line.map(Self::Nested).ok_or_else(|| {
            ExecError::InvalidArgument("Cannot create a null nested command".to_string())
        })
    }

    /// Creates a regular argument
    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain(text.into())
    }

    /// Creates a secret argument
    #[must_use]
    pub fn secret(text: impl Into<String>) -> Self {
        Self::Secret(text.into())
    }

    /// Creates a raw argument
    #[must_use]
    pub fn raw(text: impl Into<String>) -> Self {
        Self::Raw(text.into())
    }

    /// Creates a nested argument
    #[must_use]
    pub const fn nested(line: CmdLine) -> Self {
        Self::Nested(line)
    }

    /// Renders this argument for the given OS family
    ///
    /// With `for_logging` set, secrets are masked (also inside nested lines).
    #[must_use]
    pub fn render(&self, os: OperatingSystemFamily, for_logging: bool) -> String {
        let mut out = String::new();
        self.render_into(os, for_logging, &mut out);
        out
    }

    pub(crate) fn render_into(&self, os: OperatingSystemFamily, for_logging: bool, out: &mut String) {
        match self {
            Self::Plain(text) => encode(text, os, out),
            Self::Secret(_) if for_logging => out.push_str(SECRET_MASK),
            Self::Secret(text) => encode(text, os, out),
            Self::Raw(text) if text.is_empty() => out.push_str(EMPTY_ARGUMENT),
            Self::Raw(text) => out.push_str(text),
            Self::Nested(line) => encode(&line.render(os, for_logging), os, out),
        }
    }
}

impl fmt::Display for CmdLineArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(OperatingSystemFamily::Unix, true))
    }
}

impl fmt::Debug for CmdLineArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(text) => f.debug_tuple("Plain").field(text).finish(),
            Self::Secret(_) => f.debug_tuple("Secret").field(&SECRET_MASK).finish(),
            Self::Raw(text) => f.debug_tuple("Raw").field(text).finish(),
            Self::Nested(line) => f.debug_tuple("Nested").field(line).finish(),
        }
    }
}

fn has_special_chars(text: &str) -> bool {
    text.chars().any(|c| SPECIAL_CHARS.contains(c))
}

fn encode(text: &str, os: OperatingSystemFamily, out: &mut String) {
    if text.is_empty() {
        out.push_str(EMPTY_ARGUMENT);
    } else if !has_special_chars(text) {
        out.push_str(text);
    } else if os.is_windows() {
        out.push('"');
        for c in text.chars() {
            if c == '"' {
                out.push('"');
            }
            out.push(c);
        }
        out.push('"');
    } else {
        for c in text.chars() {
            if SPECIAL_CHARS.contains(c) {
                out.push('\\');
            }
            out.push(c);
        }
    }
}
