//! Ordered command lines

use std::fmt;

use crate::error::ExecResult;

use super::{ArgumentKind, CmdLineArgument, OperatingSystemFamily};

/// A command line made of typed arguments
///
/// Arguments keep their insertion order and duplicates are allowed. A command
/// line is rendered to a single string per target OS family, either for
/// execution or for logging (secrets masked).
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CmdLine {
    arguments: Vec<CmdLineArgument>,
}

impl CmdLine {
    /// Creates an empty command line
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a command line from plain arguments
    #[must_use]
    pub fn build<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        args.into_iter().map(CmdLineArgument::plain).collect()
    }

    /// Appends an argument
    pub fn add(&mut self, argument: CmdLineArgument) -> &mut Self {
        self.arguments.push(argument);
        self
    }

    /// Appends a plain argument
    pub fn add_argument(&mut self, text: impl Into<String>) -> &mut Self {
        self.add(CmdLineArgument::plain(text))
    }

    /// Appends a secret argument
    pub fn add_secret(&mut self, text: impl Into<String>) -> &mut Self {
        self.add(CmdLineArgument::secret(text))
    }

    /// Appends a raw argument
    pub fn add_raw(&mut self, text: impl Into<String>) -> &mut Self {
        self.add(CmdLineArgument::raw(text))
    }

    /// Appends a nested command line
    pub fn add_nested(&mut self, line: Self) -> &mut Self {
        self.add(CmdLineArgument::nested(line))
    }

    /// Appends a text argument of the given kind
    ///
    /// # Errors
    ///
    /// Returns `ExecError::InvalidArgument` if `text` is `None`.
    pub fn try_add(&mut self, kind: ArgumentKind, text: Option<&str>) -> ExecResult<&mut Self> {
        let argument = CmdLineArgument::new(kind, text)?;
        Ok(self.add(argument))
    }

    /// Returns the arguments in order
    #[must_use]
    pub fn arguments(&self) -> &[CmdLineArgument] {
        &self.arguments
    }

    /// Returns the number of arguments
    #[must_use]
    pub fn len(&self) -> usize {
        self.arguments.len()
    }

    /// Returns true if the command line has no arguments
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }

    /// Renders the command line, arguments joined by a single space
    #[must_use]
    pub fn render(&self, os: OperatingSystemFamily, for_logging: bool) -> String {
        let mut out = String::new();
        for (index, argument) in self.arguments.iter().enumerate() {
            if index > 0 {
                out.push(' ');
            }
            argument.render_into(os, for_logging, &mut out);
        }
        out
    }
}

impl FromIterator<CmdLineArgument> for CmdLine {
    fn from_iter<T: IntoIterator<Item = CmdLineArgument>>(iter: T) -> Self {
        Self {
            arguments: iter.into_iter().collect(),
        }
    }
}

impl Extend<CmdLineArgument> for CmdLine {
    fn extend<T: IntoIterator<Item = CmdLineArgument>>(&mut self, iter: T) {
        self.arguments.extend(iter);
    }
}

impl<'a> IntoIterator for &'a CmdLine {
    type Item = &'a CmdLineArgument;
    type IntoIter = std::slice::Iter<'a, CmdLineArgument>;

    fn into_iter(self) -> Self::IntoIter {
        self.arguments.iter()
    }
}

/// Renders for Unix in logging mode; for diagnostics only
impl fmt::Display for CmdLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(OperatingSystemFamily::Unix, true))
    }
}

impl fmt::Debug for CmdLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.arguments).finish()
    }
}
