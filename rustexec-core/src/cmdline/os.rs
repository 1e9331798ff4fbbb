//! Target operating system families

use serde::{Deserialize, Serialize};

/// Operating system family of a remote host
///
/// The family decides how command line arguments are escaped and which
/// separator chains two commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingSystemFamily {
    /// Windows hosts (`cmd.exe` quoting rules)
    Windows,
    /// Unix and Unix-like hosts
    #[default]
    Unix,
    /// z/OS Unix System Services
    Zos,
}

impl OperatingSystemFamily {
    /// Returns the token used to run one command after another
    #[must_use]
    pub const fn command_separator(self) -> &'static str {
        match self {
            Self::Windows => "&&",
            Self::Unix | Self::Zos => ";",
        }
    }

    /// Returns the path separator
    #[must_use]
    pub const fn file_separator(self) -> &'static str {
        match self {
            Self::Windows => "\\",
            Self::Unix | Self::Zos => "/",
        }
    }

    /// Returns true for the Windows family
    #[must_use]
    pub const fn is_windows(self) -> bool {
        matches!(self, Self::Windows)
    }
}

impl std::str::FromStr for OperatingSystemFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "windows" => Ok(Self::Windows),
            "unix" => Ok(Self::Unix),
            "zos" => Ok(Self::Zos),
            other => Err(format!("unknown operating system family '{other}'")),
        }
    }
}

impl std::fmt::Display for OperatingSystemFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Windows => write!(f, "windows"),
            Self::Unix => write!(f, "unix"),
            Self::Zos => write!(f, "zos"),
        }
    }
}
