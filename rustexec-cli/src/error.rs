//! CLI error types and exit codes.

use rustexec_core::{ConfigError, ExecError};

/// Exit codes for CLI operations
pub mod exit_codes {
    /// General error - configuration, validation, or other local errors
    pub const GENERAL_ERROR: i32 = 1;
    /// Connection failure - the remote host could not be reached or answered
    /// with something unusable
    pub const CONNECTION_FAILURE: i32 = 2;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Profile not found
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    /// Command line or connection settings rejected before connecting
    #[error("Invalid input: {0}")]
    Invalid(String),

    /// Remote protocol or transport failure
    #[error("Connection error: {0}")]
    Connection(String),

    /// Output formatting error
    #[error("Output error: {0}")]
    Output(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ProfileNotFound(name) => Self::ProfileNotFound(name),
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config(other.to_string()),
        }
    }
}

impl From<ExecError> for CliError {
    fn from(err: ExecError) -> Self {
        if err.is_remote() {
            return Self::Connection(err.to_string());
        }
        match err {
            ExecError::Io(e) => Self::Io(e),
            other => Self::Invalid(other.to_string()),
        }
    }
}

impl CliError {
    /// Returns the appropriate exit code for this error type.
    ///
    /// Exit codes:
    /// - 1: General error (configuration, validation, output, IO)
    /// - 2: Connection failure (transport or protocol error)
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Connection(_) => exit_codes::CONNECTION_FAILURE,
            Self::Config(_)
            | Self::ProfileNotFound(_)
            | Self::Invalid(_)
            | Self::Output(_)
            | Self::Io(_) => exit_codes::GENERAL_ERROR,
        }
    }
}
