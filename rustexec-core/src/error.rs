//! Error types for `RustExec`
//!
//! Construction and composition problems surface as [`ExecError::InvalidArgument`]
//! and [`ExecError::InvalidConfiguration`] before any remote call is made.
//! Failures while talking to the remote side are either a [`ExecError::Protocol`]
//! (the response was missing something we require) or a [`ExecError::Transport`]
//! (the exchange itself failed).

use thiserror::Error;

/// Errors raised by a transport while exchanging a single request/response
#[derive(Debug, Error)]
pub enum TransportError {
    /// The HTTP client failed to send the request or read the response
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The remote endpoint answered with a non-success status
    #[error("Unexpected HTTP status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, usually a SOAP fault
        body: String,
    },

    /// A local process backing the transport could not be started
    #[error("Failed to spawn {program}: {reason}")]
    Spawn {
        /// Program that failed to start
        program: String,
        /// Underlying reason
        reason: String,
    },

    /// I/O error on the underlying channel
    #[error("Transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other failure reported by a transport implementation
    #[error("{0}")]
    Other(String),
}

/// Top-level error type for command execution
#[derive(Debug, Error)]
pub enum ExecError {
    /// Malformed command line construction input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Connection settings failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A required element was absent from a remote response
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The underlying send/receive exchange failed
    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    /// An API was used out of order (e.g. reading an exit code too early)
    #[error("Usage error: {0}")]
    Usage(String),

    /// Local I/O error (configuration files, output streams)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExecError {
    /// Returns true if this error was raised before any remote call could be made
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument(_) | Self::InvalidConfiguration(_)
        )
    }

    /// Returns true if this error came from the remote side or the channel to it
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Protocol(_) | Self::Transport(_))
    }
}

/// Result type for command execution
pub type ExecResult<T> = Result<T, ExecError>;

/// Errors raised while loading or saving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse a configuration file
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// Failed to serialize configuration
    #[error("Failed to serialize configuration: {0}")]
    Serialize(String),

    /// Configuration directory could not be determined
    #[error("Configuration directory not found")]
    NoConfigDir,

    /// Profile lookup failed
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    /// A profile failed validation
    #[error("Invalid profile: {0}")]
    Validation(String),

    /// I/O error while accessing configuration files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
