//! Structured logging for remote execution
//!
//! Spans cover the protocol lifecycle (shell open, receive loop, teardown)
//! and the SSH launch. Command text only ever reaches a span in its logging
//! rendering, with secrets masked.
//!
//! The subscriber is installed once per process with [`init_tracing`]. The
//! `RUSTEXEC_LOG` environment variable, when set, replaces the level-derived
//! filter with its own directives.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding filter directives
pub const LOG_ENV_VAR: &str = "RUSTEXEC_LOG";

/// Crates whose events the level-derived filter lets through
const LOG_TARGETS: [&str; 2] = ["rustexec_core", "rustexec"];

static INSTALLED: OnceLock<TracingConfig> = OnceLock::new();

/// Errors raised while installing the subscriber
#[derive(Debug, Error)]
pub enum TracingError {
    /// A subscriber is already installed
    #[error("Tracing has already been initialized")]
    AlreadyInitialized,

    /// Filter directives could not be parsed
    #[error("Invalid log filter '{directives}': {reason}")]
    InvalidFilter {
        /// Directives as given
        directives: String,
        /// Parser message
        reason: String,
    },

    /// The log file could not be opened
    #[error("Failed to open log file {path}: {source}")]
    LogFile {
        /// Log file path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The global subscriber could not be set
    #[error("Failed to install subscriber: {0}")]
    InitializationFailed(String),
}

/// Result type for tracing setup
pub type TracingResult<T> = Result<T, TracingError>;

/// Verbosity of the installed subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum TracingLevel {
    /// Only errors
    Error,
    /// Errors and warnings, including teardown failures
    #[default]
    Warn,
    /// Adds lifecycle events and remote output lines
    Info,
    /// Adds shell and command handles
    Debug,
    /// Adds every exchanged request
    Trace,
}

impl TracingLevel {
    /// Maps `-v` repetitions and `-q` to a level
    ///
    /// Quiet wins over any verbosity.
    #[must_use]
    pub const fn from_verbosity(verbose: u8, quiet: bool) -> Self {
        if quiet {
            return Self::Error;
        }
        match verbose {
            0 => Self::Warn,
            1 => Self::Info,
            2 => Self::Debug,
            _ => Self::Trace,
        }
    }

    /// Returns the directive name of the level
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl std::str::FromStr for TracingLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

impl std::fmt::Display for TracingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where log events are written
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TracingOutput {
    /// Standard error, leaving stdout to remote output
    #[default]
    Stderr,
    /// Standard output
    Stdout,
    /// A file, appended to
    File {
        /// Path to the log file
        path: PathBuf,
    },
}

/// Subscriber settings
#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    /// Level applied to this workspace's crates
    pub level: TracingLevel,
    /// Output destination
    pub output: TracingOutput,
    /// Explicit filter directives; take precedence over `RUSTEXEC_LOG`
    pub filter: Option<String>,
}

impl TracingConfig {
    /// Creates a configuration with the default level and stderr output
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the level
    #[must_use]
    pub const fn with_level(mut self, level: TracingLevel) -> Self {
        self.level = level;
        self
    }

    /// Sets the output destination
    #[must_use]
    pub fn with_output(mut self, output: TracingOutput) -> Self {
        self.output = output;
        self
    }

    /// Sets explicit filter directives
    #[must_use]
    pub fn with_filter(mut self, directives: impl Into<String>) -> Self {
        self.filter = Some(directives.into());
        self
    }

    /// Returns the directives the subscriber will use
    ///
    /// Explicit directives win, then `env_directives`, then the level applied
    /// to this workspace's crates.
    fn directives(&self, env_directives: Option<String>) -> String {
        if let Some(ref explicit) = self.filter {
            return explicit.clone();
        }
        if let Some(from_env) = env_directives.filter(|d| !d.trim().is_empty()) {
            return from_env;
        }
        LOG_TARGETS
            .iter()
            .map(|target| format!("{target}={}", self.level))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn env_filter(&self, env_directives: Option<String>) -> TracingResult<EnvFilter> {
        let directives = self.directives(env_directives);
        EnvFilter::try_new(&directives).map_err(|e| TracingError::InvalidFilter {
            reason: e.to_string(),
            directives,
        })
    }

    fn writer(&self) -> TracingResult<(BoxMakeWriter, bool)> {
        match self.output {
            TracingOutput::Stderr => Ok((BoxMakeWriter::new(std::io::stderr), true)),
            TracingOutput::Stdout => Ok((BoxMakeWriter::new(std::io::stdout), true)),
            TracingOutput::File { ref path } => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|source| TracingError::LogFile {
                        path: path.clone(),
                        source,
                    })?;
                Ok((BoxMakeWriter::new(Mutex::new(file)), false))
            }
        }
    }
}

/// Installs the global subscriber
///
/// Only the first call in a process can succeed.
///
/// # Errors
///
/// Returns an error if:
/// - A subscriber was already installed through this function
/// - The filter directives are invalid
/// - The log file cannot be opened
/// - Another global subscriber is already set
pub fn init_tracing(config: &TracingConfig) -> TracingResult<()> {
    if INSTALLED.set(config.clone()).is_err() {
        return Err(TracingError::AlreadyInitialized);
    }

    let filter = config.env_filter(std::env::var(LOG_ENV_VAR).ok())?;
    let (writer, ansi) = config.writer()?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_ansi(ansi)
                .with_writer(writer),
        )
        .try_init()
        .map_err(|e| TracingError::InitializationFailed(e.to_string()))?;

    tracing::debug!(level = %config.level, output = ?config.output, "Tracing initialized");
    Ok(())
}

/// Returns true once [`init_tracing`] has been called
#[must_use]
pub fn is_tracing_initialized() -> bool {
    INSTALLED.get().is_some()
}

/// Opens an info-level span named after one of [`span_names`]
///
/// ```ignore
/// let _span = trace_operation!(span_names::SSH_EXECUTE, host = %host).entered();
/// ```
#[macro_export]
macro_rules! trace_operation {
    ($name:expr) => {
        tracing::info_span!($name)
    };
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}

/// Debug-level variant of `trace_operation!` for inner protocol steps
#[macro_export]
macro_rules! trace_operation_debug {
    ($name:expr) => {
        tracing::debug_span!($name)
    };
    ($name:expr, $($field:tt)*) => {
        tracing::debug_span!($name, $($field)*)
    };
}

/// Span names
pub mod span_names {
    /// Full WinRM command lifecycle
    pub const WINRM_RUN_COMMAND: &str = "winrm.run_command";
    /// Open-shell exchange
    pub const WINRM_OPEN_SHELL: &str = "winrm.open_shell";
    /// Receive loop
    pub const WINRM_RECEIVE: &str = "winrm.receive";
    /// Signal and delete exchanges
    pub const WINRM_TEARDOWN: &str = "winrm.teardown";
    /// SSH process launch and wait
    pub const SSH_EXECUTE: &str = "ssh.execute";
    /// Command composition
    pub const COMMAND_COMPOSE: &str = "command.compose";
    /// Profile load
    pub const CONFIG_LOAD: &str = "config.load";
    /// Profile save
    pub const CONFIG_SAVE: &str = "config.save";
}

/// Field names shared by spans and events
pub mod field_names {
    /// Profile name
    pub const PROFILE: &str = "profile";
    /// Protocol id
    pub const PROTOCOL: &str = "protocol";
    /// Remote host
    pub const HOST: &str = "host";
    /// Remote port
    pub const PORT: &str = "port";
    /// WinRM shell handle
    pub const SHELL_ID: &str = "shell_id";
    /// WinRM command handle
    pub const COMMAND_ID: &str = "command_id";
    /// Remote exit code
    pub const EXIT_CODE: &str = "exit_code";
    /// Logging rendering of a command line
    pub const COMMAND: &str = "command";
}
