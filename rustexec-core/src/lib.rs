//! `RustExec` Core Library
//!
//! Runs commands on remote hosts over WinRM and SSH.
//!
//! # Crate Structure
//!
//! - [`cmdline`] - Typed command line arguments and per-OS rendering
//! - [`compose`] - Working directory, escalation prefix and PTY policy
//! - [`automation`] - Password prompt detection and response
//! - [`winrm`] - WS-Management remote shell lifecycle and HTTP transport
//! - [`ssh`] - Process-backed SSH execution
//! - [`executor`] - Protocol-independent executor trait and registry
//! - [`config`] - Connection profiles and persistence
//! - [`handler`] - Output handlers
//! - [`tracing`] - Structured logging setup

// Enable missing_docs warning for public API documentation
#![warn(missing_docs)]

pub mod automation;
pub mod cmdline;
pub mod compose;
pub mod config;
pub mod error;
pub mod executor;
pub mod handler;
mod lines;
pub mod ssh;
pub mod tracing;
pub mod winrm;

pub use automation::{PromptPattern, PromptResponder, PromptScanningReader};
pub use cmdline::{ArgumentKind, CmdLine, CmdLineArgument, OperatingSystemFamily};
pub use compose::{ComposedCommand, ConnectionContext, SshConnectionType, compose};
pub use config::{ConfigManager, Profile, ProtocolSettings};
pub use error::{ConfigError, ConfigResult, ExecError, ExecResult, TransportError};
pub use executor::{ExecutorRegistry, RemoteExecutor};
pub use handler::{
    CapturedLine, CapturingOutputHandler, LoggingOutputHandler, OutputHandler,
    StreamingOutputHandler,
};
pub use ssh::SshConnection;
pub use tracing::{
    TracingConfig, TracingError, TracingLevel, TracingOutput, init_tracing,
    is_tracing_initialized,
};
pub use winrm::{WinRmClient, WinRmConnection};
