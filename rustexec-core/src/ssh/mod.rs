//! SSH remote execution
//!
//! [`SshConnection`] composes a command, launches a local process that
//! carries it to the remote host, and delivers the process output to an
//! output handler. The process is abstracted behind [`ProcessLauncher`] and
//! [`DuplexProcess`]; [`SystemSshLauncher`] uses the system `ssh` client.

mod connection;
mod process;

pub use connection::SshConnection;
pub use process::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_SSH_PROGRAM, DuplexProcess, LaunchRequest,
    ProcessLauncher, ProcessStreams, SSH_FAILURE_EXIT_CODE, SshTarget, SystemSshLauncher,
};
