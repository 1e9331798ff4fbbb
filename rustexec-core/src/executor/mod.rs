//! Protocol-independent remote execution
//!
//! [`RemoteExecutor`] is the common face of WinRM and SSH connections.
//! [`ExecutorRegistry`] builds the right executor for a profile.

mod registry;

pub use registry::{ExecutorConstructor, ExecutorRegistry};

use crate::cmdline::{CmdLine, OperatingSystemFamily};
use crate::compose::ComposedCommand;
use crate::error::ExecResult;
use crate::handler::OutputHandler;
use crate::ssh::{ProcessLauncher, SshConnection};
use crate::winrm::{Transport, WinRmConnection};

/// Runs command lines on one remote host
pub trait RemoteExecutor {
    /// Returns the protocol identifier (e.g., "winrm", "ssh")
    fn protocol_id(&self) -> &'static str;

    /// Returns the operating system family of the remote host
    fn os(&self) -> OperatingSystemFamily;

    /// Composes a command without running it
    ///
    /// # Errors
    ///
    /// Returns `ExecError::InvalidConfiguration` if composition fails.
    fn compose(&self, command: &CmdLine) -> ExecResult<ComposedCommand>;

    /// Runs a command, delivering its output to `handler`, and returns the
    /// remote exit code
    ///
    /// # Errors
    ///
    /// Returns composition errors before anything is sent, and transport or
    /// protocol errors from the remote exchange.
    fn execute(&self, command: &CmdLine, handler: &mut dyn OutputHandler) -> ExecResult<i32>;
}

impl<T: Transport> RemoteExecutor for WinRmConnection<T> {
    fn protocol_id(&self) -> &'static str {
        "winrm"
    }

    fn os(&self) -> OperatingSystemFamily {
        self.context().os
    }

    fn compose(&self, command: &CmdLine) -> ExecResult<ComposedCommand> {
        Self::compose(self, command)
    }

    fn execute(&self, command: &CmdLine, handler: &mut dyn OutputHandler) -> ExecResult<i32> {
        Self::execute(self, command, handler)
    }
}

impl<L: ProcessLauncher> RemoteExecutor for SshConnection<L> {
    fn protocol_id(&self) -> &'static str {
        "ssh"
    }

    fn os(&self) -> OperatingSystemFamily {
        self.context().os
    }

    fn compose(&self, command: &CmdLine) -> ExecResult<ComposedCommand> {
        Self::compose(self, command)
    }

    fn execute(&self, command: &CmdLine, handler: &mut dyn OutputHandler) -> ExecResult<i32> {
        Self::execute(self, command, handler)
    }
}
