//! SSH connection bound to a profile

use std::io::{self, Read};
use std::sync::mpsc::{self, Sender};
use std::thread;

use secrecy::SecretString;

use crate::cmdline::CmdLine;
use crate::compose::{ComposedCommand, ConnectionContext, compose};
use crate::config::{Profile, ProtocolSettings};
use crate::error::{ExecError, ExecResult};
use crate::handler::OutputHandler;
use crate::lines::LineBuffer;
use crate::tracing::span_names;

use super::process::{
    LaunchRequest, ProcessLauncher, ProcessStreams, SshTarget, SystemSshLauncher,
};

const READ_BUFFER_SIZE: usize = 8192;

enum StreamLine {
    Output(String),
    Error(String),
}

/// Runs composed commands on a remote host through a launched process
#[derive(Debug)]
pub struct SshConnection<L: ProcessLauncher> {
    launcher: L,
    target: SshTarget,
    context: ConnectionContext,
    password: Option<SecretString>,
}

impl<L: ProcessLauncher> SshConnection<L> {
    /// Creates a connection
    #[must_use]
    pub const fn new(launcher: L, target: SshTarget, context: ConnectionContext) -> Self {
        Self {
            launcher,
            target,
            context,
            password: None,
        }
    }

    /// Sets the login password handed to the launcher
    #[must_use]
    pub fn with_login_password(mut self, password: SecretString) -> Self {
        self.password = Some(password);
        self
    }

    /// Returns the remote endpoint
    #[must_use]
    pub const fn target(&self) -> &SshTarget {
        &self.target
    }

    /// Returns the composition context
    #[must_use]
    pub const fn context(&self) -> &ConnectionContext {
        &self.context
    }

    /// Composes a command for this connection without running it
    ///
    /// # Errors
    ///
    /// Returns `ExecError::InvalidConfiguration` if composition fails.
    pub fn compose(&self, command: &CmdLine) -> ExecResult<ComposedCommand> {
        compose(command, &self.context)
    }

    /// Runs a command and returns its exit code
    ///
    /// Composition happens before anything is launched, so configuration
    /// errors never start a process. When the composed command carries a
    /// prompt responder, standard output is scanned and the answer is
    /// written to standard input.
    ///
    /// # Errors
    ///
    /// Returns `ExecError::InvalidArgument` for an empty command line,
    /// composition errors, `ExecError::Transport` if the process cannot be
    /// started or waited for, and `ExecError::Io` if reading its output fails.
    pub fn execute(&self, command: &CmdLine, handler: &mut dyn OutputHandler) -> ExecResult<i32> {
        if command.is_empty() {
            return Err(ExecError::InvalidArgument(
                "Cannot execute an empty command line".to_string(),
            ));
        }

        let _span = crate::trace_operation!(
            span_names::SSH_EXECUTE,
            host = %self.target.host,
            port = self.target.port
        )
        .entered();

        let composed = self.compose(command)?;
        let os = self.context.os;
        let remote_command = composed.command.render(os, false);

        tracing::info!(
            command = %composed.command.render(os, true),
            pty = composed.requires_pty(),
            "Executing over SSH"
        );

        let request = LaunchRequest {
            target: &self.target,
            pty: composed.pty.as_ref(),
            password: self.password.as_ref(),
            interactive: composed.prompt_responder.is_some(),
            command: &remote_command,
        };
        let mut process = self.launcher.launch(&request)?;
        let ProcessStreams {
            stdin,
            stdout,
            stderr,
        } = process.take_streams()?;

        let stdout: Box<dyn Read + Send> = match &composed.prompt_responder {
            Some(responder) => Box::new(responder.wrap(stdout, stdin)),
            None => {
                drop(stdin);
                stdout
            }
        };

        let pumped = pump_output(stdout, stderr, handler);
        let exit_code = process.wait()?;
        pumped?;

        tracing::info!(exit_code, "SSH command completed");
        Ok(exit_code)
    }
}

impl SshConnection<SystemSshLauncher> {
    /// Creates a connection through the system `ssh` client from an SSH
    /// profile
    ///
    /// # Errors
    ///
    /// Returns `ExecError::InvalidConfiguration` if the profile is not an
    /// SSH profile.
    pub fn from_profile(profile: &Profile) -> ExecResult<Self> {
        let ProtocolSettings::Ssh(ssh) = &profile.protocol else {
            return Err(ExecError::InvalidConfiguration(format!(
                "Profile '{}' is not an SSH profile",
                profile.name
            )));
        };

        let mut target = SshTarget::new(profile.host.clone(), profile.username.clone())
            .with_port(profile.effective_port());
        target.identity_file = ssh.identity_path();

        let mut connection =
            Self::new(SystemSshLauncher::new(), target, profile.connection_context());
        connection.password.clone_from(&profile.password);
        Ok(connection)
    }
}

/// Reads both streams on scoped threads and delivers their lines to
/// `handler` on the calling thread, in arrival order
fn pump_output(
    stdout: Box<dyn Read + Send>,
    stderr: Box<dyn Read + Send>,
    handler: &mut dyn OutputHandler,
) -> ExecResult<()> {
    let (sender, receiver) = mpsc::channel();

    thread::scope(|scope| -> ExecResult<()> {
        let out_sender = sender.clone();
        let out = scope.spawn(move || read_lines(stdout, &out_sender, StreamLine::Output));
        let err = scope.spawn(move || read_lines(stderr, &sender, StreamLine::Error));

        for line in receiver {
            match line {
                StreamLine::Output(line) => handler.handle_output_line(&line),
                StreamLine::Error(line) => handler.handle_error_line(&line),
            }
        }

        for reader in [out, err] {
            reader
                .join()
                .map_err(|_| io::Error::other("output reader thread panicked"))??;
        }
        Ok(())
    })
}

fn read_lines(
    mut reader: impl Read,
    sender: &Sender<StreamLine>,
    wrap: fn(String) -> StreamLine,
) -> io::Result<()> {
    let mut buffer = LineBuffer::default();
    let mut chunk = [0u8; READ_BUFFER_SIZE];
    let mut send = |line: &str| {
        // The receiver outlives both readers
        let _ = sender.send(wrap(line.to_string()));
    };

    loop {
        let n = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        buffer.push(&chunk[..n], &mut send);
    }
    buffer.flush(&mut send);
    Ok(())
}
