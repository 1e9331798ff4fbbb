//! Local processes backing an SSH session

use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

use secrecy::{ExposeSecret, SecretString};

use crate::compose::PtyRequest;
use crate::config::SSH_PORT;
use crate::error::{ExecError, ExecResult, TransportError};

/// Default program used to reach the remote host
pub const DEFAULT_SSH_PROGRAM: &str = "ssh";

/// Default connection timeout passed to `ssh` (seconds)
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Exit code `ssh` uses for its own failures
pub const SSH_FAILURE_EXIT_CODE: i32 = 255;

/// Where and as whom to log in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    /// Host name or address
    pub host: String,
    /// Port
    pub port: u16,
    /// Login user
    pub username: String,
    /// Private key file
    pub identity_file: Option<PathBuf>,
}

impl SshTarget {
    /// Creates a target on the default port without an identity file
    #[must_use]
    pub fn new(host: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: SSH_PORT,
            username: username.into(),
            identity_file: None,
        }
    }

    /// Sets the port
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the identity file
    #[must_use]
    pub fn with_identity_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.identity_file = Some(path.into());
        self
    }

    /// Returns `user@host`
    #[must_use]
    pub fn destination(&self) -> String {
        format!("{}@{}", self.username, self.host)
    }
}

/// Everything a launcher needs to start one remote command
#[derive(Debug, Clone, Copy)]
pub struct LaunchRequest<'a> {
    /// Remote endpoint
    pub target: &'a SshTarget,
    /// Pseudo-terminal to request
    pub pty: Option<&'a PtyRequest>,
    /// Login password, if the profile has one
    pub password: Option<&'a SecretString>,
    /// True when something will answer prompts on the process input
    pub interactive: bool,
    /// Rendered remote command
    pub command: &'a str,
}

/// The three standard streams of a launched process
pub struct ProcessStreams {
    /// Process input
    pub stdin: Box<dyn Write + Send>,
    /// Process output
    pub stdout: Box<dyn Read + Send>,
    /// Process error output
    pub stderr: Box<dyn Read + Send>,
}

impl std::fmt::Debug for ProcessStreams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessStreams").finish_non_exhaustive()
    }
}

/// A running process with a readable output and a writable input
pub trait DuplexProcess: Send {
    /// Takes the standard streams; callable once
    ///
    /// # Errors
    ///
    /// Returns `ExecError::Usage` if the streams were already taken.
    fn take_streams(&mut self) -> ExecResult<ProcessStreams>;

    /// Waits for the process to exit and returns its exit code
    ///
    /// # Errors
    ///
    /// Returns `ExecError::Transport` if waiting fails.
    fn wait(&mut self) -> ExecResult<i32>;
}

/// Starts the local process that carries a remote command
pub trait ProcessLauncher {
    /// Launches a process for `request`
    ///
    /// # Errors
    ///
    /// Returns `ExecError::Transport` if the process cannot be started.
    fn launch(&self, request: &LaunchRequest<'_>) -> ExecResult<Box<dyn DuplexProcess>>;
}

impl<L: ProcessLauncher + ?Sized> ProcessLauncher for &L {
    fn launch(&self, request: &LaunchRequest<'_>) -> ExecResult<Box<dyn DuplexProcess>> {
        (**self).launch(request)
    }
}

impl<L: ProcessLauncher + ?Sized> ProcessLauncher for Box<L> {
    fn launch(&self, request: &LaunchRequest<'_>) -> ExecResult<Box<dyn DuplexProcess>> {
        (**self).launch(request)
    }
}

/// Launches the system `ssh` client
///
/// A login password is handed to `sshpass -e` through the `SSHPASS`
/// environment variable when `sshpass` is installed. Without a password and
/// without a prompt responder, `ssh` runs in batch mode so it never waits
/// for input nobody will send.
#[derive(Debug, Clone)]
pub struct SystemSshLauncher {
    program: String,
    connect_timeout_secs: u64,
}

impl Default for SystemSshLauncher {
    fn default() -> Self {
        Self {
            program: DEFAULT_SSH_PROGRAM.to_string(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl SystemSshLauncher {
    /// Creates a launcher for the `ssh` found on `PATH`
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a different `ssh` executable
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Sets the connection timeout in seconds
    #[must_use]
    pub const fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    fn sshpass_available() -> bool {
        Command::new("sshpass")
            .arg("-V")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
    }

    fn command(&self, request: &LaunchRequest<'_>, use_sshpass: bool) -> Command {
        let mut cmd = if use_sshpass {
            let mut cmd = Command::new("sshpass");
            cmd.arg("-e").arg(&self.program);
            if let Some(password) = request.password {
                cmd.env("SSHPASS", password.expose_secret());
            }
            cmd
        } else {
            Command::new(&self.program)
        };

        if !use_sshpass && !request.interactive {
            cmd.arg("-o").arg("BatchMode=yes");
        }
        cmd.arg("-o").arg("StrictHostKeyChecking=accept-new");
        cmd.arg("-o")
            .arg(format!("ConnectTimeout={}", self.connect_timeout_secs));

        if let Some(pty) = request.pty {
            cmd.arg("-tt");
            // ssh forwards the local TERM in its pty request
            if let Some(term) = pty.term() {
                cmd.env("TERM", term);
            }
        } else {
            cmd.arg("-T");
        }

        if request.target.port != SSH_PORT {
            cmd.arg("-p").arg(request.target.port.to_string());
        }
        if let Some(key) = &request.target.identity_file {
            cmd.arg("-i").arg(key);
        }

        cmd.arg(request.target.destination());
        cmd.arg(request.command);

        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

impl ProcessLauncher for SystemSshLauncher {
    fn launch(&self, request: &LaunchRequest<'_>) -> ExecResult<Box<dyn DuplexProcess>> {
        let use_sshpass = request.password.is_some() && Self::sshpass_available();
        let mut cmd = self.command(request, use_sshpass);
        let program = cmd.get_program().to_string_lossy().into_owned();

        tracing::debug!(
            program = %program,
            destination = %request.target.destination(),
            port = request.target.port,
            pty = request.pty.is_some(),
            "Launching SSH process"
        );

        let child = cmd.spawn().map_err(|e| TransportError::Spawn {
            program,
            reason: e.to_string(),
        })?;
        Ok(Box::new(ChildProcess { child }))
    }
}

/// A spawned `ssh` child process
#[derive(Debug)]
struct ChildProcess {
    child: Child,
}

impl DuplexProcess for ChildProcess {
    fn take_streams(&mut self) -> ExecResult<ProcessStreams> {
        match (
            self.child.stdin.take(),
            self.child.stdout.take(),
            self.child.stderr.take(),
        ) {
            (Some(stdin), Some(stdout), Some(stderr)) => Ok(ProcessStreams {
                stdin: Box::new(stdin),
                stdout: Box::new(stdout),
                stderr: Box::new(stderr),
            }),
            _ => Err(ExecError::Usage(
                "Process streams were already taken".to_string(),
            )),
        }
    }

    fn wait(&mut self) -> ExecResult<i32> {
        let status = self.child.wait().map_err(TransportError::Io)?;
        match status.code() {
            Some(code) => {
                if code == SSH_FAILURE_EXIT_CODE {
                    tracing::warn!("ssh exited with 255, the connection itself may have failed");
                }
                Ok(code)
            }
            None => Err(ExecError::Transport(TransportError::Other(format!(
                "ssh was terminated by a signal ({status})"
            )))),
        }
    }
}
