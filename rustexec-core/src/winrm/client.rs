//! Remote shell protocol engine
//!
//! Drives one command through a WinRM shell lifecycle:
//!
//! ```text
//! Idle -> ShellOpening -> ShellOpen -> CommandRunning -> Receiving (loop)
//!      -> Completed -> SignalSent -> Closed
//! ```
//!
//! Once the shell is open, teardown (terminate signal, then shell delete) is
//! attempted on every exit path. Teardown is best-effort: its failures are
//! logged and never replace the error that is already propagating.

use crate::error::{ExecError, ExecResult};
use crate::handler::OutputHandler;
use crate::lines::LineBuffer;
use crate::tracing::span_names;

use super::envelope::{EnvelopeSettings, OptionSet, RequestBody, WsAction, build_request};
use super::response::ResponseDocument;
use super::transport::Transport;

/// Lifecycle state of a shell session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Nothing sent yet
    #[default]
    Idle,
    /// Open-shell request in flight
    ShellOpening,
    /// Shell handle acquired
    ShellOpen,
    /// Run-command request in flight
    CommandRunning,
    /// Draining output chunks
    Receiving,
    /// Remote side reported completion
    Completed,
    /// Terminate signal attempted
    SignalSent,
    /// Shell delete attempted
    Closed,
}

/// Ephemeral state of one shell lifecycle
#[derive(Debug, Default)]
pub struct ShellSession {
    shell_id: Option<String>,
    command_id: Option<String>,
    chunk_index: u32,
    exit_code: Option<i32>,
    completed: bool,
    state: SessionState,
}

impl ShellSession {
    /// Returns the shell handle while the shell is open
    #[must_use]
    pub fn shell_id(&self) -> Option<&str> {
        self.shell_id.as_deref()
    }

    /// Returns the command handle while the command is alive
    #[must_use]
    pub fn command_id(&self) -> Option<&str> {
        self.command_id.as_deref()
    }

    /// Returns the number of receive exchanges that did not complete the command
    #[must_use]
    pub const fn chunk_index(&self) -> u32 {
        self.chunk_index
    }

    /// Returns the current lifecycle state
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }
}

/// WinRM client running one command at a time
///
/// A client owns its session state exclusively; concurrent callers must use
/// separate clients. The transport may be shared if it is safe to do so.
#[derive(Debug)]
pub struct WinRmClient<T: Transport> {
    transport: T,
    settings: EnvelopeSettings,
    session: ShellSession,
}

impl<T: Transport> WinRmClient<T> {
    /// Creates a client for the given transport and envelope settings
    #[must_use]
    pub fn new(transport: T, settings: EnvelopeSettings) -> Self {
        Self {
            transport,
            settings,
            session: ShellSession::default(),
        }
    }

    /// Returns the envelope settings
    #[must_use]
    pub const fn settings(&self) -> &EnvelopeSettings {
        &self.settings
    }

    /// Returns the session state of the last (or current) run
    #[must_use]
    pub const fn session(&self) -> &ShellSession {
        &self.session
    }

    /// Runs a rendered command line and delivers its output to `handler`
    ///
    /// Blocks until the remote side reports completion or the transport fails.
    /// Returns the exit code of the command.
    ///
    /// # Errors
    ///
    /// Returns `ExecError::Transport` if an exchange fails and
    /// `ExecError::Protocol` if a required response element is missing. Output
    /// delivered before the failure stays delivered.
    pub fn run_command(
        &mut self,
        command: &str,
        handler: &mut dyn OutputHandler,
    ) -> ExecResult<i32> {
        let span = crate::trace_operation!(
            span_names::WINRM_RUN_COMMAND,
            url = %self.settings.target_url
        );
        let _enter = span.enter();

        self.session = ShellSession::default();
        self.open_shell()?;

        {
            let scope = ShellScope { client: self };
            scope.client.start_command(command)?;
            scope.client.receive_output(handler)?;
        }

        self.exit_code()
    }

    /// Returns the exit code of the last completed command
    ///
    /// # Errors
    ///
    /// Returns `ExecError::Usage` if no command has completed yet.
    pub fn exit_code(&self) -> ExecResult<i32> {
        match (self.session.completed, self.session.exit_code) {
            (true, Some(code)) => Ok(code),
            _ => Err(ExecError::Usage(
                "Exit code is only available after the command has completed".to_string(),
            )),
        }
    }

    fn send(
        &self,
        action: WsAction,
        option_set: Option<OptionSet>,
        body: &RequestBody<'_>,
    ) -> ExecResult<ResponseDocument> {
        let request = build_request(
            &self.settings,
            action,
            self.session.shell_id.as_deref(),
            option_set,
            body,
        )?;
        let response = self.transport.send_message(&request, action)?;
        ResponseDocument::parse(&response)
    }

    fn open_shell(&mut self) -> ExecResult<()> {
        let _span = crate::trace_operation_debug!(span_names::WINRM_OPEN_SHELL).entered();
        self.session.state = SessionState::ShellOpening;

        let response = self.send(
            WsAction::Create,
            Some(OptionSet::OpenShell),
            &RequestBody::OpenShell,
        )?;
        let shell_id = response.shell_id()?;

        tracing::debug!(shell_id = %shell_id, "Shell opened");
        self.session.shell_id = Some(shell_id);
        self.session.state = SessionState::ShellOpen;
        Ok(())
    }

    fn start_command(&mut self, command: &str) -> ExecResult<()> {
        self.session.state = SessionState::CommandRunning;

        let payload = format!("\"{command}\"");
        let response = self.send(
            WsAction::Command,
            Some(OptionSet::RunCommand),
            &RequestBody::Command(&payload),
        )?;
        let command_id = response.command_id()?;

        tracing::debug!(
            shell_id = ?self.session.shell_id,
            command_id = %command_id,
            "Command started"
        );
        self.session.command_id = Some(command_id);
        Ok(())
    }

    fn receive_output(&mut self, handler: &mut dyn OutputHandler) -> ExecResult<()> {
        let _span = crate::trace_operation_debug!(span_names::WINRM_RECEIVE).entered();
        self.session.state = SessionState::Receiving;

        let command_id = self
            .session
            .command_id
            .clone()
            .ok_or_else(|| ExecError::Usage("No command is running".to_string()))?;

        let mut stdout = LineBuffer::default();
        let mut stderr = LineBuffer::default();

        loop {
            let response = self.send(
                WsAction::Receive,
                None,
                &RequestBody::Receive {
                    command_id: &command_id,
                },
            )?;

            stdout.push(&response.stream_bytes("stdout")?, |line| {
                handler.handle_output_line(line);
            });
            stderr.push(&response.stream_bytes("stderr")?, |line| {
                handler.handle_error_line(line);
            });

            if self.session.chunk_index == 0 {
                match response.exit_code() {
                    Ok(Some(code)) => {
                        tracing::debug!(exit_code = code, "Exit code present in first chunk");
                        self.session.exit_code = Some(code);
                    }
                    Ok(None) | Err(_) => tracing::debug!("No exit code in first chunk"),
                }
            }

            if response.is_done() {
                let code = response.exit_code()?.ok_or_else(|| {
                    ExecError::Protocol("Command finished without an ExitCode".to_string())
                })?;

                stdout.flush(|line| handler.handle_output_line(line));
                stderr.flush(|line| handler.handle_error_line(line));

                tracing::info!(
                    exit_code = code,
                    chunks = self.session.chunk_index + 1,
                    "Command completed"
                );
                self.session.exit_code = Some(code);
                self.session.completed = true;
                self.session.state = SessionState::Completed;
                return Ok(());
            }

            self.session.chunk_index += 1;
        }
    }

    fn teardown(&mut self) {
        let _span = crate::trace_operation_debug!(span_names::WINRM_TEARDOWN).entered();
        if self.session.shell_id.is_none() {
            return;
        }

        let command_id = self.session.command_id.take();
        if let Err(e) = self.send(
            WsAction::Signal,
            None,
            &RequestBody::Signal {
                command_id: command_id.as_deref(),
            },
        ) {
            tracing::warn!(
                command_id = ?command_id,
                error = %e,
                "Failed to signal command termination"
            );
        }
        self.session.state = SessionState::SignalSent;

        if let Err(e) = self.send(WsAction::Delete, None, &RequestBody::Empty) {
            tracing::warn!(
                shell_id = ?self.session.shell_id,
                error = %e,
                "Failed to close shell"
            );
        }
        self.session.shell_id = None;
        self.session.state = SessionState::Closed;
    }
}

/// Tears the shell down when dropped, on success and failure alike
struct ShellScope<'a, T: Transport> {
    client: &'a mut WinRmClient<T>,
}

impl<T: Transport> Drop for ShellScope<'_, T> {
    fn drop(&mut self) {
        self.client.teardown();
    }
}
