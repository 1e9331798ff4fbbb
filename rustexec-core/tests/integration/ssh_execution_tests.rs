//! Integration tests for SSH execution through a scripted launcher

use std::io::{self, Cursor, Read, Write};
use std::sync::{Arc, Mutex};

use rustexec_core::compose::{EscalationSettings, SshConnectionType};
use rustexec_core::ssh::{DuplexProcess, LaunchRequest, ProcessLauncher, ProcessStreams, SshTarget};
use rustexec_core::{
    CapturingOutputHandler, CmdLine, ConnectionContext, ExecError, ExecResult,
    OperatingSystemFamily, RemoteExecutor, SshConnection,
};
use secrecy::SecretString;

/// Input stream whose bytes stay visible to the test
#[derive(Clone, Default)]
struct RecordedInput(Arc<Mutex<Vec<u8>>>);

impl RecordedInput {
    fn contents(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }
}

impl Write for RecordedInput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Output stream returned in fixed-size pieces
struct Trickle {
    data: Cursor<Vec<u8>>,
    piece: usize,
}

impl Read for Trickle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len = buf.len().min(self.piece);
        self.data.read(&mut buf[..len])
    }
}

struct ScriptedProcess {
    streams: Option<ProcessStreams>,
    exit_code: i32,
}

impl DuplexProcess for ScriptedProcess {
    fn take_streams(&mut self) -> ExecResult<ProcessStreams> {
        self.streams
            .take()
            .ok_or_else(|| ExecError::Usage("streams taken".to_string()))
    }

    fn wait(&mut self) -> ExecResult<i32> {
        Ok(self.exit_code)
    }
}

#[derive(Default)]
struct ScriptedLauncher {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    piece: usize,
    exit_code: i32,
    input: RecordedInput,
    commands: Mutex<Vec<String>>,
}

impl ProcessLauncher for ScriptedLauncher {
    fn launch(&self, request: &LaunchRequest<'_>) -> ExecResult<Box<dyn DuplexProcess>> {
        self.commands
            .lock()
            .unwrap()
            .push(request.command.to_string());
        Ok(Box::new(ScriptedProcess {
            streams: Some(ProcessStreams {
                stdin: Box::new(self.input.clone()),
                stdout: Box::new(Trickle {
                    data: Cursor::new(self.stdout.clone()),
                    piece: self.piece.max(1),
                }),
                stderr: Box::new(Cursor::new(self.stderr.clone())),
            }),
            exit_code: self.exit_code,
        }))
    }
}

fn interactive_sudo(prompt: &str) -> ConnectionContext {
    ConnectionContext::new(OperatingSystemFamily::Unix)
        .with_connection_type(SshConnectionType::InteractiveSudo)
        .with_escalation(EscalationSettings::new("root").with_password_prompt_regex(prompt))
        .with_password(SecretString::from("correct horse"))
}

#[test]
fn test_prompt_split_across_reads_is_answered_once() {
    let launcher = ScriptedLauncher {
        stdout: b"Password: \nok\nPassword: \n".to_vec(),
        piece: 7,
        ..ScriptedLauncher::default()
    };
    let connection = SshConnection::new(
        &launcher,
        SshTarget::new("db01", "deploy"),
        interactive_sudo("Password:"),
    );

    let mut handler = CapturingOutputHandler::new();
    let code = connection
        .execute(&CmdLine::build(["systemctl", "restart", "postgresql"]), &mut handler)
        .unwrap();

    assert_eq!(code, 0);
    assert_eq!(launcher.input.contents(), b"correct horse\r\n");
    assert_eq!(handler.output_lines(), vec!["Password: ", "ok", "Password: "]);
}

#[test]
fn test_wildcard_prompt_fails_before_launch() {
    for prompt in ["[Pp]assword.*", "Password:?"] {
        let launcher = ScriptedLauncher::default();
        let connection = SshConnection::new(
            &launcher,
            SshTarget::new("db01", "deploy"),
            interactive_sudo(prompt),
        );

        let mut handler = CapturingOutputHandler::new();
        let err = connection
            .execute(&CmdLine::build(["id"]), &mut handler)
            .unwrap_err();

        assert!(matches!(err, ExecError::InvalidConfiguration(_)));
        assert!(err.is_validation());
        assert!(launcher.commands.lock().unwrap().is_empty());
    }
}

#[test]
fn test_quoted_sudo_with_working_directory() {
    let launcher = ScriptedLauncher {
        stdout: b"done\n".to_vec(),
        ..ScriptedLauncher::default()
    };
    let context = ConnectionContext::new(OperatingSystemFamily::Unix)
        .with_working_directory("/opt/app")
        .with_connection_type(SshConnectionType::Sudo)
        .with_escalation(
            EscalationSettings::new("app")
                .with_command_prefix("sudo -u {0} sh -c")
                .with_quote_command(true),
        );
    let connection = SshConnection::new(&launcher, SshTarget::new("web01", "deploy"), context);

    let mut handler = CapturingOutputHandler::new();
    connection
        .execute(&CmdLine::build(["./run.sh", "--env", "prod"]), &mut handler)
        .unwrap();

    let commands = launcher.commands.lock().unwrap();
    assert_eq!(
        commands[0],
        "cd /opt/app ; sudo -u app sh -c ./run.sh\\ --env\\ prod"
    );
}

#[test]
fn test_exit_code_and_stderr_through_trait_object() {
    let launcher = ScriptedLauncher {
        stdout: b"partial".to_vec(),
        stderr: b"no such file\n".to_vec(),
        exit_code: 2,
        ..ScriptedLauncher::default()
    };
    let connection = SshConnection::new(
        &launcher,
        SshTarget::new("web01", "deploy"),
        ConnectionContext::new(OperatingSystemFamily::Unix),
    );
    let executor: &dyn RemoteExecutor = &connection;

    let mut handler = CapturingOutputHandler::new();
    let code = executor
        .execute(&CmdLine::build(["cat", "missing"]), &mut handler)
        .unwrap();

    assert_eq!(executor.protocol_id(), "ssh");
    assert_eq!(code, 2);
    assert_eq!(handler.output_lines(), vec!["partial"]);
    assert_eq!(handler.error_lines(), vec!["no such file"]);
}
