//! Integration tests for the WinRM shell lifecycle
//!
//! A scripted transport replays canned responses and records every request,
//! so the exact exchange sequence can be checked.

use std::cell::RefCell;
use std::collections::VecDeque;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rustexec_core::winrm::{EnvelopeSettings, SessionState, Transport, WsAction};
use rustexec_core::{
    CapturingOutputHandler, CmdLine, ConnectionContext, ExecError, OperatingSystemFamily,
    TransportError, WinRmClient, WinRmConnection,
};

const COMMAND_STATE: &str = "http://schemas.microsoft.com/wbem/wsman/1/windows/shell/CommandState";

/// Replays responses in order; records actions and request bodies
#[derive(Default)]
struct ScriptedTransport {
    responses: RefCell<VecDeque<Result<String, TransportError>>>,
    requests: RefCell<Vec<(WsAction, String)>>,
}

impl ScriptedTransport {
    fn then(self, response: Result<String, TransportError>) -> Self {
        self.responses.borrow_mut().push_back(response);
        self
    }

    fn actions(&self) -> Vec<WsAction> {
        self.requests.borrow().iter().map(|(a, _)| *a).collect()
    }

    fn request(&self, action: WsAction) -> String {
        self.requests
            .borrow()
            .iter()
            .find(|(a, _)| *a == action)
            .map(|(_, r)| r.clone())
            .unwrap_or_default()
    }
}

impl Transport for ScriptedTransport {
    fn send_message(&self, request: &str, action: WsAction) -> Result<String, TransportError> {
        self.requests
            .borrow_mut()
            .push((action, request.to_string()));
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok("<s:Envelope/>".to_string()))
    }
}

fn shell_created() -> Result<String, TransportError> {
    Ok(r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope" xmlns:w="http://schemas.dmtf.org/wbem/wsman/1/wsman.xsd"><s:Body><w:SelectorSet><w:Selector Name="ShellId">11111111-2222</w:Selector></w:SelectorSet></s:Body></s:Envelope>"#.to_string())
}

fn command_started() -> Result<String, TransportError> {
    Ok(r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope" xmlns:rsp="http://schemas.microsoft.com/wbem/wsman/1/windows/shell"><s:Body><rsp:CommandResponse><rsp:CommandId>AAAA-BBBB</rsp:CommandId></rsp:CommandResponse></s:Body></s:Envelope>"#.to_string())
}

fn receive(stdout: &str, stderr: &str, exit_code: Option<i32>) -> Result<String, TransportError> {
    let state = match exit_code {
        Some(code) => format!(
            r#"<rsp:CommandState CommandId="AAAA-BBBB" State="{COMMAND_STATE}/Done"><rsp:ExitCode>{code}</rsp:ExitCode></rsp:CommandState>"#
        ),
        None => format!(r#"<rsp:CommandState CommandId="AAAA-BBBB" State="{COMMAND_STATE}/Running"/>"#),
    };
    Ok(format!(
        r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope" xmlns:rsp="http://schemas.microsoft.com/wbem/wsman/1/windows/shell"><s:Body><rsp:ReceiveResponse><rsp:Stream Name="stdout" CommandId="AAAA-BBBB">{}</rsp:Stream><rsp:Stream Name="stderr" CommandId="AAAA-BBBB">{}</rsp:Stream>{state}</rsp:ReceiveResponse></s:Body></s:Envelope>"#,
        STANDARD.encode(stdout),
        STANDARD.encode(stderr),
    ))
}

fn settings() -> EnvelopeSettings {
    EnvelopeSettings::new("http://winhost:5985/wsman")
}

#[test]
fn test_partial_line_then_completion() {
    let transport = ScriptedTransport::default()
        .then(shell_created())
        .then(command_started())
        .then(receive("partial\n", "", None))
        .then(receive("", "", Some(0)));
    let mut client = WinRmClient::new(&transport, settings());
    let mut handler = CapturingOutputHandler::new();

    let code = client.run_command("hostname", &mut handler).unwrap();

    assert_eq!(code, 0);
    assert_eq!(client.exit_code().unwrap(), 0);
    assert_eq!(handler.output_lines(), vec!["partial"]);
    assert_eq!(
        transport.actions(),
        vec![
            WsAction::Create,
            WsAction::Command,
            WsAction::Receive,
            WsAction::Receive,
            WsAction::Signal,
            WsAction::Delete,
        ]
    );
}

#[test]
fn test_requests_carry_handles() {
    let transport = ScriptedTransport::default()
        .then(shell_created())
        .then(command_started())
        .then(receive("", "", Some(0)));
    let mut client = WinRmClient::new(&transport, settings());
    let mut handler = CapturingOutputHandler::new();
    client.run_command("hostname", &mut handler).unwrap();

    let command = transport.request(WsAction::Command);
    assert!(command.contains("11111111-2222"));
    assert!(command.contains("hostname"));
    assert!(command.contains("WINRS_CONSOLEMODE_STDIN"));

    let receive = transport.request(WsAction::Receive);
    assert!(receive.contains("AAAA-BBBB"));

    let signal = transport.request(WsAction::Signal);
    assert!(signal.contains("AAAA-BBBB"));
    assert!(signal.contains("signal/terminate"));
}

#[test]
fn test_output_split_across_chunks() {
    let transport = ScriptedTransport::default()
        .then(shell_created())
        .then(command_started())
        .then(receive("Volume in drive C ", "Access ", None))
        .then(receive("is OS\r\nSerial", "denied\r\n", None))
        .then(receive(" 1234", "", Some(5)));
    let mut client = WinRmClient::new(&transport, settings());
    let mut handler = CapturingOutputHandler::new();

    let code = client.run_command("vol", &mut handler).unwrap();

    assert_eq!(code, 5);
    assert_eq!(
        handler.output_lines(),
        vec!["Volume in drive C is OS", "Serial 1234"]
    );
    assert_eq!(handler.error_lines(), vec!["Access denied"]);
    assert_eq!(client.session().chunk_index(), 2);
}

#[test]
fn test_run_command_failure_still_tears_down() {
    let transport = ScriptedTransport::default()
        .then(shell_created())
        .then(Err(TransportError::Other("connection reset".to_string())));
    let mut client = WinRmClient::new(&transport, settings());
    let mut handler = CapturingOutputHandler::new();

    let err = client.run_command("dir", &mut handler).unwrap_err();

    assert!(matches!(err, ExecError::Transport(TransportError::Other(ref m)) if m == "connection reset"));
    assert_eq!(
        transport.actions(),
        vec![
            WsAction::Create,
            WsAction::Command,
            WsAction::Signal,
            WsAction::Delete,
        ]
    );
    assert_eq!(client.session().state(), SessionState::Closed);
    assert!(client.exit_code().is_err());
}

#[test]
fn test_teardown_failures_do_not_mask_receive_error() {
    let transport = ScriptedTransport::default()
        .then(shell_created())
        .then(command_started())
        .then(Err(TransportError::Status {
            status: 500,
            body: "fault".to_string(),
        }))
        .then(Err(TransportError::Other("signal failed".to_string())))
        .then(Err(TransportError::Other("delete failed".to_string())));
    let mut client = WinRmClient::new(&transport, settings());
    let mut handler = CapturingOutputHandler::new();

    let err = client.run_command("dir", &mut handler).unwrap_err();

    assert!(matches!(
        err,
        ExecError::Transport(TransportError::Status { status: 500, .. })
    ));
    assert_eq!(transport.actions().len(), 5);
}

#[test]
fn test_missing_shell_id_sends_nothing_else() {
    let transport = ScriptedTransport::default().then(Ok("<s:Envelope/>".to_string()));
    let mut client = WinRmClient::new(&transport, settings());
    let mut handler = CapturingOutputHandler::new();

    let err = client.run_command("dir", &mut handler).unwrap_err();

    assert!(matches!(err, ExecError::Protocol(_)));
    assert_eq!(transport.actions(), vec![WsAction::Create]);
}

#[test]
fn test_client_can_run_again() {
    let transport = ScriptedTransport::default()
        .then(shell_created())
        .then(command_started())
        .then(receive("first\n", "", Some(0)))
        .then(Ok("<s:Envelope/>".to_string()))
        .then(Ok("<s:Envelope/>".to_string()))
        .then(shell_created())
        .then(command_started())
        .then(receive("second\n", "", Some(1)));
    let mut client = WinRmClient::new(&transport, settings());

    let mut first = CapturingOutputHandler::new();
    assert_eq!(client.run_command("a", &mut first).unwrap(), 0);
    let mut second = CapturingOutputHandler::new();
    assert_eq!(client.run_command("b", &mut second).unwrap(), 1);

    assert_eq!(first.output_lines(), vec!["first"]);
    assert_eq!(second.output_lines(), vec!["second"]);
    assert_eq!(client.session().chunk_index(), 0);
}

#[test]
fn test_connection_composes_working_directory() {
    let transport = ScriptedTransport::default()
        .then(shell_created())
        .then(command_started())
        .then(receive("ok\n", "", Some(0)));
    let context =
        ConnectionContext::new(OperatingSystemFamily::Windows).with_working_directory("D:\\builds");
    let connection = WinRmConnection::new(&transport, settings(), context).unwrap();

    let mut handler = CapturingOutputHandler::new();
    let mut command = CmdLine::build(["msbuild", "/p:Configuration=Release"]);
    command.add_secret("token-123");
    let code = connection.execute(&command, &mut handler).unwrap();

    assert_eq!(code, 0);
    let request = transport.request(WsAction::Command);
    assert!(request.contains("D:\\builds"));
    assert!(request.contains("&amp;&amp; msbuild /p:Configuration=Release token-123"));
}
