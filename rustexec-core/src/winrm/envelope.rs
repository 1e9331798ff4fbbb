//! WS-Management request envelopes
//!
//! Every request is a SOAP envelope whose header addresses the WinRM endpoint
//! and names the action, and whose body carries the action payload.

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use uuid::Uuid;

use crate::error::{ExecError, ExecResult};

/// SOAP 1.2 envelope namespace
pub const NS_SOAP_ENV: &str = "http://www.w3.org/2003/05/soap-envelope";
/// WS-Addressing namespace
pub const NS_ADDRESSING: &str = "http://schemas.xmlsoap.org/ws/2004/08/addressing";
/// DMTF WS-Management namespace
pub const NS_WSMAN_DMTF: &str = "http://schemas.dmtf.org/wbem/wsman/1/wsman.xsd";
/// Microsoft WS-Management extensions namespace
pub const NS_WSMAN_MSFT: &str = "http://schemas.microsoft.com/wbem/wsman/1/wsman.xsd";
/// Windows remote shell namespace
pub const NS_WIN_SHELL: &str = "http://schemas.microsoft.com/wbem/wsman/1/windows/shell";

/// Resource URI of the `cmd` shell
pub const RESOURCE_URI_CMD: &str = "http://schemas.microsoft.com/wbem/wsman/1/windows/shell/cmd";

/// Anonymous reply-to address
const ANONYMOUS_ADDRESS: &str = "http://schemas.xmlsoap.org/ws/2004/08/addressing/role/anonymous";

/// Signal code that terminates a running command
pub const SIGNAL_TERMINATE: &str =
    "http://schemas.microsoft.com/wbem/wsman/1/windows/shell/signal/terminate";

/// Default operation timeout (ISO-8601 duration)
pub const DEFAULT_TIMEOUT: &str = "PT60S";
/// Default maximum envelope size in bytes
pub const DEFAULT_ENVELOPE_SIZE: u32 = 153_600;
/// Default locale
pub const DEFAULT_LOCALE: &str = "en-US";

/// WS-Management action of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WsAction {
    /// Create a shell
    Create,
    /// Run a command in a shell
    Command,
    /// Receive command output
    Receive,
    /// Send a signal to a command
    Signal,
    /// Delete a shell
    Delete,
}

impl WsAction {
    /// Returns the action URI, also used as the `SOAPAction` header
    #[must_use]
    pub const fn uri(self) -> &'static str {
        match self {
            Self::Create => "http://schemas.xmlsoap.org/ws/2004/09/transfer/Create",
            Self::Command => "http://schemas.microsoft.com/wbem/wsman/1/windows/shell/Command",
            Self::Receive => "http://schemas.microsoft.com/wbem/wsman/1/windows/shell/Receive",
            Self::Signal => "http://schemas.microsoft.com/wbem/wsman/1/windows/shell/Signal",
            Self::Delete => "http://schemas.xmlsoap.org/ws/2004/09/transfer/Delete",
        }
    }
}

impl std::fmt::Display for WsAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Command => "command",
            Self::Receive => "receive",
            Self::Signal => "signal",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Option set attached to a request header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionSet {
    /// Options for opening a shell
    OpenShell,
    /// Options for running a command
    RunCommand,
}

impl OptionSet {
    const fn options(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::OpenShell => &[("WINRS_NOPROFILE", "FALSE"), ("WINRS_CODEPAGE", "437")],
            Self::RunCommand => &[
                ("WINRS_CONSOLEMODE_STDIN", "TRUE"),
                ("WINRS_SKIP_CMD_SHELL", "FALSE"),
            ],
        }
    }
}

/// Action specific body payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody<'a> {
    /// Empty body
    Empty,
    /// Shell descriptor: stdin in, stdout and stderr out
    OpenShell,
    /// Command line payload, already quoted
    Command(&'a str),
    /// Receive descriptor for both output streams of a command
    Receive {
        /// Command handle
        command_id: &'a str,
    },
    /// Terminate signal, naming the command when one was started
    Signal {
        /// Command handle
        command_id: Option<&'a str>,
    },
}

/// Header values shared by every request to one endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeSettings {
    /// Endpoint URL, e.g. `http://host:5985/wsman`
    pub target_url: String,
    /// Operation timeout as an ISO-8601 duration
    pub timeout: String,
    /// Maximum envelope size accepted in responses
    pub max_envelope_size: u32,
    /// Locale for messages and data
    pub locale: String,
}

impl EnvelopeSettings {
    /// Creates settings with default timeout, envelope size and locale
    #[must_use]
    pub fn new(target_url: impl Into<String>) -> Self {
        Self {
            target_url: target_url.into(),
            timeout: DEFAULT_TIMEOUT.to_string(),
            max_envelope_size: DEFAULT_ENVELOPE_SIZE,
            locale: DEFAULT_LOCALE.to_string(),
        }
    }

    /// Sets the operation timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: impl Into<String>) -> Self {
        self.timeout = timeout.into();
        self
    }

    /// Sets the maximum envelope size
    #[must_use]
    pub const fn with_max_envelope_size(mut self, size: u32) -> Self {
        self.max_envelope_size = size;
        self
    }

    /// Sets the locale
    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }
}

/// Builds the XML document for one request
///
/// # Errors
///
/// Returns `ExecError::Protocol` if the document cannot be written.
pub fn build_request(
    settings: &EnvelopeSettings,
    action: WsAction,
    shell_id: Option<&str>,
    option_set: Option<OptionSet>,
    body: &RequestBody<'_>,
) -> ExecResult<String> {
    let mut xml = XmlBuilder::new();

    xml.start(
        "env:Envelope",
        &[
            ("xmlns:env", NS_SOAP_ENV),
            ("xmlns:a", NS_ADDRESSING),
            ("xmlns:w", NS_WSMAN_DMTF),
            ("xmlns:p", NS_WSMAN_MSFT),
            ("xmlns:rsp", NS_WIN_SHELL),
        ],
    )?;

    xml.start("env:Header", &[])?;
    xml.text_element("a:To", &[], &settings.target_url)?;
    xml.start("a:ReplyTo", &[])?;
    xml.text_element("a:Address", &[("mustUnderstand", "true")], ANONYMOUS_ADDRESS)?;
    xml.end("a:ReplyTo")?;
    xml.text_element(
        "w:MaxEnvelopeSize",
        &[("mustUnderstand", "true")],
        &settings.max_envelope_size.to_string(),
    )?;
    xml.text_element("a:MessageID", &[], &message_id())?;
    xml.empty(
        "w:Locale",
        &[("mustUnderstand", "false"), ("xml:lang", settings.locale.as_str())],
    )?;
    xml.empty(
        "p:DataLocale",
        &[("mustUnderstand", "false"), ("xml:lang", settings.locale.as_str())],
    )?;
    xml.text_element("w:OperationTimeout", &[], &settings.timeout)?;
    xml.text_element("a:Action", &[("mustUnderstand", "true")], action.uri())?;
    if let Some(shell_id) = shell_id {
        xml.start("w:SelectorSet", &[])?;
        xml.text_element("w:Selector", &[("Name", "ShellId")], shell_id)?;
        xml.end("w:SelectorSet")?;
    }
    xml.text_element(
        "w:ResourceURI",
        &[("mustUnderstand", "true")],
        RESOURCE_URI_CMD,
    )?;
    if let Some(option_set) = option_set {
        xml.start("w:OptionSet", &[])?;
        for (name, value) in option_set.options() {
            xml.text_element("w:Option", &[("Name", *name)], value)?;
        }
        xml.end("w:OptionSet")?;
    }
    xml.end("env:Header")?;

    xml.start("env:Body", &[])?;
    match body {
        RequestBody::Empty => {}
        RequestBody::OpenShell => {
            xml.start("rsp:Shell", &[])?;
            xml.text_element("rsp:InputStreams", &[], "stdin")?;
            xml.text_element("rsp:OutputStreams", &[], "stdout stderr")?;
            xml.end("rsp:Shell")?;
        }
        RequestBody::Command(command) => {
            xml.start("rsp:CommandLine", &[])?;
            xml.text_element("rsp:Command", &[], command)?;
            xml.end("rsp:CommandLine")?;
        }
        RequestBody::Receive { command_id } => {
            xml.start("rsp:Receive", &[])?;
            xml.text_element(
                "rsp:DesiredStream",
                &[("CommandId", *command_id)],
                "stdout stderr",
            )?;
            xml.end("rsp:Receive")?;
        }
        RequestBody::Signal { command_id } => {
            let attributes: Vec<(&str, &str)> =
                command_id.iter().map(|id| ("CommandId", *id)).collect();
            xml.start("rsp:Signal", &attributes)?;
            xml.text_element("rsp:Code", &[], SIGNAL_TERMINATE)?;
            xml.end("rsp:Signal")?;
        }
    }
    xml.end("env:Body")?;
    xml.end("env:Envelope")?;

    xml.finish()
}

fn message_id() -> String {
    format!("uuid:{}", Uuid::new_v4().to_string().to_uppercase())
}

struct XmlBuilder {
    writer: Writer<Vec<u8>>,
}

impl XmlBuilder {
    fn new() -> Self {
        Self {
            writer: Writer::new(Vec::new()),
        }
    }

    fn write(&mut self, event: Event<'_>) -> ExecResult<()> {
        self.writer
            .write_event(event)
            .map_err(|e| ExecError::Protocol(format!("Failed to write request envelope: {e}")))
    }

    fn start(&mut self, name: &str, attributes: &[(&str, &str)]) -> ExecResult<()> {
        let mut element = BytesStart::new(name);
        for attribute in attributes {
            element.push_attribute(*attribute);
        }
        self.write(Event::Start(element))
    }

    fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> ExecResult<()> {
        let mut element = BytesStart::new(name);
        for attribute in attributes {
            element.push_attribute(*attribute);
        }
        self.write(Event::Empty(element))
    }

    fn end(&mut self, name: &str) -> ExecResult<()> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    fn text_element(&mut self, name: &str, attributes: &[(&str, &str)], text: &str) -> ExecResult<()> {
        self.start(name, attributes)?;
        self.write(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn finish(self) -> ExecResult<String> {
        String::from_utf8(self.writer.into_inner())
            .map_err(|e| ExecError::Protocol(format!("Request envelope is not UTF-8: {e}")))
    }
}
