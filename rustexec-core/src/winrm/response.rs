//! WS-Management response documents
//!
//! Responses are flattened into a list of elements keyed by local name, so
//! lookups do not depend on the namespace prefixes the server picked.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{ExecError, ExecResult};

/// State URI reported once a command has finished
pub const COMMAND_STATE_DONE: &str =
    "http://schemas.microsoft.com/wbem/wsman/1/windows/shell/CommandState/Done";

#[derive(Debug, Clone, Default)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Self {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).to_string();
        let attributes = start
            .attributes()
            .flatten()
            .map(|attr| {
                (
                    String::from_utf8_lossy(attr.key.local_name().as_ref()).to_string(),
                    String::from_utf8_lossy(&attr.value).to_string(),
                )
            })
            .collect();
        Self {
            name,
            attributes,
            text: String::new(),
        }
    }

    fn matches(&self, name: &str, attribute: Option<(&str, &str)>) -> bool {
        self.name == name
            && attribute.is_none_or(|(key, value)| {
                self.attributes.iter().any(|(k, v)| k == key && v == value)
            })
    }
}

/// A parsed response
#[derive(Debug, Clone, Default)]
pub struct ResponseDocument {
    elements: Vec<Element>,
}

impl ResponseDocument {
    /// Parses a response document
    ///
    /// # Errors
    ///
    /// Returns `ExecError::Protocol` if the document is not well-formed XML.
    pub fn parse(xml: &str) -> ExecResult<Self> {
        let mut reader = Reader::from_str(xml.trim_start_matches('\u{feff}'));
        reader.config_mut().trim_text(true);

        let mut elements: Vec<Element> = Vec::new();
        let mut open: Vec<usize> = Vec::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    open.push(elements.len());
                    elements.push(Element::from_start(&e));
                }
                Ok(Event::Empty(e)) => elements.push(Element::from_start(&e)),
                Ok(Event::Text(e)) => {
                    if let Some(&index) = open.last() {
                        elements[index].text.push_str(&String::from_utf8_lossy(&e));
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Some(&index) = open.last() {
                        elements[index].text.push_str(&String::from_utf8_lossy(&e));
                    }
                }
                Ok(Event::End(_)) => {
                    open.pop();
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(ExecError::Protocol(format!(
                        "Malformed response at position {}: {e}",
                        reader.buffer_position()
                    )));
                }
                _ => {}
            }
        }

        if elements.is_empty() {
            return Err(ExecError::Protocol("Empty response document".to_string()));
        }

        Ok(Self { elements })
    }

    fn find_all<'a>(
        &'a self,
        name: &str,
        attribute: Option<(&str, &str)>,
    ) -> impl Iterator<Item = &'a Element> {
        self.elements
            .iter()
            .filter(move |e| e.matches(name, attribute))
    }

    fn first_text(&self, name: &str, attribute: Option<(&str, &str)>) -> Option<&str> {
        self.find_all(name, attribute)
            .next()
            .map(|e| e.text.trim())
    }

    /// Returns the shell handle of an open-shell response
    ///
    /// # Errors
    ///
    /// Returns `ExecError::Protocol` if the response carries no shell handle.
    pub fn shell_id(&self) -> ExecResult<String> {
        self.first_text("Selector", Some(("Name", "ShellId")))
            .or_else(|| self.first_text("ShellId", None))
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ExecError::Protocol("No ShellId in open-shell response".to_string()))
    }

    /// Returns the command handle of a run-command response
    ///
    /// # Errors
    ///
    /// Returns `ExecError::Protocol` if the response carries no command handle.
    pub fn command_id(&self) -> ExecResult<String> {
        self.first_text("CommandId", None)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                ExecError::Protocol("No CommandId in run-command response".to_string())
            })
    }

    /// Decodes and concatenates every fragment of the named stream, in document order
    ///
    /// # Errors
    ///
    /// Returns `ExecError::Protocol` if a fragment is not valid base64.
    pub fn stream_bytes(&self, stream: &str) -> ExecResult<Vec<u8>> {
        let mut bytes = Vec::new();
        for element in self.find_all("Stream", Some(("Name", stream))) {
            let text = element.text.trim();
            if text.is_empty() {
                continue;
            }
            let decoded = STANDARD.decode(text).map_err(|e| {
                ExecError::Protocol(format!("Invalid base64 in {stream} fragment: {e}"))
            })?;
            bytes.extend_from_slice(&decoded);
        }
        Ok(bytes)
    }

    /// Returns the exit code if the response carries one
    ///
    /// # Errors
    ///
    /// Returns `ExecError::Protocol` if an exit code is present but not numeric.
    pub fn exit_code(&self) -> ExecResult<Option<i32>> {
        self.first_text("ExitCode", None)
            .map(|code| {
                code.parse::<i32>().map_err(|e| {
                    ExecError::Protocol(format!("Invalid exit code '{code}': {e}"))
                })
            })
            .transpose()
    }

    /// Returns true if the command state reports completion
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.find_all("CommandState", Some(("State", COMMAND_STATE_DONE)))
            .next()
            .is_some()
    }
}
