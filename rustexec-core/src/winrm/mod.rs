//! WinRM remote shell execution
//!
//! [`WinRmClient`] drives the WS-Management shell lifecycle for one command
//! over any [`Transport`]. [`WinRmConnection`] binds a client to a profile
//! and runs composed command lines on a Windows host.

mod client;
mod connection;
mod envelope;
mod response;
mod transport;

pub use client::{SessionState, ShellSession, WinRmClient};
pub use connection::WinRmConnection;
pub use envelope::{
    DEFAULT_ENVELOPE_SIZE, DEFAULT_LOCALE, DEFAULT_TIMEOUT, EnvelopeSettings, NS_ADDRESSING,
    NS_SOAP_ENV, NS_WIN_SHELL, NS_WSMAN_DMTF, NS_WSMAN_MSFT, OptionSet, RESOURCE_URI_CMD,
    RequestBody, SIGNAL_TERMINATE, WsAction, build_request,
};
pub use response::{COMMAND_STATE_DONE, ResponseDocument};
pub use transport::{HttpTransport, Transport};
