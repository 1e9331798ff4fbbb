//! Command composition
//!
//! Turns a caller's command line into the one actually sent over a
//! connection: directory change, escalation prefix, and the session
//! requirements (pseudo-terminal, prompt responder) that go with them.

mod context;
mod policy;
mod pty;

pub use context::{
    ConnectionContext, DEFAULT_SUDO_COMMAND_PREFIX, EscalationSettings, SshConnectionType,
    TARGET_USER_PLACEHOLDER,
};
pub use policy::{ComposedCommand, compose};
pub use pty::{PTY_PATTERN, PtyRequest, PtySpec};
