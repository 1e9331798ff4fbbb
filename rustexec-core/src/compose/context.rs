//! Connection semantics consumed by command composition

use std::fmt;
use std::str::FromStr;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::automation::DEFAULT_PASSWORD_PROMPT;
use crate::cmdline::OperatingSystemFamily;

/// Default escalation prefix; `{0}` is replaced by the target user
pub const DEFAULT_SUDO_COMMAND_PREFIX: &str = "sudo -u {0}";

/// Placeholder for the target user in an escalation prefix
pub const TARGET_USER_PLACEHOLDER: &str = "{0}";

/// How commands are run once logged in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SshConnectionType {
    /// Run as the login user
    #[default]
    Direct,
    /// Run through a non-interactive escalation prefix
    Sudo,
    /// Run through an escalation prefix that prompts for a password
    InteractiveSudo,
}

impl SshConnectionType {
    /// Returns true if commands are prefixed with an escalation command
    #[must_use]
    pub const fn escalates(self) -> bool {
        matches!(self, Self::Sudo | Self::InteractiveSudo)
    }

    /// Returns the name used in configuration files
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Sudo => "sudo",
            Self::InteractiveSudo => "interactive_sudo",
        }
    }
}

impl fmt::Display for SshConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SshConnectionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "direct" => Ok(Self::Direct),
            "sudo" => Ok(Self::Sudo),
            "interactive_sudo" => Ok(Self::InteractiveSudo),
            other => Err(format!("Unknown connection type: {other}")),
        }
    }
}

/// Escalation prefix configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscalationSettings {
    /// User to run commands as
    pub target_user: String,
    /// Prefix template, split on whitespace into plain arguments
    pub command_prefix: String,
    /// Wrap the escalated command in a single nested argument
    pub quote_command: bool,
    /// Pattern that detects the escalation password prompt
    pub password_prompt_regex: String,
}

impl EscalationSettings {
    /// Creates settings escalating to `target_user` with default prefix and prompt
    #[must_use]
    pub fn new(target_user: impl Into<String>) -> Self {
        Self {
            target_user: target_user.into(),
            command_prefix: DEFAULT_SUDO_COMMAND_PREFIX.to_string(),
            quote_command: false,
            password_prompt_regex: DEFAULT_PASSWORD_PROMPT.to_string(),
        }
    }

    /// Sets the prefix template
    #[must_use]
    pub fn with_command_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.command_prefix = prefix.into();
        self
    }

    /// Sets whether the escalated command is quoted as one argument
    #[must_use]
    pub const fn with_quote_command(mut self, quote: bool) -> Self {
        self.quote_command = quote;
        self
    }

    /// Sets the password prompt pattern
    #[must_use]
    pub fn with_password_prompt_regex(mut self, regex: impl Into<String>) -> Self {
        self.password_prompt_regex = regex.into();
        self
    }

    /// Returns the prefix arguments with the target user substituted
    #[must_use]
    pub fn prefix_arguments(&self) -> Vec<String> {
        self.command_prefix
            .split_whitespace()
            .map(|part| part.replace(TARGET_USER_PLACEHOLDER, &self.target_user))
            .collect()
    }
}

impl Default for EscalationSettings {
    fn default() -> Self {
        Self::new("root")
    }
}

/// Everything composition needs to know about a connection
#[derive(Debug, Clone, Default)]
pub struct ConnectionContext {
    /// Target operating system family
    pub os: OperatingSystemFamily,
    /// Directory to change into before running the command
    pub working_directory: Option<String>,
    /// Connection type
    pub connection_type: SshConnectionType,
    /// Escalation settings, used by the sudo connection types
    pub escalation: EscalationSettings,
    /// Request the transport's default pseudo-terminal
    pub allocate_default_pty: bool,
    /// Explicit pseudo-terminal specification, `TERM:COLS:ROWS:WIDTH:HEIGHT`
    pub allocate_pty: Option<String>,
    /// Password answered to the escalation prompt
    pub password: Option<SecretString>,
}

impl ConnectionContext {
    /// Creates a direct connection context for the given OS family
    #[must_use]
    pub fn new(os: OperatingSystemFamily) -> Self {
        Self {
            os,
            ..Self::default()
        }
    }

    /// Sets the working directory
    #[must_use]
    pub fn with_working_directory(mut self, directory: impl Into<String>) -> Self {
        self.working_directory = Some(directory.into());
        self
    }

    /// Sets the connection type
    #[must_use]
    pub const fn with_connection_type(mut self, connection_type: SshConnectionType) -> Self {
        self.connection_type = connection_type;
        self
    }

    /// Sets the escalation settings
    #[must_use]
    pub fn with_escalation(mut self, escalation: EscalationSettings) -> Self {
        self.escalation = escalation;
        self
    }

    /// Requests the default pseudo-terminal
    #[must_use]
    pub const fn with_default_pty(mut self, allocate: bool) -> Self {
        self.allocate_default_pty = allocate;
        self
    }

    /// Requests an explicit pseudo-terminal
    #[must_use]
    pub fn with_pty(mut self, spec: impl Into<String>) -> Self {
        self.allocate_pty = Some(spec.into());
        self
    }

    /// Sets the escalation password
    #[must_use]
    pub fn with_password(mut self, password: SecretString) -> Self {
        self.password = Some(password);
        self
    }
}
