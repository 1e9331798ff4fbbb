//! Connection profiles

use std::path::PathBuf;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::automation::DEFAULT_PASSWORD_PROMPT;
use crate::cmdline::OperatingSystemFamily;
use crate::compose::{
    ConnectionContext, DEFAULT_SUDO_COMMAND_PREFIX, EscalationSettings, SshConnectionType,
};
use crate::winrm::{DEFAULT_ENVELOPE_SIZE, DEFAULT_LOCALE, DEFAULT_TIMEOUT};

/// Default WinRM HTTP port
pub const WINRM_HTTP_PORT: u16 = 5985;
/// Default WinRM HTTPS port
pub const WINRM_HTTPS_PORT: u16 = 5986;
/// Default SSH port
pub const SSH_PORT: u16 = 22;
/// Default WS-Management context path
pub const DEFAULT_WINRM_CONTEXT: &str = "/wsman";

/// A named remote host and how to reach it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Unique profile name
    pub name: String,
    /// Host name or address
    pub host: String,
    /// Port; the protocol default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Login user
    pub username: String,
    /// Login password, also answered to interactive escalation prompts
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "secret_serde"
    )]
    pub password: Option<SecretString>,
    /// Target operating system family
    #[serde(default)]
    pub os: OperatingSystemFamily,
    /// Directory commands run in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
    /// Protocol specific settings
    pub protocol: ProtocolSettings,
}

impl Profile {
    /// Creates a WinRM profile for a Windows host
    #[must_use]
    pub fn winrm(
        name: impl Into<String>,
        host: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port: None,
            username: username.into(),
            password: None,
            os: OperatingSystemFamily::Windows,
            working_directory: None,
            protocol: ProtocolSettings::WinRm(WinRmSettings::default()),
        }
    }

    /// Creates a direct SSH profile for a Unix host
    #[must_use]
    pub fn ssh(
        name: impl Into<String>,
        host: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port: None,
            username: username.into(),
            password: None,
            os: OperatingSystemFamily::Unix,
            working_directory: None,
            protocol: ProtocolSettings::Ssh(SshSettings::default()),
        }
    }

    /// Sets the password
    #[must_use]
    pub fn with_password(mut self, password: SecretString) -> Self {
        self.password = Some(password);
        self
    }

    /// Sets the working directory
    #[must_use]
    pub fn with_working_directory(mut self, directory: impl Into<String>) -> Self {
        self.working_directory = Some(directory.into());
        self
    }

    /// Returns the configured port, or the protocol default
    #[must_use]
    pub const fn effective_port(&self) -> u16 {
        match self.port {
            Some(port) => port,
            None => self.protocol.default_port(),
        }
    }

    /// Returns the protocol id used by the executor registry
    #[must_use]
    pub const fn protocol_id(&self) -> &'static str {
        self.protocol.id()
    }

    /// Builds the composition context for this profile
    ///
    /// WinRM profiles never escalate; only the working directory applies.
    #[must_use]
    pub fn connection_context(&self) -> ConnectionContext {
        let mut context = ConnectionContext::new(self.os);
        context.working_directory.clone_from(&self.working_directory);
        context.password.clone_from(&self.password);

        if let ProtocolSettings::Ssh(ssh) = &self.protocol {
            context.connection_type = ssh.connection_type;
            context.escalation = ssh.escalation();
            context.allocate_default_pty = ssh.allocate_default_pty;
            context.allocate_pty.clone_from(&ssh.allocate_pty);
        }
        context
    }
}

/// Protocol specific settings, tagged by `type`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProtocolSettings {
    /// WS-Management remote shell over HTTP(S)
    #[serde(rename = "winrm")]
    WinRm(WinRmSettings),
    /// Secure shell
    Ssh(SshSettings),
}

impl ProtocolSettings {
    /// Returns the protocol id
    #[must_use]
    pub const fn id(&self) -> &'static str {
        match self {
            Self::WinRm(_) => "winrm",
            Self::Ssh(_) => "ssh",
        }
    }

    /// Returns the default port of the protocol
    #[must_use]
    pub const fn default_port(&self) -> u16 {
        match self {
            Self::WinRm(settings) if settings.https => WINRM_HTTPS_PORT,
            Self::WinRm(_) => WINRM_HTTP_PORT,
            Self::Ssh(_) => SSH_PORT,
        }
    }
}

/// WinRM endpoint and envelope settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WinRmSettings {
    /// Use HTTPS
    pub https: bool,
    /// Context path of the endpoint
    pub context: String,
    /// Operation timeout as an ISO-8601 duration
    pub timeout: String,
    /// Maximum envelope size
    pub envelope_size: u32,
    /// Message and data locale
    pub locale: String,
    /// Skip certificate verification
    pub accept_invalid_certs: bool,
}

impl Default for WinRmSettings {
    fn default() -> Self {
        Self {
            https: false,
            context: DEFAULT_WINRM_CONTEXT.to_string(),
            timeout: DEFAULT_TIMEOUT.to_string(),
            envelope_size: DEFAULT_ENVELOPE_SIZE,
            locale: DEFAULT_LOCALE.to_string(),
            accept_invalid_certs: false,
        }
    }
}

impl WinRmSettings {
    /// Builds the endpoint URL for a host and port
    #[must_use]
    pub fn url(&self, host: &str, port: u16) -> String {
        let scheme = if self.https { "https" } else { "http" };
        let context = self.context.trim_start_matches('/');
        format!("{scheme}://{host}:{port}/{context}")
    }
}

/// SSH connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SshSettings {
    /// How commands are run once logged in
    pub connection_type: SshConnectionType,
    /// User to escalate to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sudo_username: Option<String>,
    /// Escalation prefix template
    pub sudo_command_prefix: String,
    /// Quote the escalated command as one argument
    pub sudo_quote_command: bool,
    /// Pattern of the escalation password prompt
    pub sudo_password_prompt_regex: String,
    /// Request a default pseudo-terminal
    pub allocate_default_pty: bool,
    /// Explicit pseudo-terminal, `TERM:COLS:ROWS:WIDTH:HEIGHT`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocate_pty: Option<String>,
    /// Private key file; `~` is expanded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_file: Option<String>,
}

impl Default for SshSettings {
    fn default() -> Self {
        Self {
            connection_type: SshConnectionType::Direct,
            sudo_username: None,
            sudo_command_prefix: DEFAULT_SUDO_COMMAND_PREFIX.to_string(),
            sudo_quote_command: false,
            sudo_password_prompt_regex: DEFAULT_PASSWORD_PROMPT.to_string(),
            allocate_default_pty: false,
            allocate_pty: None,
            identity_file: None,
        }
    }
}

impl SshSettings {
    /// Returns the escalation settings
    #[must_use]
    pub fn escalation(&self) -> EscalationSettings {
        EscalationSettings::new(self.sudo_username.clone().unwrap_or_default())
            .with_command_prefix(self.sudo_command_prefix.clone())
            .with_quote_command(self.sudo_quote_command)
            .with_password_prompt_regex(self.sudo_password_prompt_regex.clone())
    }

    /// Returns the identity file with `~` expanded
    #[must_use]
    pub fn identity_path(&self) -> Option<PathBuf> {
        self.identity_file
            .as_deref()
            .map(|path| PathBuf::from(shellexpand::tilde(path).into_owned()))
    }
}

mod secret_serde {
    use secrecy::{ExposeSecret, SecretString};
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(
        value: &Option<SecretString>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(secret) => serializer.serialize_some(secret.expose_secret()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<SecretString>, D::Error> {
        Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
    }
}
