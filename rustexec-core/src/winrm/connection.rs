//! WinRM connection bound to a profile

use std::time::Duration;

use crate::cmdline::{CmdLine, OperatingSystemFamily};
use crate::compose::{ComposedCommand, ConnectionContext, compose};
use crate::config::{Profile, ProtocolSettings};
use crate::error::{ExecError, ExecResult};
use crate::handler::OutputHandler;

use super::client::WinRmClient;
use super::envelope::EnvelopeSettings;
use super::transport::{HttpTransport, Transport};

/// Extra time the HTTP client waits beyond the operation timeout
const HTTP_TIMEOUT_SLACK: Duration = Duration::from_secs(10);

/// Runs commands on a Windows host over WinRM
///
/// Every call runs through a fresh [`WinRmClient`], so one connection can
/// serve several commands in sequence.
#[derive(Debug)]
pub struct WinRmConnection<T: Transport> {
    transport: T,
    settings: EnvelopeSettings,
    context: ConnectionContext,
}

impl<T: Transport> WinRmConnection<T> {
    /// Creates a connection
    ///
    /// # Errors
    ///
    /// Returns `ExecError::InvalidConfiguration` if the target is not a
    /// Windows host.
    pub fn new(
        transport: T,
        settings: EnvelopeSettings,
        context: ConnectionContext,
    ) -> ExecResult<Self> {
        if !context.os.is_windows() {
            return Err(ExecError::InvalidConfiguration(format!(
                "WinRM connections only support Windows hosts, not {}",
                context.os
            )));
        }
        Ok(Self {
            transport,
            settings,
            context,
        })
    }

    /// Returns the envelope settings
    #[must_use]
    pub const fn settings(&self) -> &EnvelopeSettings {
        &self.settings
    }

    /// Returns the composition context
    #[must_use]
    pub const fn context(&self) -> &ConnectionContext {
        &self.context
    }

    /// Composes a command for this connection without running it
    ///
    /// # Errors
    ///
    /// Returns `ExecError::InvalidConfiguration` if composition fails.
    pub fn compose(&self, command: &CmdLine) -> ExecResult<ComposedCommand> {
        compose(command, &self.context)
    }

    /// Runs a command and returns its exit code
    ///
    /// # Errors
    ///
    /// Returns `ExecError::InvalidArgument` for an empty command line, and
    /// composition, transport and protocol errors.
    pub fn execute(&self, command: &CmdLine, handler: &mut dyn OutputHandler) -> ExecResult<i32> {
        if command.is_empty() {
            return Err(ExecError::InvalidArgument(
                "Cannot execute an empty command line".to_string(),
            ));
        }
        let composed = self.compose(command)?;
        let os = OperatingSystemFamily::Windows;

        tracing::info!(
            url = %self.settings.target_url,
            command = %composed.command.render(os, true),
            "Executing over WinRM"
        );

        let mut client = WinRmClient::new(&self.transport, self.settings.clone());
        client.run_command(&composed.command.render(os, false), handler)
    }
}

impl WinRmConnection<HttpTransport> {
    /// Creates an HTTP(S) connection from a WinRM profile
    ///
    /// # Errors
    ///
    /// Returns `ExecError::InvalidConfiguration` if the profile is not a
    /// WinRM profile, has no password, targets a non-Windows host, or has an
    /// unparseable timeout; `ExecError::Transport` if the HTTP client cannot
    /// be built.
    pub fn from_profile(profile: &Profile) -> ExecResult<Self> {
        let ProtocolSettings::WinRm(winrm) = &profile.protocol else {
            return Err(ExecError::InvalidConfiguration(format!(
                "Profile '{}' is not a WinRM profile",
                profile.name
            )));
        };
        let password = profile.password.clone().ok_or_else(|| {
            ExecError::InvalidConfiguration(format!(
                "Profile '{}' has no password for WinRM basic authentication",
                profile.name
            ))
        })?;
        let http_timeout = parse_iso8601_duration(&winrm.timeout)
            .and_then(|timeout| timeout.checked_add(HTTP_TIMEOUT_SLACK))
            .ok_or_else(|| {
                ExecError::InvalidConfiguration(format!(
                    "Invalid WinRM timeout '{}', expected an ISO-8601 duration like PT60S",
                    winrm.timeout
                ))
            })?;

        let url = winrm.url(&profile.host, profile.effective_port());
        let transport = HttpTransport::new(
            url.clone(),
            profile.username.clone(),
            password,
            winrm.accept_invalid_certs,
            Some(http_timeout),
        )?;
        let settings = EnvelopeSettings::new(url)
            .with_timeout(winrm.timeout.clone())
            .with_max_envelope_size(winrm.envelope_size)
            .with_locale(winrm.locale.clone());

        Self::new(transport, settings, profile.connection_context())
    }
}

/// Parses the time part of an ISO-8601 duration (`PT1H2M3.5S`)
///
/// Returns `None` for malformed text and for values too large for a
/// [`Duration`].
fn parse_iso8601_duration(text: &str) -> Option<Duration> {
    let rest = text.strip_prefix("PT")?;
    if rest.is_empty() {
        return None;
    }

    let mut seconds = 0.0_f64;
    let mut number = String::new();
    for c in rest.chars() {
        let unit = match c {
            '0'..='9' | '.' => {
                number.push(c);
                continue;
            }
            'H' => 3600.0,
            'M' => 60.0,
            'S' => 1.0,
            _ => return None,
        };
        seconds += number.parse::<f64>().ok()? * unit;
        number.clear();
    }

    if !number.is_empty() {
        return None;
    }
    Duration::try_from_secs_f64(seconds).ok()
}
