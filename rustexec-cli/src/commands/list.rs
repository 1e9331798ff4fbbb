//! List profiles command.

use std::fmt::Write as _;
use std::path::Path;

use rustexec_core::{Profile, ProtocolSettings};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::util::create_config_manager;

/// List profiles command handler
pub fn cmd_list(config_path: Option<&Path>, format: OutputFormat) -> Result<(), CliError> {
    let config_manager = create_config_manager(config_path)?;
    let profiles = config_manager.load_profiles()?;

    match format {
        OutputFormat::Table => println!("{}", format_table(&profiles)),
        OutputFormat::Json => println!("{}", format_json(&profiles)?),
    }

    Ok(())
}

/// Format profiles as a table string
#[must_use]
pub fn format_table(profiles: &[Profile]) -> String {
    if profiles.is_empty() {
        return "No profiles found.".to_string();
    }

    let mut output = String::new();

    let name_width = profiles
        .iter()
        .map(|p| p.name.len())
        .max()
        .unwrap_or(4)
        .max(4);
    let host_width = profiles
        .iter()
        .map(|p| p.host.len())
        .max()
        .unwrap_or(4)
        .max(4);
    let port_width = 5;
    let protocol_width = 8;

    let _ = writeln!(
        output,
        "{:<name_width$}  {:<host_width$}  \
         {:<port_width$}  {:<protocol_width$}  OS",
        "NAME", "HOST", "PORT", "PROTOCOL"
    );
    let _ = writeln!(
        output,
        "{:-<name_width$}  {:-<host_width$}  \
         {:-<port_width$}  {:-<protocol_width$}  --",
        "", "", "", ""
    );

    for profile in profiles {
        let _ = writeln!(
            output,
            "{:<name_width$}  {:<host_width$}  \
             {:<port_width$}  {:<protocol_width$}  {}",
            profile.name,
            profile.host,
            profile.effective_port(),
            profile.protocol_id(),
            profile.os
        );
    }

    output.trim_end().to_string()
}

/// Format profiles as JSON string
///
/// # Errors
///
/// Returns `CliError::Output` if JSON serialization fails.
pub fn format_json(profiles: &[Profile]) -> Result<String, CliError> {
    let output: Vec<ProfileOutput> = profiles.iter().map(ProfileOutput::from).collect();
    serde_json::to_string_pretty(&output)
        .map_err(|e| CliError::Output(format!("Failed to serialize to JSON: {e}")))
}

/// Profile view for CLI output, without the password
#[derive(Debug, Clone, Serialize)]
pub struct ProfileOutput {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub protocol: &'static str,
    pub username: String,
    pub os: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
    pub has_password: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sudo_username: Option<String>,
}

impl From<&Profile> for ProfileOutput {
    fn from(profile: &Profile) -> Self {
        let (url, connection_type, sudo_username) = match profile.protocol {
            ProtocolSettings::WinRm(ref winrm) => (
                Some(winrm.url(&profile.host, profile.effective_port())),
                None,
                None,
            ),
            ProtocolSettings::Ssh(ref ssh) => (
                None,
                Some(ssh.connection_type.to_string()),
                ssh.sudo_username.clone(),
            ),
        };

        Self {
            name: profile.name.clone(),
            host: profile.host.clone(),
            port: profile.effective_port(),
            protocol: profile.protocol_id(),
            username: profile.username.clone(),
            os: profile.os.to_string(),
            working_directory: profile.working_directory.clone(),
            has_password: profile.password.is_some(),
            url,
            connection_type,
            sudo_username,
        }
    }
}
