//! Show profile details command.

use std::fmt::Write as _;
use std::path::Path;

use rustexec_core::{Profile, ProtocolSettings};

use super::list::ProfileOutput;
use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::util::load_profile;

/// Show profile details command handler
pub fn cmd_show(
    config_path: Option<&Path>,
    name: &str,
    format: OutputFormat,
) -> Result<(), CliError> {
    let profile = load_profile(config_path, name)?;

    match format {
        OutputFormat::Table => println!("{}", format_details(&profile)),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&ProfileOutput::from(&profile))
                .map_err(|e| CliError::Output(format!("Failed to serialize to JSON: {e}")))?;
            println!("{json}");
        }
    }

    Ok(())
}

/// Formats the details of one profile
#[must_use]
pub fn format_details(profile: &Profile) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Profile Details:");
    let _ = writeln!(output, "  Name:     {}", profile.name);
    let _ = writeln!(output, "  Host:     {}", profile.host);
    let _ = writeln!(output, "  Port:     {}", profile.effective_port());
    let _ = writeln!(output, "  Protocol: {}", profile.protocol_id());
    let _ = writeln!(output, "  OS:       {}", profile.os);
    let _ = writeln!(output, "  Username: {}", profile.username);
    if profile.password.is_some() {
        let _ = writeln!(output, "  Password: (set)");
    }
    if let Some(ref directory) = profile.working_directory {
        let _ = writeln!(output, "  Workdir:  {directory}");
    }

    match profile.protocol {
        ProtocolSettings::WinRm(ref winrm) => {
            let _ = writeln!(
                output,
                "  URL:      {}",
                winrm.url(&profile.host, profile.effective_port())
            );
            let _ = writeln!(output, "  Timeout:  {}", winrm.timeout);
            let _ = writeln!(output, "  Locale:   {}", winrm.locale);
            if winrm.accept_invalid_certs {
                let _ = writeln!(output, "  TLS:      certificate checks disabled");
            }
        }
        ProtocolSettings::Ssh(ref ssh) => {
            let _ = writeln!(output, "  Mode:     {}", ssh.connection_type);
            if ssh.connection_type.escalates() {
                let _ = writeln!(
                    output,
                    "  Sudo:     {}",
                    ssh.escalation().prefix_arguments().join(" ")
                );
                if ssh.sudo_quote_command {
                    let _ = writeln!(output, "  Quoted:   yes");
                }
            }
            if let Some(ref pty) = ssh.allocate_pty {
                let _ = writeln!(output, "  PTY:      {pty}");
            } else if ssh.allocate_default_pty {
                let _ = writeln!(output, "  PTY:      default");
            }
            if let Some(key) = ssh.identity_path() {
                let _ = writeln!(output, "  Key Path: {}", key.display());
            }
        }
    }

    output.trim_end().to_string()
}
