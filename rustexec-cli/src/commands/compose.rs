//! Compose command: shows what a profile would run.

use std::path::Path;

use rustexec_core::ComposedCommand;

use crate::error::CliError;
use crate::util::{build_command, load_profile};

/// Compose command handler
pub fn cmd_compose(
    config_path: Option<&Path>,
    name: &str,
    args: &[String],
) -> Result<(), CliError> {
    let profile = load_profile(config_path, name)?;
    let command = build_command(args, &[], false);
    let composed = rustexec_core::compose(&command, &profile.connection_context())?;

    println!("{}", format_composed(&composed, profile.os));
    Ok(())
}

/// Formats a composed command for display, secrets masked
#[must_use]
pub fn format_composed(
    composed: &ComposedCommand,
    os: rustexec_core::OperatingSystemFamily,
) -> String {
    let pty = composed
        .pty
        .as_ref()
        .map_or_else(|| "none".to_string(), ToString::to_string);
    let responder = if composed.prompt_responder.is_some() {
        "yes"
    } else {
        "no"
    };

    format!(
        "Command:          {}\nPTY:              {pty}\nPrompt responder: {responder}",
        composed.command.render(os, true)
    )
}
