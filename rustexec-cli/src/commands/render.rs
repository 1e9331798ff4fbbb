//! Render command: prints a command line as it would be sent.

use rustexec_core::OperatingSystemFamily;

use crate::error::CliError;
use crate::util::build_command;

/// Render command handler
pub fn cmd_render(
    os: OperatingSystemFamily,
    for_logging: bool,
    args: &[String],
    secrets: &[String],
) -> Result<(), CliError> {
    let command = build_command(args, secrets, false);
    println!("{}", command.render(os, for_logging));
    Ok(())
}
