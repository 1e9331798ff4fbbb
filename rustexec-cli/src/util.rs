//! Shared utility functions used across command modules.

use std::path::Path;

use rustexec_core::{CmdLine, ConfigManager, Profile};

use crate::error::CliError;

/// Creates a `ConfigManager` using the optional custom config directory
/// from CLI args.
pub fn create_config_manager(config_path: Option<&Path>) -> Result<ConfigManager, CliError> {
    match config_path {
        Some(path) => Ok(ConfigManager::with_config_dir(path.to_path_buf())),
        None => ConfigManager::new()
            .map_err(|e| CliError::Config(format!("Failed to initialize config: {e}"))),
    }
}

/// Loads a profile by name from the configured directory
pub fn load_profile(config_path: Option<&Path>, name: &str) -> Result<Profile, CliError> {
    let config_manager = create_config_manager(config_path)?;
    Ok(config_manager.find_profile(name)?)
}

/// Builds a command line from CLI arguments, followed by secret arguments
pub fn build_command(args: &[String], secrets: &[String], raw: bool) -> CmdLine {
    let mut command = CmdLine::new();
    for arg in args {
        if raw {
            command.add_raw(arg.as_str());
        } else {
            command.add_argument(arg.as_str());
        }
    }
    for secret in secrets {
        command.add_secret(secret.as_str());
    }
    command
}
