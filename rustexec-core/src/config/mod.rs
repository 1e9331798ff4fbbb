//! Configuration management for `RustExec`
//!
//! Connection profiles live in `profiles.toml` under the platform
//! configuration directory (or a directory given explicitly).

mod manager;
mod profile;

pub use manager::{CONFIG_DIR_NAME, ConfigManager, PROFILES_FILE};
pub use profile::{
    DEFAULT_WINRM_CONTEXT, Profile, ProtocolSettings, SSH_PORT, SshSettings, WINRM_HTTP_PORT,
    WINRM_HTTPS_PORT, WinRmSettings,
};
