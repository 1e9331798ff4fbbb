//! Loading and saving connection profiles

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::compose::SshConnectionType;
use crate::error::{ConfigError, ConfigResult};
use crate::tracing::span_names;

use super::profile::{Profile, ProtocolSettings};

/// Directory name under the platform configuration directory
pub const CONFIG_DIR_NAME: &str = "rustexec";

/// File holding the profiles
pub const PROFILES_FILE: &str = "profiles.toml";

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProfilesFile {
    #[serde(default)]
    profiles: Vec<Profile>,
}

/// Reads and writes `profiles.toml` in a configuration directory
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Creates a manager for the platform configuration directory
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoConfigDir` if the platform has no
    /// configuration directory.
    pub fn new() -> ConfigResult<Self> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NoConfigDir)?
            .join(CONFIG_DIR_NAME);
        Ok(Self { config_dir })
    }

    /// Creates a manager for an explicit directory
    #[must_use]
    pub const fn with_config_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Returns the configuration directory
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Returns the path of the profiles file
    #[must_use]
    pub fn profiles_path(&self) -> PathBuf {
        self.config_dir.join(PROFILES_FILE)
    }

    /// Loads all profiles; a missing file yields none
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_profiles(&self) -> ConfigResult<Vec<Profile>> {
        let path = self.profiles_path();
        let _span = tracing::debug_span!(span_names::CONFIG_LOAD, path = %path.display()).entered();

        if !path.exists() {
            tracing::debug!("No profiles file, starting empty");
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path)?;
        let file: ProfilesFile = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("{}: {e}", path.display())))?;

        tracing::debug!(count = file.profiles.len(), "Profiles loaded");
        Ok(file.profiles)
    }

    /// Validates and writes all profiles, creating the directory if needed
    ///
    /// # Errors
    ///
    /// Returns an error if a profile is invalid, names are duplicated, or
    /// the file cannot be written.
    pub fn save_profiles(&self, profiles: &[Profile]) -> ConfigResult<()> {
        let path = self.profiles_path();
        let _span = tracing::debug_span!(span_names::CONFIG_SAVE, path = %path.display()).entered();

        for (index, profile) in profiles.iter().enumerate() {
            Self::validate_profile(profile)?;
            if profiles[..index].iter().any(|p| p.name == profile.name) {
                return Err(ConfigError::Validation(format!(
                    "Duplicate profile name '{}'",
                    profile.name
                )));
            }
        }

        let file = ProfilesFile {
            profiles: profiles.to_vec(),
        };
        let content =
            toml::to_string_pretty(&file).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        fs::create_dir_all(&self.config_dir)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Finds a profile by name, exact match first, then case-insensitive
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ProfileNotFound` if no profile matches, or a
    /// load error.
    pub fn find_profile(&self, name: &str) -> ConfigResult<Profile> {
        let profiles = self.load_profiles()?;
        Self::select_profile(profiles, name)
    }

    fn select_profile(mut profiles: Vec<Profile>, name: &str) -> ConfigResult<Profile> {
        let index = profiles
            .iter()
            .position(|p| p.name == name)
            .or_else(|| {
                profiles
                    .iter()
                    .position(|p| p.name.eq_ignore_ascii_case(name))
            })
            .ok_or_else(|| ConfigError::ProfileNotFound(name.to_string()))?;
        Ok(profiles.swap_remove(index))
    }

    /// Checks the fields every profile needs
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` describing the first problem found.
    pub fn validate_profile(profile: &Profile) -> ConfigResult<()> {
        if profile.name.trim().is_empty() {
            return Err(ConfigError::Validation("Profile name is empty".to_string()));
        }
        if profile.host.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Profile '{}' has no host",
                profile.name
            )));
        }
        if profile.username.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Profile '{}' has no username",
                profile.name
            )));
        }
        if let ProtocolSettings::Ssh(ssh) = &profile.protocol
            && ssh.connection_type != SshConnectionType::Direct
            && ssh.sudo_username.as_deref().is_none_or(str::is_empty)
        {
            return Err(ConfigError::Validation(format!(
                "Profile '{}' uses {} without sudo_username",
                profile.name, ssh.connection_type
            )));
        }
        Ok(())
    }
}
