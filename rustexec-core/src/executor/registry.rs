//! Lookup table from protocol id to executor constructor

use std::collections::HashMap;

use crate::config::Profile;
use crate::error::{ExecError, ExecResult};
use crate::ssh::SshConnection;
use crate::winrm::WinRmConnection;

use super::RemoteExecutor;

/// Builds an executor for a profile
pub type ExecutorConstructor = fn(&Profile) -> ExecResult<Box<dyn RemoteExecutor>>;

/// Maps protocol ids to executor constructors
///
/// The registry is an ordinary value: build it once and pass it to whoever
/// creates executors.
#[derive(Clone, Default)]
pub struct ExecutorRegistry {
    constructors: HashMap<&'static str, ExecutorConstructor>,
}

impl std::fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorRegistry")
            .field("protocols", &self.protocols())
            .finish()
    }
}

impl ExecutorRegistry {
    /// Creates an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the WinRM and SSH executors
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("winrm", winrm_executor);
        registry.register("ssh", ssh_executor);
        registry
    }

    /// Registers a constructor, replacing any previous one for `protocol_id`
    pub fn register(&mut self, protocol_id: &'static str, constructor: ExecutorConstructor) {
        if self.constructors.insert(protocol_id, constructor).is_some() {
            tracing::debug!(protocol = protocol_id, "Replaced executor constructor");
        }
    }

    /// Returns true if a constructor is registered for `protocol_id`
    #[must_use]
    pub fn contains(&self, protocol_id: &str) -> bool {
        self.constructors.contains_key(protocol_id)
    }

    /// Returns the registered protocol ids, sorted
    #[must_use]
    pub fn protocols(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = self.constructors.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Creates an executor for `profile`
    ///
    /// # Errors
    ///
    /// Returns `ExecError::InvalidConfiguration` if no constructor is
    /// registered for the profile's protocol, or the constructor's error.
    pub fn create(&self, profile: &Profile) -> ExecResult<Box<dyn RemoteExecutor>> {
        let protocol_id = profile.protocol_id();
        let constructor = self.constructors.get(protocol_id).ok_or_else(|| {
            ExecError::InvalidConfiguration(format!(
                "No executor registered for protocol '{protocol_id}'"
            ))
        })?;
        constructor(profile)
    }
}

fn winrm_executor(profile: &Profile) -> ExecResult<Box<dyn RemoteExecutor>> {
    Ok(Box::new(WinRmConnection::from_profile(profile)?))
}

fn ssh_executor(profile: &Profile) -> ExecResult<Box<dyn RemoteExecutor>> {
    Ok(Box::new(SshConnection::from_profile(profile)?))
}
