//! Integration tests for profile persistence and executor selection

use rustexec_core::compose::SshConnectionType;
use rustexec_core::config::{SshSettings, WinRmSettings};
use rustexec_core::{
    CmdLine, ConfigError, ConfigManager, ExecError, ExecutorRegistry, OperatingSystemFamily,
    Profile, ProtocolSettings,
};
use secrecy::{ExposeSecret, SecretString};
use tempfile::TempDir;

const PROFILES: &str = r#"
[[profiles]]
name = "build"
host = "win01.example.com"
username = "Administrator"
password = "hunter2"
os = "windows"
working_directory = 'C:\build'

[profiles.protocol]
type = "winrm"
https = true
timeout = "PT120S"

[[profiles]]
name = "db"
host = "db01.example.com"
port = 2222
username = "deploy"
password = "s3cret"

[profiles.protocol]
type = "ssh"
connection_type = "interactive_sudo"
sudo_username = "postgres"
sudo_password_prompt_regex = "\\[sudo\\] password for .*:"
"#;

fn manager_with(content: &str) -> (TempDir, ConfigManager) {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("profiles.toml"), content).unwrap();
    let manager = ConfigManager::with_config_dir(dir.path().to_path_buf());
    (dir, manager)
}

#[test]
fn test_hand_written_profiles_load() {
    let (_dir, manager) = manager_with(PROFILES);
    let profiles = manager.load_profiles().unwrap();
    assert_eq!(profiles.len(), 2);

    let build = &profiles[0];
    assert_eq!(build.os, OperatingSystemFamily::Windows);
    assert_eq!(build.effective_port(), 5986);
    assert!(matches!(
        build.protocol,
        ProtocolSettings::WinRm(WinRmSettings { https: true, ref timeout, .. }) if timeout == "PT120S"
    ));

    let db = &profiles[1];
    assert_eq!(db.effective_port(), 2222);
    assert_eq!(db.os, OperatingSystemFamily::Unix);
    assert!(matches!(
        db.protocol,
        ProtocolSettings::Ssh(SshSettings {
            connection_type: SshConnectionType::InteractiveSudo,
            ..
        })
    ));
}

#[test]
fn test_profile_context_composes_escalation() {
    let (_dir, manager) = manager_with(PROFILES);
    let db = manager.find_profile("DB").unwrap();

    let composed =
        rustexec_core::compose(&CmdLine::build(["psql", "-c", "select 1"]), &db.connection_context())
            .unwrap();

    assert_eq!(
        composed.command.render(OperatingSystemFamily::Unix, false),
        "sudo -u postgres psql -c select\\ 1"
    );
    assert!(composed.requires_pty());
    assert!(composed.prompt_responder.is_some());
}

#[test]
fn test_registry_builds_executor_per_protocol() {
    let (_dir, manager) = manager_with(PROFILES);
    let registry = ExecutorRegistry::with_defaults();

    for profile in manager.load_profiles().unwrap() {
        let executor = registry.create(&profile).unwrap();
        assert_eq!(executor.protocol_id(), profile.protocol_id());
        assert_eq!(executor.os(), profile.os);
    }
}

#[test]
fn test_winrm_profile_for_unix_host_is_rejected() {
    let mut profile =
        Profile::winrm("odd", "linux01", "root").with_password(SecretString::from("pw"));
    profile.os = OperatingSystemFamily::Unix;

    let result = ExecutorRegistry::with_defaults().create(&profile);
    assert!(matches!(result, Err(ExecError::InvalidConfiguration(_))));
}

#[test]
fn test_save_then_find_keeps_password() {
    let dir = TempDir::new().unwrap();
    let manager = ConfigManager::with_config_dir(dir.path().join("nested").join("rustexec"));
    let profile = Profile::ssh("web", "web01", "deploy").with_password(SecretString::from("pw"));

    manager.save_profiles(&[profile]).unwrap();
    let found = manager.find_profile("web").unwrap();

    assert_eq!(found.password.unwrap().expose_secret(), "pw");
}

#[test]
fn test_unknown_profile() {
    let (_dir, manager) = manager_with(PROFILES);
    assert!(matches!(
        manager.find_profile("missing"),
        Err(ConfigError::ProfileNotFound(ref name)) if name == "missing"
    ));
}
