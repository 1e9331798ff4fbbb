//! Rewrites a command line according to connection semantics

use crate::automation::{PromptPattern, PromptResponder};
use crate::cmdline::CmdLine;
use crate::error::{ExecError, ExecResult};
use crate::tracing::span_names;

use super::context::{ConnectionContext, SshConnectionType};
use super::pty::{PtyRequest, PtySpec};

/// A command line ready for execution, plus what the session must provide
#[derive(Debug, Clone)]
pub struct ComposedCommand {
    /// The rewritten command line
    pub command: CmdLine,
    /// Pseudo-terminal to request, if any
    pub pty: Option<PtyRequest>,
    /// Responder to attach to the process output, if any
    pub prompt_responder: Option<PromptResponder>,
}

impl ComposedCommand {
    /// Returns true if the session needs a pseudo-terminal
    #[must_use]
    pub const fn requires_pty(&self) -> bool {
        self.pty.is_some()
    }
}

/// Composes `command` for execution over a connection described by `context`
///
/// The input is never modified. The result is, in order: a directory change
/// and command separator when a working directory is set, the escalation
/// prefix when the connection type escalates, then the original arguments
/// (as one nested argument when the escalated command is quoted).
///
/// # Errors
///
/// Returns `ExecError::InvalidConfiguration` if:
/// - The explicit pseudo-terminal specification is malformed
/// - An escalating connection has no target user
/// - Interactive escalation has no password, or its prompt pattern ends in
///   a wildcard or does not compile
pub fn compose(command: &CmdLine, context: &ConnectionContext) -> ExecResult<ComposedCommand> {
    let _span = tracing::debug_span!(
        span_names::COMMAND_COMPOSE,
        connection_type = %context.connection_type
    )
    .entered();

    let prompt_responder = prompt_responder(context)?;
    let pty = pty_request(context)?;

    let mut composed = CmdLine::new();
    if let Some(directory) = context.working_directory.as_deref() {
        composed
            .add_argument("cd")
            .add_argument(directory)
            .add_raw(context.os.command_separator());
    }

    if context.connection_type.escalates() {
        let escalation = &context.escalation;
        if escalation.target_user.is_empty() {
            return Err(ExecError::InvalidConfiguration(format!(
                "Cannot start a {} connection without a target user",
                context.connection_type
            )));
        }
        for argument in escalation.prefix_arguments() {
            composed.add_argument(argument);
        }
        if escalation.quote_command {
            composed.add_nested(command.clone());
        } else {
            composed.extend(command.arguments().iter().cloned());
        }
    } else {
        composed.extend(command.arguments().iter().cloned());
    }

    tracing::debug!(
        command = %composed,
        pty = pty.is_some(),
        prompt_responder = prompt_responder.is_some(),
        "Command composed"
    );

    Ok(ComposedCommand {
        command: composed,
        pty,
        prompt_responder,
    })
}

fn prompt_responder(context: &ConnectionContext) -> ExecResult<Option<PromptResponder>> {
    if context.connection_type != SshConnectionType::InteractiveSudo {
        return Ok(None);
    }

    let pattern = PromptPattern::new(&context.escalation.password_prompt_regex)?;
    let password = context.password.clone().ok_or_else(|| {
        ExecError::InvalidConfiguration(format!(
            "Cannot start a {} connection without a password",
            context.connection_type
        ))
    })?;

    Ok(Some(PromptResponder::new(pattern, password)))
}

fn pty_request(context: &ConnectionContext) -> ExecResult<Option<PtyRequest>> {
    let explicit = context
        .allocate_pty
        .as_deref()
        .filter(|spec| !spec.is_empty())
        .map(str::parse::<PtySpec>)
        .transpose()?;

    match explicit {
        Some(spec) => {
            if context.allocate_default_pty {
                tracing::warn!(
                    "Both allocate_default_pty and allocate_pty are set, using allocate_pty"
                );
            }
            Ok(Some(PtyRequest::Explicit(spec)))
        }
        None if context.allocate_default_pty => Ok(Some(PtyRequest::Default)),
        None if context.connection_type == SshConnectionType::InteractiveSudo => {
            tracing::warn!("Interactive sudo requires a PTY, allocating a default one");
            Ok(Some(PtyRequest::Default))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::cmdline::OperatingSystemFamily;
    use crate::compose::EscalationSettings;

    fn unix() -> ConnectionContext {
        ConnectionContext::new(OperatingSystemFamily::Unix)
    }

    fn render(composed: &ComposedCommand) -> String {
        composed.command.render(OperatingSystemFamily::Unix, false)
    }

    #[test]
    fn test_direct_is_unchanged() {
        let command = CmdLine::build(["ls", "-l"]);
        let composed = compose(&command, &unix()).unwrap();
        assert_eq!(composed.command, command);
        assert!(!composed.requires_pty());
        assert!(composed.prompt_responder.is_none());
    }

    #[test]
    fn test_working_directory_prefix() {
        let command = CmdLine::build(["ls"]);
        let composed = compose(&command, &unix().with_working_directory("/var/log")).unwrap();
        assert_eq!(render(&composed), "cd /var/log ; ls");
        assert_eq!(command.len(), 1);
    }

    #[test]
    fn test_working_directory_on_windows() {
        let context =
            ConnectionContext::new(OperatingSystemFamily::Windows).with_working_directory("C:\\Temp");
        let composed = compose(&CmdLine::build(["dir"]), &context).unwrap();
        assert_eq!(
            composed.command.render(OperatingSystemFamily::Windows, false),
            "cd \"C:\\Temp\" && dir"
        );
    }

    #[test]
    fn test_sudo_prefix() {
        let context = unix()
            .with_connection_type(SshConnectionType::Sudo)
            .with_escalation(EscalationSettings::new("deploy"));
        let composed = compose(&CmdLine::build(["whoami"]), &context).unwrap();
        assert_eq!(render(&composed), "sudo -u deploy whoami");
        assert!(!composed.requires_pty());
    }

    #[test]
    fn test_quoted_sudo_command_is_nested() {
        let context = unix()
            .with_connection_type(SshConnectionType::Sudo)
            .with_escalation(
                EscalationSettings::new("root")
                    .with_command_prefix("sudo -u {0} sh -c")
                    .with_quote_command(true),
            );
        let composed = compose(&CmdLine::build(["echo", "hi"]), &context).unwrap();
        assert_eq!(composed.command.len(), 6);
        assert_eq!(render(&composed), "sudo -u root sh -c echo\\ hi");
    }

    #[test]
    fn test_sudo_without_target_user() {
        let context = unix()
            .with_connection_type(SshConnectionType::Sudo)
            .with_escalation(EscalationSettings::new(""));
        assert!(matches!(
            compose(&CmdLine::build(["id"]), &context),
            Err(ExecError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_interactive_sudo_forces_default_pty() {
        let context = unix()
            .with_connection_type(SshConnectionType::InteractiveSudo)
            .with_password(SecretString::from("pw"));
        let composed = compose(&CmdLine::build(["id"]), &context).unwrap();
        assert_eq!(composed.pty, Some(PtyRequest::Default));
        assert!(composed.prompt_responder.is_some());
    }

    #[test]
    fn test_interactive_sudo_requires_password() {
        let context = unix().with_connection_type(SshConnectionType::InteractiveSudo);
        assert!(matches!(
            compose(&CmdLine::build(["id"]), &context),
            Err(ExecError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_interactive_sudo_rejects_wildcard_prompt() {
        for pattern in [".*[Pp]assword.*", "Password:?"] {
            let context = unix()
                .with_connection_type(SshConnectionType::InteractiveSudo)
                .with_password(SecretString::from("pw"))
                .with_escalation(EscalationSettings::new("root").with_password_prompt_regex(pattern));
            assert!(matches!(
                compose(&CmdLine::build(["id"]), &context),
                Err(ExecError::InvalidConfiguration(_))
            ));
        }
    }

    #[test]
    fn test_explicit_pty_wins_over_default() {
        let context = unix()
            .with_default_pty(true)
            .with_pty("vt220:80:24:0:0");
        let composed = compose(&CmdLine::build(["top"]), &context).unwrap();
        assert!(matches!(composed.pty, Some(PtyRequest::Explicit(ref spec)) if spec.term == "vt220"));
    }

    #[test]
    fn test_malformed_pty_rejected() {
        let context = unix().with_pty("80x24");
        assert!(matches!(
            compose(&CmdLine::build(["top"]), &context),
            Err(ExecError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_secret_stays_masked_after_composition() {
        let mut command = CmdLine::build(["login"]);
        command.add_secret("hunter2");
        let context = unix()
            .with_connection_type(SshConnectionType::Sudo)
            .with_escalation(EscalationSettings::new("root").with_quote_command(true));
        let composed = compose(&command, &context).unwrap();
        let logged = composed.command.render(OperatingSystemFamily::Unix, true);
        assert!(!logged.contains("hunter2"));
    }
}
