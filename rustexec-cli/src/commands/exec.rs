//! Exec command: runs a command through a profile.

use std::path::Path;

use rustexec_core::{
    CapturedLine, CapturingOutputHandler, ExecutorRegistry, StreamingOutputHandler,
};
use secrecy::SecretString;

use crate::cli::ExecArgs;
use crate::error::CliError;
use crate::util::{build_command, load_profile};

/// Exec command handler
///
/// Returns the exit code of the remote command.
pub fn cmd_exec(config_path: Option<&Path>, args: &ExecArgs) -> Result<i32, CliError> {
    let mut profile = load_profile(config_path, &args.profile)?;

    if let Some(ref directory) = args.workdir {
        profile.working_directory = Some(directory.clone());
    }

    if args.password_prompt {
        eprint!("Password for {}@{}: ", profile.username, profile.host);
        let password = rpassword::read_password()?;
        profile.password = Some(SecretString::from(password));
    }

    let command = build_command(&args.args, &args.secrets, args.raw);
    let executor = ExecutorRegistry::with_defaults().create(&profile)?;

    tracing::info!(
        profile = %profile.name,
        protocol = executor.protocol_id(),
        command = %command.render(profile.os, true),
        "Executing remote command"
    );

    let exit_code = if args.capture {
        let mut handler = CapturingOutputHandler::new();
        let exit_code = executor.execute(&command, &mut handler)?;
        print_captured(handler.lines());
        exit_code
    } else {
        executor.execute(&command, &mut StreamingOutputHandler)?
    };

    tracing::info!(exit_code, "Remote command finished");
    Ok(exit_code)
}

/// Prints captured output in arrival order
fn print_captured(lines: &[CapturedLine]) {
    for line in lines {
        match line {
            CapturedLine::Output(text) => println!("{text}"),
            CapturedLine::Error(text) => eprintln!("{text}"),
        }
    }
}
