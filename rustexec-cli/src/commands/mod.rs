//! Command handler modules for the CLI.

mod completions;
mod compose;
mod exec;
mod list;
mod render;
mod show;

use std::path::Path;

use crate::cli::Commands;
use crate::error::CliError;

/// Dispatch a CLI command to the appropriate handler.
///
/// Returns the process exit code: the remote exit code for `exec`, zero for
/// every other command.
pub fn dispatch(config_path: Option<&Path>, command: Commands) -> Result<i32, CliError> {
    match command {
        Commands::Exec(args) => exec::cmd_exec(config_path, &args),
        Commands::Render {
            os,
            logging,
            secrets,
            args,
        } => render::cmd_render(os.into(), logging, &args, &secrets).map(|()| 0),
        Commands::Compose { profile, args } => {
            compose::cmd_compose(config_path, &profile, &args).map(|()| 0)
        }
        Commands::List { format } => list::cmd_list(config_path, format).map(|()| 0),
        Commands::Show { profile, format } => {
            show::cmd_show(config_path, &profile, format).map(|()| 0)
        }
        Commands::Completions { shell } => completions::cmd_completions(shell).map(|()| 0),
    }
}
