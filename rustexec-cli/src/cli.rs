//! CLI argument parsing types using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use rustexec_core::OperatingSystemFamily;

/// `RustExec` command-line interface for running commands on remote hosts
#[derive(Parser)]
#[command(name = "rustexec")]
#[command(author, version, about = "Run commands on remote hosts over WinRM and SSH")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration directory
    #[arg(short, long, global = true, env = "RUSTEXEC_CONFIG_DIR")]
    pub config: Option<PathBuf>,

    /// Increase output verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except remote output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Append log events to this file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run a command on the host of a profile
    #[command(about = "Run a command on a remote host and exit with its exit code")]
    Exec(ExecArgs),

    /// Print a rendered command line without running it
    #[command(about = "Render a command line for an operating system family")]
    Render {
        /// Operating system family to render for
        #[arg(long, value_enum, default_value = "unix")]
        os: OsArg,

        /// Render for logging, masking secrets
        #[arg(long)]
        logging: bool,

        /// Secret arguments appended after the command
        #[arg(long = "secret", value_name = "VALUE")]
        secrets: Vec<String>,

        /// Command and arguments
        #[arg(last = true, required = true)]
        args: Vec<String>,
    },

    /// Print the command a profile would run
    #[command(about = "Show how a command is composed for a profile")]
    Compose {
        /// Profile name
        profile: String,

        /// Command and arguments
        #[arg(last = true, required = true)]
        args: Vec<String>,
    },

    /// List all profiles
    #[command(about = "List all profiles in the configuration")]
    List {
        /// Output format for the profile list
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },

    /// Show profile details
    #[command(about = "Show details of a single profile")]
    Show {
        /// Profile name
        profile: String,

        /// Output format
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },

    /// Generate shell completions
    #[command(about = "Generate shell completion scripts")]
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments of the `exec` command
#[derive(Args)]
pub struct ExecArgs {
    /// Profile name
    pub profile: String,

    /// Secret arguments appended after the command; masked in logs
    #[arg(long = "secret", value_name = "VALUE")]
    pub secrets: Vec<String>,

    /// Pass every argument to the remote shell without escaping
    #[arg(long)]
    pub raw: bool,

    /// Run in this directory instead of the profile's working directory
    #[arg(short, long, value_name = "DIR")]
    pub workdir: Option<String>,

    /// Read the login password from the terminal
    #[arg(long)]
    pub password_prompt: bool,

    /// Collect all output and print it once the command finished
    #[arg(long)]
    pub capture: bool,

    /// Command and arguments
    #[arg(last = true, required = true)]
    pub args: Vec<String>,
}

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Display as formatted table
    Table,
    /// Output as JSON
    Json,
}

/// Operating system family options
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OsArg {
    /// Windows, double-quote escaping
    Windows,
    /// Unix, backslash escaping
    Unix,
    /// z/OS Unix System Services
    Zos,
}

impl From<OsArg> for OperatingSystemFamily {
    fn from(os: OsArg) -> Self {
        match os {
            OsArg::Windows => Self::Windows,
            OsArg::Unix => Self::Unix,
            OsArg::Zos => Self::Zos,
        }
    }
}
