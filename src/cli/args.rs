//! CLI argument parsing using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// homedash CLI - headless view of the dashboard widgets
#[derive(Parser, Debug, Clone)]
#[command(name = "homedash-cli")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Settings file (default: ~/.homedash/settings.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output as JSON lines (for scripting/parsing)
    #[arg(long, global = true)]
    pub json: bool,

    /// Show verbose output (debug information)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Log in and store the session
    Login {
        #[arg(short = 'u', long)]
        username: String,

        #[arg(short = 'p', long, env = "HOMEDASH_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Show who is logged in
    Whoami,

    /// Run all widgets and print every state change
    Watch {
        /// Print the first settled state of each widget and exit
        #[arg(long)]
        once: bool,
    },

    /// Shopping list operations
    List {
        #[command(subcommand)]
        action: ListCommand,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ListCommand {
    /// Print the list
    Show,
    /// Add an entry
    Add { content: String },
    /// Remove an entry by id
    Remove { id: String },
}
