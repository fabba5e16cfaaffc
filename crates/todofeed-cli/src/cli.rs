//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// todofeed - turn your todos into calendar feeds
#[derive(Debug, Parser)]
#[command(name = "todofeed")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "TODOFEED_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Note API base URL, overrides the config file
    #[arg(long, env = "TODOFEED_API_BASE")]
    pub api_base: Option<String>,

    /// Note API token, overrides the config file
    #[arg(long, env = "TODOFEED_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sync all configured calendars once and exit
    Sync,

    /// Run the background sync daemon
    Daemon,

    /// Show the result of the last sync and the stored feeds
    Status,

    /// Fetch one calendar and print its feed to stdout
    Render {
        /// Calendar name from the config (defaults to the first one)
        calendar: Option<String>,

        /// Read todos from a JSON file instead of the API
        #[arg(long, short)]
        input: Option<PathBuf>,

        /// Write the feed to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}
