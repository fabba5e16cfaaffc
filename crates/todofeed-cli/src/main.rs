//! todofeed CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use todofeed_cli::cli::{Cli, Command};
use todofeed_cli::config::CliConfig;
use todofeed_cli::error::CliResult;
use todofeed_core::{TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = match (&cli.command, cli.debug) {
        (Command::Daemon, _) => TracingConfig::daemon(),
        (_, true) => TracingConfig::cli_debug(),
        (_, false) => TracingConfig::default(),
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("error: {e}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = match cli.config {
        Some(ref path) => CliConfig::load_from(path)?,
        None => CliConfig::load()?,
    };

    match cli.command {
        Command::Sync => {
            let api = config.api_config(cli.api_base.as_deref(), cli.token.as_deref())?;
            todofeed_cli::commands::sync::run(&config, api).await
        }
        Command::Daemon => {
            let api = config.api_config(cli.api_base.as_deref(), cli.token.as_deref())?;
            todofeed_cli::commands::daemon::run(&config, api).await
        }
        Command::Status => todofeed_cli::commands::status::run(&config),
        Command::Render { calendar, input, output } => {
            // A local input file needs no API credentials.
            let api = match input {
                Some(_) => None,
                None => Some(config.api_config(cli.api_base.as_deref(), cli.token.as_deref())?),
            };
            todofeed_cli::commands::render::run(
                &config,
                api,
                calendar.as_deref(),
                input.as_deref(),
                output.as_deref(),
            )
            .await
        }
    }
}
