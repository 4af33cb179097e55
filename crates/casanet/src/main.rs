mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use casanet_core::Hub;

use crate::cli::{Cli, Command, TimingsCommand};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a hub connection
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "casanet", &mut std::io::stdout());
            Ok(())
        }

        // Reads the stored session only
        Command::Whoami => commands::session::whoami(&cli.global),

        // All other commands require a hub
        cmd => {
            let hub_config = config::build_hub_config(&cli.global, needs_feed(&cmd))?;
            let hub = Hub::new(hub_config)?;

            tracing::debug!(command = ?cmd, "dispatching command");
            let result = commands::dispatch(cmd, &hub, &cli.global).await;
            hub.shutdown();
            result
        }
    }
}

/// Only streaming timing commands keep the push feed open.
fn needs_feed(cmd: &Command) -> bool {
    matches!(
        cmd,
        Command::Timings(args) if matches!(args.command, TimingsCommand::Watch | TimingsCommand::Feed)
    )
}
