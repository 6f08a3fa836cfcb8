mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ouman_api::OumanClient;

use crate::cli::{Cli, Command};
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
    let cfg = config::load_config_or_default();
    let mut global = cli.global;
    global.output = Some(config::output_format(&global, &cfg));

    match cli.command {
        // Definition listings don't need a device connection
        Command::Registries => {
            commands::registries::handle(&global);
            Ok(())
        }
        Command::Endpoints(args) => commands::endpoints::handle(&args, &global),

        // All other commands require a logged-in session
        cmd => {
            let settings = config::resolve_connection(&global, &cfg)?;
            let client = OumanClient::new(
                settings.base_url,
                settings.username,
                settings.password,
                &settings.transport,
            )?;

            client.login().await?;
            tracing::debug!(command = ?cmd, "dispatching command");
            let result = commands::dispatch(cmd, &client, &global).await;

            if let Err(e) = client.logout().await {
                tracing::warn!(error = %e, "logout failed");
            }
            result
        }
    }
}
