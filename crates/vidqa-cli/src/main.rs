//! CLI entry point.
//!
//! Loads `.env`, parses arguments, initialises tracing, then hands off to
//! bootstrap and the command handlers.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use vidqa_cli::{Cli, CliError, Commands, bootstrap, handlers, load_settings};

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // Logs go to stderr so stdout carries only JSON results
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = load_settings(cli.config.as_deref(), &cli.settings.to_settings())?;
    let ctx = bootstrap(settings, cli.transcripts.as_deref())?;

    let result = match cli.command {
        Commands::Serve => handlers::serve::execute(&ctx).await,
        Commands::Batch { file } => handlers::batch::execute(&ctx, file.as_deref()).await,
        command => handlers::run_query(&ctx, command).await,
    };

    ctx.shutdown().await;
    result
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(e.downcast_ref::<CliError>().map_or(1, CliError::exit_code))
        }
    }
}
