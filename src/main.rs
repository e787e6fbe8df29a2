//! Telemark - Main Entry Point
//!
//! Subscription prediction service with CLI and server modes.

use clap::Parser;
use telemark::cli::{cmd_predict, cmd_schema, cmd_serve, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "telemark=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, host, model, data } => {
            cmd_serve(&host, port, &model, &data).await?;
        }
        Commands::Predict { model, data, input } => {
            cmd_predict(&model, &data, &input)?;
        }
        Commands::Schema { model, data } => {
            cmd_schema(&model, &data)?;
        }
    }

    Ok(())
}
