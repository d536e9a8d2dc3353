//! Mushroom Lab - Main Entry Point
//!
//! Rule-based edibility checks and classifier evaluation, with CLI and
//! server modes.

use clap::Parser;
use mushroom_lab::cli::{cmd_classify, cmd_compare, cmd_evaluate, cmd_rules, cmd_serve, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mushroom_lab=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.pipeline_config();

    match cli.command {
        Commands::Classify { odor, bruises, gill_color, cap_shape, cap_surface, cap_color, json } => {
            cmd_classify(&odor, &bruises, &gill_color, &cap_shape, &cap_surface, &cap_color, json)?;
        }
        Commands::Rules => {
            cmd_rules()?;
        }
        Commands::Evaluate { data, model, diagnostics, output, json } => {
            cmd_evaluate(config, &data, &model, &diagnostics, output.as_deref(), json)?;
        }
        Commands::Compare { data, json } => {
            cmd_compare(config, &data, json)?;
        }
        Commands::Serve { port, host } => {
            cmd_serve(config, &host, port).await?;
        }
    }

    Ok(())
}
