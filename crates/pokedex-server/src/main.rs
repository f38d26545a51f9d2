//! Pokedex
//!
//! Serves an upload page and classifies submitted images with a ResNet
//! model that is fetched on first start.

use clap::Parser;
use pokedex_classifier::ImageClassifier;
use pokedex_server::telemetry::{init_metrics, init_tracing};
use pokedex_server::{provision_model, run_server, Cli, Commands, ServerConfig};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = ServerConfig::load(&cli.config, &cli.command.overrides())?;
    info!("Configuration loaded from {}", cli.config.display());

    let classifier = provision_model(&config).await?;
    info!(
        "Model {} ready with {} labels",
        classifier.name(),
        classifier.labels().len()
    );

    match cli.command {
        Commands::Provision { .. } => {
            info!("Model available at {}", config.model.destination().display());
        }
        Commands::Serve { .. } => {
            let metrics_handle = init_metrics()?;
            run_server(config, Arc::new(classifier), Some(metrics_handle)).await?;
        }
    }

    Ok(())
}
