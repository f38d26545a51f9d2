use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pokedex")]
#[command(author, version, about = "Classify uploaded images with a pretrained ResNet")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "POKEDEX_CONFIG", default_value = "pokedex.yaml", global = true)]
    pub config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Provision the model, then serve HTTP
    Serve {
        /// Listen address
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Listen port
        #[arg(short, long)]
        port: Option<u16>,

        /// Model artifact URL
        #[arg(long)]
        model_url: Option<String>,

        /// Directory the model artifact is stored in
        #[arg(long)]
        model_dir: Option<PathBuf>,
    },

    /// Download and load the model, then exit
    Provision {
        /// Model artifact URL
        #[arg(long)]
        model_url: Option<String>,

        /// Directory the model artifact is stored in
        #[arg(long)]
        model_dir: Option<PathBuf>,
    },
}

/// Values from the command line that take precedence over the config file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub model_url: Option<String>,
    pub model_dir: Option<PathBuf>,
}

impl Commands {
    pub fn overrides(&self) -> ConfigOverrides {
        match self {
            Commands::Serve {
                host,
                port,
                model_url,
                model_dir,
            } => ConfigOverrides {
                host: host.clone(),
                port: *port,
                model_url: model_url.clone(),
                model_dir: model_dir.clone(),
            },
            Commands::Provision {
                model_url,
                model_dir,
            } => ConfigOverrides {
                model_url: model_url.clone(),
                model_dir: model_dir.clone(),
                ..Default::default()
            },
        }
    }
}
