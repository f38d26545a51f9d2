//! Server configuration

use crate::cli::ConfigOverrides;
use anyhow::Context;
use pokedex_classifier::upload::DEFAULT_MAX_UPLOAD_BYTES;
use pokedex_classifier::{ModelConfig, ModelConfigSpec, UploadLimits};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Page served at `/`
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    /// Directory served under `/static`
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// Largest accepted upload, in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    #[serde(default)]
    pub cors: CorsConfig,

    #[serde(default)]
    pub inference: InferenceConfig,

    #[serde(default)]
    pub model: ModelConfigSpec,
}

impl ServerConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: &Path, overrides: &ConfigOverrides) -> anyhow::Result<Self> {
        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("failed to read {}", config_path.display()))?;
            Self::from_yaml(&content)
                .with_context(|| format!("invalid configuration in {}", config_path.display()))?
        } else {
            Self::default()
        };

        config.apply(overrides);
        Ok(config)
    }

    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(host) = &overrides.host {
            self.host = host.clone();
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(url) = &overrides.model_url {
            self.model.url = Some(url.clone());
        }
        if let Some(dir) = &overrides.model_dir {
            self.model.dir = dir.clone();
        }
    }

    /// `host:port` the listener binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn upload_limits(&self) -> UploadLimits {
        UploadLimits {
            max_bytes: self.max_upload_bytes,
        }
    }

    pub fn model_config(&self) -> pokedex_core::Result<ModelConfig> {
        self.model.to_model_config(self.inference.top_k)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            index_path: default_index_path(),
            static_dir: default_static_dir(),
            max_upload_bytes: default_max_upload_bytes(),
            cors: CorsConfig::default(),
            inference: InferenceConfig::default(),
            model: ModelConfigSpec::default(),
        }
    }
}

/// Cross-origin policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins; `*` allows any
    #[serde(default = "default_allow_origins")]
    pub allow_origins: Vec<String>,
}

impl CorsConfig {
    pub fn allows_any_origin(&self) -> bool {
        self.allow_origins.iter().any(|o| o == "*")
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origins: default_allow_origins(),
        }
    }
}

/// Inference worker settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Concurrent inferences; defaults to the CPU count
    #[serde(default)]
    pub workers: Option<usize>,

    /// Ranked labels kept per prediction
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl InferenceConfig {
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get).max(1)
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            workers: None,
            top_k: default_top_k(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_index_path() -> PathBuf {
    PathBuf::from("app/view/index.html")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("app/static")
}

fn default_max_upload_bytes() -> usize {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_allow_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_top_k() -> usize {
    5
}
