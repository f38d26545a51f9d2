//! Shared application state

use crate::config::ServerConfig;
use metrics_exporter_prometheus::PrometheusHandle;
use pokedex_classifier::{ImageClassifier, InferencePool, UploadLimits};
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub pool: Arc<InferencePool>,
    pub metrics_handle: Option<PrometheusHandle>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: ServerConfig, classifier: Arc<dyn ImageClassifier>) -> Self {
        let workers = config.inference.worker_count();
        Self {
            config: Arc::new(config),
            pool: Arc::new(InferencePool::new(classifier, workers)),
            metrics_handle: None,
            started_at: Instant::now(),
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    pub fn upload_limits(&self) -> UploadLimits {
        self.config.upload_limits()
    }
}
