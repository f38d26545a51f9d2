//! Model loading for Candle-based image classifiers

use candle_core::{DType, Device};
use candle_nn::{Func, VarBuilder};
use candle_transformers::models::resnet;
use pokedex_core::{Error, LabelSet, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// Substrings in backend errors that mean the artifact cannot run on this host
const INCOMPATIBLE_MARKERS: &[&str] = &[
    "has not been built with",
    "unsupported dtype",
    "cuda_error_no_device",
    "no cuda-capable device",
];

const INCOMPATIBLE_REMEDIATION: &str = "This model artifact needs a compute backend that is not available in this build or on this host.\n\nSet `model.device: cpu` in the service configuration, or rebuild the service with the matching Candle backend (cuda/metal) and run it on a host with that hardware.\n\nIf the weights were exported for an accelerator only, export them again as float32 SafeTensors.";

/// Configuration for loading a classifier model
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Where the weights come from
    pub source: ModelSource,

    /// Local path the weights live at once provisioned
    pub weights_path: PathBuf,

    /// Network architecture the weights belong to
    pub architecture: Architecture,

    /// Model format (SafeTensors, PyTorch)
    pub format: ModelFormat,

    /// Device to run inference on
    pub device: DeviceType,

    /// Tensor name prefix the architecture lives under, if any
    pub weights_prefix: Option<String>,

    /// Square input resolution fed to the network
    pub image_size: usize,

    /// Number of ranked labels kept per classification
    pub top_k: usize,

    /// Class labels in output order
    pub labels: LabelSet,
}

/// Source location for model weights
#[derive(Debug, Clone)]
pub enum ModelSource {
    /// Weights must already exist at `weights_path`
    LocalPath,

    /// Download from a URL when `weights_path` is absent
    Remote {
        url: String,
        sha256: Option<String>,
    },
}

/// Device type for inference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    /// CPU inference (always available)
    Cpu,
    /// CUDA GPU inference (if available)
    Cuda(usize), // GPU index
    /// Metal (Apple Silicon)
    Metal(usize),
}

/// Model file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    /// SafeTensors format (recommended)
    SafeTensors,
    /// PyTorch format
    PyTorch,
}

impl ModelFormat {
    /// Infer the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("safetensors") => Some(Self::SafeTensors),
            Some("pt") | Some("pth") | Some("bin") => Some(Self::PyTorch),
            _ => None,
        }
    }
}

/// Supported classifier backbones
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    Resnet18,
    Resnet34,
    Resnet50,
}

impl Architecture {
    /// Build the network with a classification head of `num_classes`
    pub fn build(
        self,
        num_classes: usize,
        vb: VarBuilder<'static>,
    ) -> candle_core::Result<Func<'static>> {
        match self {
            Self::Resnet18 => resnet::resnet18(num_classes, vb),
            Self::Resnet34 => resnet::resnet34(num_classes, vb),
            Self::Resnet50 => resnet::resnet50(num_classes, vb),
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Resnet18 => "resnet18",
            Self::Resnet34 => "resnet34",
            Self::Resnet50 => "resnet50",
        };
        f.write_str(name)
    }
}

impl ModelConfig {
    /// Create a configuration for weights that already exist locally
    pub fn from_local(path: impl Into<PathBuf>) -> Self {
        let weights_path = path.into();
        Self {
            source: ModelSource::LocalPath,
            format: ModelFormat::from_path(&weights_path).unwrap_or(ModelFormat::SafeTensors),
            weights_path,
            architecture: Architecture::Resnet34,
            device: DeviceType::Cpu,
            weights_prefix: None,
            image_size: 224,
            top_k: 5,
            labels: LabelSet::builtin(),
        }
    }

    /// Create a configuration that downloads `url` to `path` when absent
    pub fn from_url(url: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            source: ModelSource::Remote {
                url: url.into(),
                sha256: None,
            },
            ..Self::from_local(path)
        }
    }

    /// Require the artifact to match a SHA-256 digest
    pub fn with_sha256(mut self, digest: impl Into<String>) -> Self {
        if let ModelSource::Remote { url, .. } = self.source {
            self.source = ModelSource::Remote {
                url,
                sha256: Some(digest.into()),
            };
        }
        self
    }

    /// Set architecture
    pub fn with_architecture(mut self, architecture: Architecture) -> Self {
        self.architecture = architecture;
        self
    }

    /// Set device
    pub fn with_device(mut self, device: DeviceType) -> Self {
        self.device = device;
        self
    }

    /// Set model format
    pub fn with_format(mut self, format: ModelFormat) -> Self {
        self.format = format;
        self
    }

    /// Set label set
    pub fn with_labels(mut self, labels: LabelSet) -> Self {
        self.labels = labels;
        self
    }

    /// Set input resolution
    pub fn with_image_size(mut self, size: usize) -> Self {
        self.image_size = size;
        self
    }

    /// Set how many ranked labels to keep
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set tensor name prefix
    pub fn with_weights_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.weights_prefix = Some(prefix.into());
        self
    }
}

/// Model weights loaded onto a device, ready to be assembled into a network
pub struct LoadedModel {
    /// VarBuilder for loading model weights
    var_builder: VarBuilder<'static>,

    /// Device the model is on
    device: Device,

    /// Model weights path (for reference)
    weights_path: PathBuf,
}

impl LoadedModel {
    /// Load weights from configuration
    pub fn load(config: &ModelConfig) -> Result<Self> {
        let weights_path = config.weights_path.clone();
        if !weights_path.exists() {
            return Err(Error::config(format!(
                "Model file not found: {}",
                weights_path.display()
            )));
        }

        let device = create_device(config.device)?;

        let var_builder = match config.format {
            ModelFormat::SafeTensors => {
                let tensors = candle_core::safetensors::load(&weights_path, &device)
                    .map_err(|e| load_error("Failed to load SafeTensors", e))?;
                VarBuilder::from_tensors(tensors, DType::F32, &device)
            }
            ModelFormat::PyTorch => VarBuilder::from_pth(&weights_path, DType::F32, &device)
                .map_err(|e| load_error("Failed to load PyTorch weights", e))?,
        };

        let var_builder = match &config.weights_prefix {
            Some(prefix) => var_builder.pp(prefix.clone()),
            None => var_builder,
        };

        tracing::debug!(
            "Loaded {:?} weights from {} onto {:?}",
            config.format,
            weights_path.display(),
            device
        );

        Ok(Self {
            var_builder,
            device,
            weights_path,
        })
    }

    /// Get reference to VarBuilder for building model layers
    pub fn var_builder(&self) -> &VarBuilder<'static> {
        &self.var_builder
    }

    /// Get reference to the device
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Get weights path
    pub fn weights_path(&self) -> &Path {
        &self.weights_path
    }
}

/// Create Candle device from device type
pub fn create_device(device_type: DeviceType) -> Result<Device> {
    match device_type {
        DeviceType::Cpu => Ok(Device::Cpu),
        DeviceType::Cuda(idx) => {
            Device::new_cuda(idx).map_err(|e| load_error("Failed to create CUDA device", e))
        }
        DeviceType::Metal(idx) => {
            Device::new_metal(idx).map_err(|e| load_error("Failed to create Metal device", e))
        }
    }
}

/// Map a backend failure during loading onto the provisioning taxonomy.
///
/// Host/backend mismatches become [`Error::IncompatibleArtifact`] with an
/// operator-facing remediation; everything else stays a plain model error.
pub fn load_error(context: &str, err: impl fmt::Display) -> Error {
    let details = format!("{}: {}", context, err);
    if is_environment_mismatch(&details) {
        Error::IncompatibleArtifact {
            details,
            remediation: INCOMPATIBLE_REMEDIATION.to_string(),
        }
    } else {
        Error::Model(details)
    }
}

fn is_environment_mismatch(message: &str) -> bool {
    let message = message.to_lowercase();
    INCOMPATIBLE_MARKERS.iter().any(|m| message.contains(m))
}
