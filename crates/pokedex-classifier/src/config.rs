//! Configuration for model provisioning and loading

use crate::{Architecture, DeviceType, ModelConfig, ModelFormat, ModelSource};
use pokedex_core::{LabelSet, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default artifact location
pub const DEFAULT_MODEL_URL: &str =
    "https://drive.google.com/uc?export=download&id=1M8d1gwAwKgD83u3tdkz2x-trmVMT5I4_";

/// Model configuration specification (for YAML/config files)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfigSpec {
    /// Artifact URL; `null` means the file must already exist locally
    #[serde(default = "default_url")]
    pub url: Option<String>,

    /// Local file name of the artifact
    #[serde(default = "default_file_name")]
    pub file_name: String,

    /// Directory the artifact is stored in
    #[serde(default = "default_dir")]
    pub dir: PathBuf,

    /// Expected hex SHA-256 of the artifact
    #[serde(default)]
    pub sha256: Option<String>,

    #[serde(default)]
    pub architecture: ArchitectureSpec,

    /// Model format; inferred from the file extension when omitted
    #[serde(default)]
    pub format: Option<ModelFormatSpec>,

    #[serde(default)]
    pub device: DeviceSpec,

    /// Accelerator ordinal for cuda/metal
    #[serde(default)]
    pub device_index: usize,

    /// Tensor name prefix the backbone lives under
    #[serde(default)]
    pub weights_prefix: Option<String>,

    #[serde(default = "default_image_size")]
    pub image_size: usize,

    /// One-label-per-line file replacing the built-in label set
    #[serde(default)]
    pub labels_path: Option<PathBuf>,
}

/// Device specification (for config files)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceSpec {
    #[default]
    Cpu,
    Cuda,
    Metal,
}

/// Model format specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormatSpec {
    SafeTensors,
    PyTorch,
}

/// Architecture specification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchitectureSpec {
    Resnet18,
    #[default]
    Resnet34,
    Resnet50,
}

impl Default for ModelConfigSpec {
    fn default() -> Self {
        Self {
            url: default_url(),
            file_name: default_file_name(),
            dir: default_dir(),
            sha256: None,
            architecture: ArchitectureSpec::default(),
            format: None,
            device: DeviceSpec::default(),
            device_index: 0,
            weights_prefix: None,
            image_size: default_image_size(),
            labels_path: None,
        }
    }
}

impl ModelConfigSpec {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Full path of the artifact on disk
    pub fn destination(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }

    /// Convert to ModelConfig for provisioning and loading
    pub fn to_model_config(&self, top_k: usize) -> Result<ModelConfig> {
        let weights_path = self.destination();

        let source = match &self.url {
            Some(url) => ModelSource::Remote {
                url: url.clone(),
                sha256: self.sha256.clone(),
            },
            None => ModelSource::LocalPath,
        };

        let format = match self.format {
            Some(ModelFormatSpec::SafeTensors) => ModelFormat::SafeTensors,
            Some(ModelFormatSpec::PyTorch) => ModelFormat::PyTorch,
            None => ModelFormat::from_path(&weights_path).ok_or_else(|| {
                pokedex_core::Error::config(format!(
                    "cannot infer model format from {}; set `model.format`",
                    weights_path.display()
                ))
            })?,
        };

        let labels = match &self.labels_path {
            Some(path) => LabelSet::from_file(path)?,
            None => LabelSet::builtin(),
        };

        Ok(ModelConfig {
            source,
            weights_path,
            architecture: self.architecture.to_architecture(),
            format,
            device: self.device.to_device_type(self.device_index),
            weights_prefix: self.weights_prefix.clone(),
            image_size: self.image_size,
            top_k,
            labels,
        })
    }
}

impl DeviceSpec {
    /// Convert to DeviceType
    pub fn to_device_type(&self, index: usize) -> DeviceType {
        match self {
            DeviceSpec::Cpu => DeviceType::Cpu,
            DeviceSpec::Cuda => DeviceType::Cuda(index),
            DeviceSpec::Metal => DeviceType::Metal(index),
        }
    }
}

impl ArchitectureSpec {
    pub fn to_architecture(&self) -> Architecture {
        match self {
            ArchitectureSpec::Resnet18 => Architecture::Resnet18,
            ArchitectureSpec::Resnet34 => Architecture::Resnet34,
            ArchitectureSpec::Resnet50 => Architecture::Resnet50,
        }
    }
}

fn default_url() -> Option<String> {
    Some(DEFAULT_MODEL_URL.to_string())
}

fn default_file_name() -> String {
    "pkmn_img_classifier.pth".to_string()
}

fn default_dir() -> PathBuf {
    PathBuf::from("app")
}

fn default_image_size() -> usize {
    224
}
