//! Pokedex Classifier
//!
//! Everything between an uploaded image and a predicted label:
//! - Provisioning: download-if-absent of the model artifact, then loading
//! - Upload validation ahead of any decode or inference
//! - Candle ResNet inference behind the [`ImageClassifier`] trait
//! - A bounded blocking worker pool so inference never stalls the runtime

pub mod classifier;
pub mod config;
pub mod model_loader;
pub mod pool;
pub mod preprocess;
pub mod provisioner;
pub mod resnet;
pub mod upload;

pub use classifier::{Classification, ImageClassifier};
pub use config::{ArchitectureSpec, DeviceSpec, ModelConfigSpec, ModelFormatSpec};
pub use model_loader::{Architecture, DeviceType, LoadedModel, ModelConfig, ModelFormat, ModelSource};
pub use pool::InferencePool;
pub use provisioner::{ArtifactStatus, Provisioner};
pub use resnet::ResnetClassifier;
pub use upload::{validate_upload, UploadLimits, ValidatedUpload};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classifier::{Classification, ImageClassifier};
    pub use crate::model_loader::{Architecture, DeviceType, ModelConfig, ModelFormat, ModelSource};
    pub use crate::pool::InferencePool;
    pub use crate::provisioner::Provisioner;
    pub use crate::resnet::ResnetClassifier;
    pub use crate::upload::{validate_upload, UploadLimits, ValidatedUpload};
}
