//! Pokedex Core
//!
//! Types shared across the Pokedex classification service.
//!
//! This crate provides:
//! - The error taxonomy used by provisioning, validation and inference
//! - The ordered class label set the model predicts over

pub mod error;
pub mod labels;

pub use error::{Error, Result, UploadRejection};
pub use labels::LabelSet;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result, UploadRejection};
    pub use crate::labels::LabelSet;
}
