//! ResNet image classifier
//!
//! Wraps a Candle ResNet backbone whose final fully connected layer has one
//! output per label in the configured [`LabelSet`].

use crate::classifier::{Classification, ImageClassifier};
use crate::model_loader::{load_error, LoadedModel, ModelConfig};
use crate::preprocess::image_to_batch;
use candle_core::{Device, Module, Tensor, D};
use candle_nn::{Func, VarBuilder};
use image::DynamicImage;
use pokedex_core::{Error, LabelSet, Result};
use std::time::Instant;

/// ResNet classifier with weights held read-only in memory
pub struct ResnetClassifier {
    name: String,
    model: Func<'static>,
    device: Device,
    labels: LabelSet,
    image_size: usize,
    top_k: usize,
}

impl ResnetClassifier {
    /// Load weights from disk and assemble the network
    pub fn load(config: &ModelConfig) -> Result<Self> {
        let loaded = LoadedModel::load(config)?;
        let classifier =
            Self::from_var_builder(loaded.var_builder().clone(), loaded.device().clone(), config)?;

        tracing::info!(
            "Loaded {} from {} ({} labels)",
            classifier.name,
            loaded.weights_path().display(),
            classifier.labels.len()
        );
        Ok(classifier)
    }

    /// Assemble the network from an existing VarBuilder
    pub fn from_var_builder(
        vb: VarBuilder<'static>,
        device: Device,
        config: &ModelConfig,
    ) -> Result<Self> {
        let num_classes = config.labels.len();
        let model = config.architecture.build(num_classes, vb).map_err(|e| {
            load_error(
                &format!(
                    "Failed to build {} with {} output classes",
                    config.architecture, num_classes
                ),
                e,
            )
        })?;

        let classifier = Self {
            name: config.architecture.to_string(),
            model,
            device,
            labels: config.labels.clone(),
            image_size: config.image_size,
            top_k: config.top_k,
        };
        classifier.warm_up()?;
        Ok(classifier)
    }

    /// Run one blank image through the network so shape problems surface at startup
    fn warm_up(&self) -> Result<()> {
        let blank = Tensor::zeros(
            (1, 3, self.image_size, self.image_size),
            candle_core::DType::F32,
            &self.device,
        )
        .map_err(|e| load_error("Failed to allocate warm-up input", e))?;

        let logits = self
            .model
            .forward(&blank)
            .map_err(|e| load_error("Warm-up forward pass failed", e))?;

        let width = logits.dims().last().copied().unwrap_or(0);
        if width != self.labels.len() {
            return Err(Error::model(format!(
                "model emits {} classes but {} labels are configured",
                width,
                self.labels.len()
            )));
        }
        Ok(())
    }

    fn probabilities(&self, image: &DynamicImage) -> candle_core::Result<Vec<f32>> {
        let input = image_to_batch(image, self.image_size, &self.device)?;
        let logits = self.model.forward(&input)?;
        candle_nn::ops::softmax(&logits, D::Minus1)?
            .squeeze(0)?
            .to_vec1::<f32>()
    }
}

impl ImageClassifier for ResnetClassifier {
    fn classify(&self, image: &DynamicImage) -> Result<Classification> {
        let start = Instant::now();

        let probs = self
            .probabilities(image)
            .map_err(|e| Error::inference(e.to_string()))?;
        let mut result = Classification::from_probabilities(&probs, &self.labels, self.top_k)?;

        result.latency_us = start.elapsed().as_micros() as u64;
        tracing::debug!(
            "{} predicted {} ({:.3}) in {}us",
            self.name,
            result.label,
            result.confidence,
            result.latency_us
        );
        Ok(result)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn labels(&self) -> &LabelSet {
        &self.labels
    }
}
