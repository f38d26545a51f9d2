//! Classifier trait and common types

use image::DynamicImage;
use pokedex_core::{Error, LabelSet, Result};
use serde::Serialize;

/// Trait for all image classifiers
///
/// Implementations are shared read-only across requests and are called from
/// blocking worker threads, never from the async runtime directly.
pub trait ImageClassifier: Send + Sync {
    /// Classify a decoded image
    fn classify(&self, image: &DynamicImage) -> Result<Classification>;

    /// Get the classifier name
    fn name(&self) -> &str;

    /// Labels this classifier predicts over, in class-index order
    fn labels(&self) -> &LabelSet;
}

/// Result of classification
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    /// Top predicted label
    pub label: String,

    /// Class index of the top label
    pub index: usize,

    /// Softmax probability of the top label (0.0-1.0)
    pub confidence: f32,

    /// Highest scoring labels, best first
    pub top: Vec<(String, f32)>,

    /// Latency in microseconds
    pub latency_us: u64,
}

impl Classification {
    /// Create a classification with a single known label
    pub fn new(label: impl Into<String>, index: usize, confidence: f32) -> Self {
        let label = label.into();
        Self {
            top: vec![(label.clone(), confidence)],
            label,
            index,
            confidence,
            latency_us: 0,
        }
    }

    /// Build a classification from per-class probabilities
    pub fn from_probabilities(probs: &[f32], labels: &LabelSet, top_k: usize) -> Result<Self> {
        if probs.len() != labels.len() {
            return Err(Error::inference(format!(
                "model produced {} scores for {} labels",
                probs.len(),
                labels.len()
            )));
        }

        // NaN ranks last
        let score = |i: usize| {
            if probs[i].is_nan() {
                f32::NEG_INFINITY
            } else {
                probs[i]
            }
        };
        let mut ranked: Vec<usize> = (0..probs.len()).collect();
        ranked.sort_by(|&a, &b| score(b).total_cmp(&score(a)));

        let top: Vec<(String, f32)> = ranked
            .iter()
            .take(top_k.max(1))
            .filter_map(|&i| labels.get(i).map(|l| (l.to_string(), probs[i])))
            .collect();

        let index = ranked[0];
        let (label, confidence) = top[0].clone();

        Ok(Self {
            label,
            index,
            confidence,
            top,
            latency_us: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> LabelSet {
        LabelSet::from_lines("bulbasaur\ncharmander\nsquirtle").unwrap()
    }

    #[test]
    fn test_from_probabilities_picks_argmax() {
        let result = Classification::from_probabilities(&[0.1, 0.7, 0.2], &labels(), 2).unwrap();
        assert_eq!(result.label, "charmander");
        assert_eq!(result.index, 1);
        assert!((result.confidence - 0.7).abs() < f32::EPSILON);
        assert_eq!(result.top.len(), 2);
        assert_eq!(result.top[1].0, "squirtle");
    }

    #[test]
    fn test_top_k_is_clamped() {
        let result = Classification::from_probabilities(&[0.5, 0.3, 0.2], &labels(), 10).unwrap();
        assert_eq!(result.top.len(), 3);

        let result = Classification::from_probabilities(&[0.5, 0.3, 0.2], &labels(), 0).unwrap();
        assert_eq!(result.top.len(), 1);
    }

    #[test]
    fn test_nan_scores_do_not_win() {
        let result =
            Classification::from_probabilities(&[f32::NAN, 0.9, 0.1], &labels(), 1).unwrap();
        assert_eq!(result.label, "charmander");
    }

    #[test]
    fn test_width_mismatch_is_an_error() {
        let err = Classification::from_probabilities(&[0.5, 0.5], &labels(), 1).unwrap_err();
        assert!(matches!(err, Error::Inference(_)));
    }
}
