//! Bounded inference worker pool
//!
//! Decoding and inference are CPU-bound. They run on Tokio's blocking thread
//! pool, gated by a semaphore so at most `workers` images are in flight at
//! once; callers await completion without stalling the async runtime.

use crate::classifier::{Classification, ImageClassifier};
use crate::upload::ValidatedUpload;
use pokedex_core::{Error, LabelSet, Result};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

/// Shared, read-only classifier plus the permits guarding it
pub struct InferencePool {
    classifier: Arc<dyn ImageClassifier>,
    permits: Arc<Semaphore>,
    workers: usize,
}

impl InferencePool {
    /// Create a pool allowing `workers` concurrent inferences
    pub fn new(classifier: Arc<dyn ImageClassifier>, workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            classifier,
            permits: Arc::new(Semaphore::new(workers)),
            workers,
        }
    }

    /// Create a pool sized to the number of CPUs
    pub fn with_default_workers(classifier: Arc<dyn ImageClassifier>) -> Self {
        Self::new(classifier, num_cpus::get())
    }

    /// Decode and classify an upload on a blocking worker
    pub async fn classify(&self, upload: ValidatedUpload) -> Result<Classification> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| Error::Unavailable("inference pool is shut down".to_string()))?;

        let classifier = Arc::clone(&self.classifier);
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let image = upload.decode()?;

            let start = Instant::now();
            let mut result = classifier.classify(&image)?;
            if result.latency_us == 0 {
                result.latency_us = start.elapsed().as_micros() as u64;
            }
            Ok(result)
        })
        .await
        .map_err(|e| Error::inference(format!("inference task failed: {}", e)))?
    }

    /// Stop admitting new work; in-flight inferences finish normally
    pub fn close(&self) {
        self.permits.close();
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    pub fn labels(&self) -> &LabelSet {
        self.classifier.labels()
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Permits currently free
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::{validate_upload, UploadLimits};
    use bytes::Bytes;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Labels an image by its brightest channel, slowly, tracking overlap
    struct ChannelClassifier {
        labels: LabelSet,
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    impl ChannelClassifier {
        fn new() -> Self {
            Self {
                labels: LabelSet::from_lines("red\ngreen\nblue").unwrap(),
                active: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    impl ImageClassifier for ChannelClassifier {
        fn classify(&self, image: &DynamicImage) -> Result<Classification> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            self.active.fetch_sub(1, Ordering::SeqCst);

            let px = image.to_rgb8().get_pixel(0, 0).0;
            let index = (0..3).max_by_key(|&i| px[i]).unwrap_or(0);
            Ok(Classification::new(self.labels.get(index).unwrap_or_default(), index, 1.0))
        }

        fn name(&self) -> &str {
            "channel"
        }

        fn labels(&self) -> &LabelSet {
            &self.labels
        }
    }

    fn upload(color: [u8; 3]) -> ValidatedUpload {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb(color)));
        let mut buf = Vec::new();
        image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
        validate_upload(Bytes::from(buf), None, &UploadLimits::default()).unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_classify_on_worker() {
        let pool = InferencePool::new(Arc::new(ChannelClassifier::new()), 2);
        let result = pool.classify(upload([0, 0, 255])).await.unwrap();
        assert_eq!(result.label, "blue");
        assert!(result.latency_us > 0);
        assert_eq!(pool.available(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrency_is_bounded() {
        let classifier = Arc::new(ChannelClassifier::new());
        let pool = Arc::new(InferencePool::new(classifier.clone(), 2));

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let pool = Arc::clone(&pool);
                let color = if i % 2 == 0 { [255, 0, 0] } else { [0, 255, 0] };
                tokio::spawn(async move { (i, pool.classify(upload(color)).await) })
            })
            .collect();

        for task in tasks {
            let (i, result) = task.await.unwrap();
            let expected = if i % 2 == 0 { "red" } else { "green" };
            assert_eq!(result.unwrap().label, expected);
        }

        assert!(classifier.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_closed_pool_is_unavailable() {
        let pool = InferencePool::new(Arc::new(ChannelClassifier::new()), 1);
        pool.close();

        let err = pool.classify(upload([1, 2, 3])).await.unwrap_err();
        assert!(matches!(err, Error::Unavailable(_)));
    }

    #[test]
    fn test_zero_workers_is_clamped() {
        let pool = InferencePool::new(Arc::new(ChannelClassifier::new()), 0);
        assert_eq!(pool.workers(), 1);
    }
}
