//! Bridges validated input to the [`Classifier`] and shapes the timed results.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::sync::{AcquireError, Semaphore};
use tokio::task::JoinError;

use crate::api::models::{BatchResult, ClassificationResult, SingleResult};
use crate::classifier::{Classifier, ClassifierError, Prediction};

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error(transparent)]
    Classifier(#[from] ClassifierError),

    #[error("classifier returned {actual} results for {expected} texts")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("inference task failed: {0}")]
    TaskFailed(#[from] JoinError),

    #[error("inference permits closed: {0}")]
    PermitsClosed(#[from] AcquireError),
}

/// Runs classifier calls on the blocking pool, at most `permits` at a time.
#[derive(Clone)]
pub struct InferenceOrchestrator {
    classifier: Arc<dyn Classifier>,
    permits: Arc<Semaphore>,
}

impl InferenceOrchestrator {
    pub fn new(classifier: Arc<dyn Classifier>, max_concurrent: usize) -> Self {
        Self {
            classifier,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    pub async fn analyze(&self, text: String) -> Result<SingleResult, InferenceError> {
        let classifier = Arc::clone(&self.classifier);
        let ((prediction, text), elapsed_ms) = self
            .timed(move || classifier.classify(&text).map(|p| (p, text)))
            .await?;

        Ok(SingleResult {
            result: shape(text, &prediction),
            inference_time_ms: round_to(elapsed_ms, 2),
        })
    }

    /// One classifier call for the whole batch; the elapsed time covers all of it.
    pub async fn analyze_batch(&self, texts: Vec<String>) -> Result<BatchResult, InferenceError> {
        let classifier = Arc::clone(&self.classifier);
        let ((predictions, texts), elapsed_ms) = self
            .timed(move || classifier.classify_batch(&texts).map(|p| (p, texts)))
            .await?;

        if predictions.len() != texts.len() {
            return Err(InferenceError::LengthMismatch {
                expected: texts.len(),
                actual: predictions.len(),
            });
        }

        let count = texts.len();
        let results = texts
            .into_iter()
            .zip(predictions.iter())
            .map(|(text, prediction)| shape(text, prediction))
            .collect();

        Ok(BatchResult {
            results,
            count,
            total_inference_time_ms: round_to(elapsed_ms, 2),
        })
    }

    /// Runs `call` on the blocking pool while holding a permit and returns its
    /// output with the wall time spent inside it, in milliseconds.
    async fn timed<T, F>(&self, call: F) -> Result<(T, f64), InferenceError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, ClassifierError> + Send + 'static,
    {
        let permit = Arc::clone(&self.permits).acquire_owned().await?;

        let (output, elapsed_ms) = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let start = Instant::now();
            let output = call();
            (output, start.elapsed().as_secs_f64() * 1000.0)
        })
        .await?;

        Ok((output?, elapsed_ms))
    }
}

fn shape(text: String, prediction: &Prediction) -> ClassificationResult {
    ClassificationResult {
        text,
        sentiment: prediction.label.to_lowercase(),
        confidence: round_to(f64::from(prediction.score), 4),
    }
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// First `max_chars` characters of `text`, for log lines.
pub fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    struct Fixed(Vec<Prediction>);

    impl Classifier for Fixed {
        fn classify(&self, _text: &str) -> Result<Prediction, ClassifierError> {
            self.0.first().cloned().ok_or(ClassifierError::EmptyOutput)
        }

        fn classify_batch(&self, _texts: &[String]) -> Result<Vec<Prediction>, ClassifierError> {
            Ok(self.0.clone())
        }
    }

    fn orchestrator(predictions: Vec<Prediction>) -> InferenceOrchestrator {
        InferenceOrchestrator::new(Arc::new(Fixed(predictions)), 1)
    }

    /// Records the highest number of overlapping `classify` calls.
    #[derive(Default)]
    struct Tracking {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl Classifier for Tracking {
        fn classify(&self, _text: &str) -> Result<Prediction, ClassifierError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(Prediction::new("POSITIVE", 0.5))
        }

        fn classify_batch(&self, texts: &[String]) -> Result<Vec<Prediction>, ClassifierError> {
            texts.iter().map(|t| self.classify(t)).collect()
        }
    }

    async fn peak_overlap(permits: usize, requests: usize) -> usize {
        let tracking = Arc::new(Tracking::default());
        let orch = InferenceOrchestrator::new(tracking.clone(), permits);

        let handles: Vec<_> = (0..requests)
            .map(|i| {
                let orch = orch.clone();
                tokio::spawn(async move { orch.analyze(format!("text {i}")).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(tracking.in_flight.load(Ordering::SeqCst), 0);
        tracking.peak.load(Ordering::SeqCst)
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_to(0.99987, 4), 0.9999);
        assert_eq!(round_to(0.12344, 4), 0.1234);
        assert_eq!(round_to(12.345678, 2), 12.35);
        assert_eq!(round_to(0.0, 2), 0.0);
    }

    #[test]
    fn preview_counts_characters_not_bytes() {
        assert_eq!(preview("héllo wörld", 5), "héllo");
        assert_eq!(preview("abc", 50), "abc");
    }

    #[tokio::test]
    async fn single_result_is_lowercased_and_rounded() {
        let orch = orchestrator(vec![Prediction::new("POSITIVE", 0.999_876_5)]);
        let out = orch.analyze("  great  ".to_string()).await.unwrap();

        assert_eq!(out.result.text, "  great  ");
        assert_eq!(out.result.sentiment, "positive");
        assert_eq!(out.result.confidence, 0.9999);
        assert!(out.inference_time_ms >= 0.0);
    }

    #[tokio::test]
    async fn batch_zips_in_input_order() {
        let orch = orchestrator(vec![
            Prediction::new("NEGATIVE", 0.9),
            Prediction::new("POSITIVE", 0.8),
        ]);
        let out = orch
            .analyze_batch(vec!["bad".to_string(), "good".to_string()])
            .await
            .unwrap();

        assert_eq!(out.count, 2);
        assert_eq!(out.results[0].text, "bad");
        assert_eq!(out.results[0].sentiment, "negative");
        assert_eq!(out.results[1].text, "good");
        assert_eq!(out.results[1].sentiment, "positive");
        assert!(out.total_inference_time_ms >= 0.0);
    }

    #[tokio::test]
    async fn batch_length_mismatch_fails_fast() {
        let orch = orchestrator(vec![Prediction::new("NEGATIVE", 0.9)]);
        let err = orch
            .analyze_batch(vec!["a".to_string(), "b".to_string()])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            InferenceError::LengthMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[tokio::test]
    async fn classifier_failure_is_propagated() {
        let orch = orchestrator(Vec::new());
        let err = orch.analyze("text".to_string()).await.unwrap_err();
        assert!(matches!(
            err,
            InferenceError::Classifier(ClassifierError::EmptyOutput)
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn single_permit_serializes_classifier_calls() {
        assert_eq!(peak_overlap(1, 6).await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn overlap_never_exceeds_permits() {
        let peak = peak_overlap(3, 9).await;
        assert!((1..=3).contains(&peak), "peak overlap was {peak}");
    }
}
