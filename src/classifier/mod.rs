//! The sentiment classification capability the HTTP layer depends on.
//!
//! [`Classifier`] is the only seam between request handling and the model.
//! [`SentimentPipeline`] is the DistilBERT implementation the binary loads at
//! startup; tests substitute their own implementations.

use thiserror::Error;

pub mod loader;
pub mod pipeline;

pub use loader::load_pipeline;
pub use pipeline::SentimentPipeline;

/// Label and confidence produced for one text.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub score: f32,
}

impl Prediction {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("model download failed: {0}")]
    Download(#[from] hf_hub::api::sync::ApiError),

    #[error("tokenization failed: {0}")]
    Tokenization(String),

    #[error("tensor operation failed: {0}")]
    Model(#[from] candle_core::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid model config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("model has no label for class index {0}")]
    UnknownLabel(usize),

    #[error("model returned no prediction")]
    EmptyOutput,
}

/// Shared, already-initialized sentiment model.
///
/// Implementations must tolerate concurrent calls through `&self`.
pub trait Classifier: Send + Sync {
    fn classify(&self, text: &str) -> Result<Prediction, ClassifierError>;

    /// One prediction per input, in input order.
    fn classify_batch(&self, texts: &[String]) -> Result<Vec<Prediction>, ClassifierError>;
}
