use candle_core::{Device, Tensor};
use tokenizers::{Encoding, PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

use crate::classifier::{Classifier, ClassifierError, Prediction};
use crate::config::DistilBertConfig;
use crate::model::distilbert::SequenceClassifier;

/// Tokenizer + sequence classification model behind the [`Classifier`] contract.
pub struct SentimentPipeline {
    model: Box<dyn SequenceClassifier + Send + Sync>,
    tokenizer: Tokenizer,
    config: DistilBertConfig,
    device: Device,
}

impl SentimentPipeline {
    /// Configures `tokenizer` to truncate to the model's position limit and to
    /// pad batches to their longest member.
    pub fn new(
        model: Box<dyn SequenceClassifier + Send + Sync>,
        mut tokenizer: Tokenizer,
        config: DistilBertConfig,
        device: Device,
    ) -> Result<Self, ClassifierError> {
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: config.max_position_embeddings,
                ..Default::default()
            }))
            .map_err(|e| ClassifierError::Tokenization(e.to_string()))?;

        let pad_token = "[PAD]";
        let pad_id = tokenizer.token_to_id(pad_token).unwrap_or(0);
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            pad_id,
            pad_token: pad_token.to_string(),
            ..Default::default()
        }));

        Ok(Self {
            model,
            tokenizer,
            config,
            device,
        })
    }

    fn run(&self, texts: Vec<&str>) -> Result<Vec<Prediction>, ClassifierError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts, true)
            .map_err(|e| ClassifierError::Tokenization(e.to_string()))?;

        let input_ids = stack(&encodings, Encoding::get_ids, &self.device)?;
        let attention_mask = stack(&encodings, Encoding::get_attention_mask, &self.device)?;

        let probs = self
            .model
            .forward(&input_ids, &attention_mask)?
            .to_dtype(candle_core::DType::F32)?
            .to_vec2::<f32>()?;

        probs.iter().map(|row| self.top_label(row)).collect()
    }

    fn top_label(&self, probs: &[f32]) -> Result<Prediction, ClassifierError> {
        let (idx, score) = probs
            .iter()
            .copied()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .ok_or(ClassifierError::EmptyOutput)?;

        let label = self
            .config
            .label(idx)
            .ok_or(ClassifierError::UnknownLabel(idx))?;

        Ok(Prediction::new(label, score))
    }
}

fn stack(
    encodings: &[Encoding],
    field: fn(&Encoding) -> &[u32],
    device: &Device,
) -> Result<Tensor, ClassifierError> {
    let seq_len = encodings.first().map(|e| field(e).len()).unwrap_or(0);
    let flat: Vec<u32> = encodings.iter().flat_map(|e| field(e).iter().copied()).collect();
    Ok(Tensor::from_vec(flat, (encodings.len(), seq_len), device)?)
}

impl Classifier for SentimentPipeline {
    fn classify(&self, text: &str) -> Result<Prediction, ClassifierError> {
        self.run(vec![text])?
            .into_iter()
            .next()
            .ok_or(ClassifierError::EmptyOutput)
    }

    fn classify_batch(&self, texts: &[String]) -> Result<Vec<Prediction>, ClassifierError> {
        self.run(texts.iter().map(String::as_str).collect())
    }
}
