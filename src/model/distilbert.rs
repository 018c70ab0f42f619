use candle_core::safetensors::MmapedSafetensors;
use candle_core::{Device, Result as CandleResult, Tensor, D};

use crate::config::DistilBertConfig;
use crate::layers::layer::Layer;
use crate::layers::linear::LinearLayer;
use crate::model::attention::SelfAttentionLayer;
use crate::model::embeddings::TokenEmbeddings;
use crate::model::transformer_block::TransformerBlock;

pub trait SequenceClassifier {
    /// Maps `(batch, seq)` token ids and a 0/1 padding mask to
    /// `(batch, num_labels)` probabilities.
    fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> CandleResult<Tensor>;
}

/// DistilBERT encoder with the `pre_classifier -> relu -> classifier` head
/// over the `[CLS]` position.
pub struct DistilBertForSequenceClassification {
    pub device: Device,
    pub embeddings: TokenEmbeddings,
    pub layers: Vec<TransformerBlock>,
    pub pre_classifier: LinearLayer,
    pub classifier: LinearLayer,
}

impl DistilBertForSequenceClassification {
    pub fn new(
        weights: &MmapedSafetensors,
        config: &DistilBertConfig,
        device: &Device,
    ) -> CandleResult<Self> {
        let embeddings = TokenEmbeddings::new(weights, "distilbert.embeddings", config, device)?;

        let layers = (0..config.n_layers)
            .map(|layer_idx| {
                TransformerBlock::new(
                    weights,
                    &format!("distilbert.transformer.layer.{}", layer_idx),
                    config,
                    device,
                )
            })
            .collect::<CandleResult<Vec<_>>>()?;

        let pre_classifier = LinearLayer::new(weights, "pre_classifier", device)?;
        let classifier = LinearLayer::new(weights, "classifier", device)?;

        let num_labels = classifier.out_features()?;
        if config.num_labels() != num_labels {
            candle_core::bail!(
                "classifier has {} outputs but config lists {} labels",
                num_labels,
                config.num_labels()
            );
        }

        Ok(Self {
            device: device.clone(),
            embeddings,
            layers,
            pre_classifier,
            classifier,
        })
    }
}

impl SequenceClassifier for DistilBertForSequenceClassification {
    fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> CandleResult<Tensor> {
        let input_ids = input_ids.to_device(&self.device)?;
        let mask = SelfAttentionLayer::additive_mask(&attention_mask.to_device(&self.device)?)?;

        let mut hidden_states = self.embeddings.forward(&input_ids)?;
        for layer in self.layers.iter() {
            hidden_states = layer.forward_masked(&hidden_states, &mask)?;
        }

        let pooled = hidden_states.narrow(1, 0, 1)?.squeeze(1)?; // (b_sz, dim)
        let pooled = self.pre_classifier.forward(&pooled)?.relu()?;
        let logits = self.classifier.forward(&pooled)?;

        candle_nn::ops::softmax(&logits, D::Minus1)
    }
}
