use candle_core::{safetensors::MmapedSafetensors, Device, Result as CandleResult, Tensor};

use crate::config::DistilBertConfig;
use crate::layers::embedding::EmbeddingLayer;
use crate::layers::layer::Layer;
use crate::layers::layer_norm::LayerNormLayer;

/// Word + learned absolute position embeddings, followed by LayerNorm.
pub struct TokenEmbeddings {
    word_embeddings: EmbeddingLayer,
    position_embeddings: EmbeddingLayer,
    norm: LayerNormLayer,
    max_positions: usize,
    device: Device,
}

impl TokenEmbeddings {
    pub fn new(
        weights: &MmapedSafetensors,
        prefix: &str,
        config: &DistilBertConfig,
        device: &Device,
    ) -> CandleResult<Self> {
        let word_embeddings =
            EmbeddingLayer::new(weights, device, &format!("{}.word_embeddings", prefix))?;
        let position_embeddings =
            EmbeddingLayer::new(weights, device, &format!("{}.position_embeddings", prefix))?;
        let norm = LayerNormLayer::new(
            weights,
            &format!("{}.LayerNorm", prefix),
            device,
            DistilBertConfig::LAYER_NORM_EPS,
        )?;

        let vocab = word_embeddings.num_embeddings()?;
        if vocab != config.vocab_size {
            candle_core::bail!(
                "word embeddings have {} rows but config declares vocab_size {}",
                vocab,
                config.vocab_size
            );
        }

        Ok(Self {
            word_embeddings,
            position_embeddings,
            norm,
            max_positions: config.max_position_embeddings,
            device: device.clone(),
        })
    }
}

impl Layer for TokenEmbeddings {
    fn forward(&self, input_ids: &Tensor) -> CandleResult<Tensor> {
        let (_, seq_len) = input_ids.dims2()?;
        if seq_len > self.max_positions {
            candle_core::bail!(
                "sequence length {} exceeds max position embeddings {}",
                seq_len,
                self.max_positions
            );
        }

        let words = self.word_embeddings.forward(input_ids)?;
        let position_ids = Tensor::arange(0u32, seq_len as u32, &self.device)?.unsqueeze(0)?;
        let positions = self.position_embeddings.forward(&position_ids)?;

        self.norm.forward(&words.broadcast_add(&positions)?)
    }
}
