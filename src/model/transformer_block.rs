use candle_core::safetensors::MmapedSafetensors;
use candle_core::{Device, Result as CandleResult, Tensor};

use crate::config::DistilBertConfig;
use crate::layers::layer::Layer;
use crate::layers::layer_norm::LayerNormLayer;
use crate::model::attention::SelfAttentionLayer;
use crate::model::ffn::FeedForwardLayer;

/// Post-norm encoder block: attention and feed-forward each followed by
/// a residual add and LayerNorm.
pub struct TransformerBlock {
    pub attention: SelfAttentionLayer,
    pub sa_layer_norm: LayerNormLayer,
    pub ffn: FeedForwardLayer,
    pub output_layer_norm: LayerNormLayer,
    pub device: Device,
}

impl TransformerBlock {
    pub fn new(
        weights: &MmapedSafetensors,
        prefix: &str,
        config: &DistilBertConfig,
        device: &Device,
    ) -> CandleResult<Self> {
        let attention = SelfAttentionLayer::new(
            weights,
            &format!("{}.attention", prefix),
            config.n_heads,
            config.dim,
            device,
        )?;

        let sa_layer_norm = LayerNormLayer::new(
            weights,
            &format!("{}.sa_layer_norm", prefix),
            device,
            DistilBertConfig::LAYER_NORM_EPS,
        )?;

        let ffn = FeedForwardLayer::new(
            weights,
            &format!("{}.ffn", prefix),
            device,
            config.activation,
        )?;

        let output_layer_norm = LayerNormLayer::new(
            weights,
            &format!("{}.output_layer_norm", prefix),
            device,
            DistilBertConfig::LAYER_NORM_EPS,
        )?;

        Ok(Self {
            attention,
            sa_layer_norm,
            ffn,
            output_layer_norm,
            device: device.clone(),
        })
    }

    pub fn forward_masked(&self, input: &Tensor, mask: &Tensor) -> CandleResult<Tensor> {
        let input = input.to_device(&self.device)?;
        let attn_output = self.attention.forward_masked(&input, mask)?;
        let attn_residual = self.sa_layer_norm.forward(&input.add(&attn_output)?)?;

        let ffn_output = self.ffn.forward(&attn_residual)?;
        self.output_layer_norm.forward(&attn_residual.add(&ffn_output)?)
    }
}
