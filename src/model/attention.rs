use candle_core::safetensors::MmapedSafetensors;
use candle_core::{Device, Result as CandleResult, Tensor, D};

use crate::layers::layer::Layer;
use crate::layers::linear::LinearLayer;

/// Bidirectional multi-head self-attention.
pub struct SelfAttentionLayer {
    q_lin: LinearLayer,
    k_lin: LinearLayer,
    v_lin: LinearLayer,
    out_lin: LinearLayer,
    n_heads: usize,
    hidden_size: usize,
    device: Device,
}

impl SelfAttentionLayer {
    pub fn new(
        weights: &MmapedSafetensors,
        prefix: &str,
        n_heads: usize,
        hidden_size: usize,
        device: &Device,
    ) -> CandleResult<Self> {
        if n_heads == 0 || hidden_size % n_heads != 0 {
            candle_core::bail!(
                "hidden size {} is not divisible by {} attention heads",
                hidden_size,
                n_heads
            );
        }

        let q_lin = LinearLayer::new(weights, &format!("{}.q_lin", prefix), device)?;
        let k_lin = LinearLayer::new(weights, &format!("{}.k_lin", prefix), device)?;
        let v_lin = LinearLayer::new(weights, &format!("{}.v_lin", prefix), device)?;
        let out_lin = LinearLayer::new(weights, &format!("{}.out_lin", prefix), device)?;

        Ok(Self {
            q_lin,
            k_lin,
            v_lin,
            out_lin,
            n_heads,
            hidden_size,
            device: device.clone(),
        })
    }

    /// Turns a `(batch, seq)` 0/1 padding mask into an additive
    /// `(batch, 1, 1, seq)` bias: 0 for real tokens, a large negative for padding.
    pub fn additive_mask(attention_mask: &Tensor) -> CandleResult<Tensor> {
        let (b_sz, seq_len) = attention_mask.dims2()?;
        attention_mask
            .to_dtype(candle_core::DType::F32)?
            .affine(1e9, -1e9)?
            .reshape((b_sz, 1, 1, seq_len))
    }

    /// `mask` is the output of [`Self::additive_mask`].
    pub fn forward_masked(&self, input: &Tensor, mask: &Tensor) -> CandleResult<Tensor> {
        let input = input.to_device(&self.device)?;
        let (b_sz, seq_len, _) = input.dims3()?;
        let head_dim = self.hidden_size / self.n_heads;

        let split_heads = |t: Tensor| -> CandleResult<Tensor> {
            t.reshape((b_sz, seq_len, self.n_heads, head_dim))?
                .transpose(1, 2)? // (b_sz, n_heads, seq_len, head_dim)
                .contiguous()
        };

        let q = split_heads(self.q_lin.forward(&input)?)?;
        let k = split_heads(self.k_lin.forward(&input)?)?;
        let v = split_heads(self.v_lin.forward(&input)?)?;

        let scaling = 1.0 / (head_dim as f64).sqrt();
        let attn_scores = q
            .matmul(&k.transpose(2, 3)?.contiguous()?)?
            .affine(scaling, 0.0)?
            .broadcast_add(mask)?;
        let attn_probs = candle_nn::ops::softmax(&attn_scores, D::Minus1)?;

        let context = attn_probs
            .matmul(&v)?
            .transpose(1, 2)? // (b_sz, seq_len, n_heads, head_dim)
            .reshape((b_sz, seq_len, self.hidden_size))?;

        self.out_lin.forward(&context)
    }
}
