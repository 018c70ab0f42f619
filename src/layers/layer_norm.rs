use candle_core::{safetensors::MmapedSafetensors, DType, Device, Result as CandleResult, Tensor, D};

use crate::layers::layer::Layer;

/// Mean/variance normalization over the last dimension with learned scale and shift.
pub struct LayerNormLayer {
    weight: Tensor,
    bias: Tensor,
    eps: f64,
    device: Device,
}

impl LayerNormLayer {
    pub fn new(
        weights_map: &MmapedSafetensors,
        prefix: &str,
        device: &Device,
        eps: f64,
    ) -> CandleResult<Self> {
        let weight = weights_map
            .load(&format!("{}.weight", prefix), device)?
            .to_dtype(DType::F32)?;
        let bias = weights_map
            .load(&format!("{}.bias", prefix), device)?
            .to_dtype(DType::F32)?;

        Ok(Self {
            weight,
            bias,
            eps,
            device: device.clone(),
        })
    }
}

impl Layer for LayerNormLayer {
    fn forward(&self, input: &Tensor) -> CandleResult<Tensor> {
        let input = input.to_device(&self.device)?;
        let mean = input.mean_keepdim(D::Minus1)?;
        let centered = input.broadcast_sub(&mean)?;
        let variance = centered.sqr()?.mean_keepdim(D::Minus1)?;
        let inv_std = variance.affine(1.0, self.eps)?.sqrt()?.recip()?;

        centered
            .broadcast_mul(&inv_std)?
            .broadcast_mul(&self.weight)?
            .broadcast_add(&self.bias)
    }
}
