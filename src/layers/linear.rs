use candle_core::safetensors::MmapedSafetensors;
use candle_core::{DType, Device, Result as CandleResult, Tensor};

use crate::layers::layer::Layer;

/// Dense projection `y = x W^T + b` loaded from `{prefix}.weight` / `{prefix}.bias`.
pub struct LinearLayer {
    weights: Tensor,
    bias: Option<Tensor>,
    device: Device,
}

impl LinearLayer {
    pub fn new(
        weights_map: &MmapedSafetensors,
        prefix: &str,
        device: &Device,
    ) -> CandleResult<Self> {
        let weights = weights_map
            .load(&format!("{}.weight", prefix), device)?
            .to_dtype(DType::F32)?;

        let bias_name = format!("{}.bias", prefix);
        let bias = if weights_map.get(&bias_name).is_ok() {
            Some(weights_map.load(&bias_name, device)?.to_dtype(DType::F32)?)
        } else {
            None
        };

        Ok(Self {
            weights,
            bias,
            device: device.clone(),
        })
    }

    pub fn out_features(&self) -> CandleResult<usize> {
        self.weights.dim(0)
    }
}

impl Layer for LinearLayer {
    fn forward(&self, input: &Tensor) -> CandleResult<Tensor> {
        let input = input.to_device(&self.device)?;
        let mut output = input.broadcast_matmul(&self.weights.t()?)?;
        if let Some(bias) = &self.bias {
            output = output.broadcast_add(bias)?
        }
        Ok(output)
    }
}
