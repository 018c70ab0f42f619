use candle_core::{Result as CandleResult, Tensor};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Gelu,
    Relu,
    Silu,
}

impl Activation {
    pub fn apply(&self, input: &Tensor) -> CandleResult<Tensor> {
        match self {
            // DistilBERT was trained with the exact erf form.
            Activation::Gelu => input.gelu_erf(),
            Activation::Relu => input.relu(),
            Activation::Silu => input.silu(),
        }
    }
}
