use candle_core::{Result as CandleResult, Tensor};

pub trait Layer {
    fn forward(&self, input: &Tensor) -> CandleResult<Tensor>;
}
