pub mod activation;
pub mod embedding;
pub mod layer;
pub mod layer_norm;
pub mod linear;

#[cfg(test)]
pub(crate) mod test_util {
    use std::collections::HashMap;

    use candle_core::safetensors::MmapedSafetensors;
    use candle_core::Tensor;
    use tempfile::TempDir;

    /// Writes `tensors` to a safetensors file and maps it back. Keep the
    /// returned directory alive for as long as the mapping is used.
    pub fn mmap_tensors(tensors: HashMap<String, Tensor>) -> (TempDir, MmapedSafetensors) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("model.safetensors");
        candle_core::safetensors::save(&tensors, &path).expect("save safetensors");
        let weights = unsafe { MmapedSafetensors::new(&path) }.expect("mmap safetensors");
        (dir, weights)
    }
}
