use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{safetensors::MmapedSafetensors, Device};
use hf_hub::api::sync::{Api, ApiBuilder, ApiRepo};
use hf_hub::{Repo, RepoType};
use tokenizers::Tokenizer;

use crate::classifier::{ClassifierError, SentimentPipeline};
use crate::config::{DeviceKind, DistilBertConfig, ServiceConfig};
use crate::model::distilbert::DistilBertForSequenceClassification;

/// Downloads (or reuses the cached) model artefacts and builds the pipeline.
pub fn load_pipeline(cfg: &ServiceConfig) -> Result<SentimentPipeline, ClassifierError> {
    let start = Instant::now();
    let device = select_device(cfg.device)?;

    let api = ApiBuilder::new().with_progress(false).build()?;
    let repo = api.repo(Repo::with_revision(
        cfg.model_id.clone(),
        RepoType::Model,
        cfg.revision.clone(),
    ));

    let config_path = repo.get("config.json")?;
    let weights_path = repo.get("model.safetensors")?;
    let tokenizer_path = tokenizer_file(&api, &repo, cfg)?;

    tracing::debug!(
        config = %config_path.display(),
        weights = %weights_path.display(),
        tokenizer = %tokenizer_path.display(),
        "model artefacts resolved"
    );

    let model_cfg: DistilBertConfig = serde_json::from_reader(File::open(&config_path)?)?;
    let weights = load_weights_mmap(&weights_path)?;
    let tokenizer = load_tokenizer(&tokenizer_path)?;
    let model = DistilBertForSequenceClassification::new(&weights, &model_cfg, &device)?;

    tracing::info!(
        model = %cfg.model_id,
        layers = model_cfg.n_layers,
        labels = model_cfg.num_labels(),
        device = ?device,
        "Model loaded successfully in {:.2} seconds",
        start.elapsed().as_secs_f64()
    );

    SentimentPipeline::new(Box::new(model), tokenizer, model_cfg, device)
}

fn select_device(kind: DeviceKind) -> Result<Device, ClassifierError> {
    match kind {
        DeviceKind::Cpu => Ok(Device::Cpu),
        DeviceKind::Cuda(ordinal) => Ok(Device::new_cuda(ordinal)?),
    }
}

/// Fine-tuned checkpoints often ship only `vocab.txt`; fall back to the base
/// model's `tokenizer.json`, which shares the vocabulary.
fn tokenizer_file(
    api: &Api,
    repo: &ApiRepo,
    cfg: &ServiceConfig,
) -> Result<PathBuf, ClassifierError> {
    match repo.get("tokenizer.json") {
        Ok(path) => Ok(path),
        Err(err) => {
            tracing::warn!(
                model = %cfg.model_id,
                fallback = %cfg.tokenizer_id,
                error = %err,
                "model repo has no tokenizer.json, using fallback repo"
            );
            Ok(api.model(cfg.tokenizer_id.clone()).get("tokenizer.json")?)
        }
    }
}

fn load_weights_mmap(path: &Path) -> Result<MmapedSafetensors, ClassifierError> {
    let weights = unsafe { MmapedSafetensors::new(path)? };
    Ok(weights)
}

fn load_tokenizer(path: &Path) -> Result<Tokenizer, ClassifierError> {
    Tokenizer::from_file(path).map_err(|e| ClassifierError::Tokenization(e.to_string()))
}
