use std::collections::HashMap;
use std::env;
use std::net::{IpAddr, SocketAddr};

use serde::Deserialize;
use thiserror::Error;

use crate::layers::activation::Activation;

/// Architecture section of a DistilBERT `config.json`.
#[derive(Deserialize, Debug, Clone)]
pub struct DistilBertConfig {
    pub vocab_size: usize,
    pub dim: usize,
    #[serde(rename = "hidden_dim")]
    pub ffn_dim: usize,
    pub n_heads: usize,
    pub n_layers: usize,
    pub max_position_embeddings: usize,
    pub activation: Activation,
    #[serde(default)]
    pub id2label: HashMap<String, String>,
}

impl DistilBertConfig {
    pub const LAYER_NORM_EPS: f64 = 1e-12;

    pub fn label(&self, idx: usize) -> Option<&str> {
        self.id2label.get(&idx.to_string()).map(String::as_str)
    }

    pub fn num_labels(&self) -> usize {
        self.id2label.len()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
    #[error("{key} must be greater than zero")]
    Zero { key: &'static str },
}

/// Device the reference classifier runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Cpu,
    Cuda(usize),
}

/// Runtime settings for the HTTP service, read from `SENTIMENT_*` variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub host: IpAddr,
    pub port: u16,
    pub model_id: String,
    pub tokenizer_id: String,
    pub revision: String,
    pub device: DeviceKind,
    pub max_concurrent_inferences: usize,
    pub max_body_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: 5000,
            model_id: "distilbert/distilbert-base-uncased-finetuned-sst-2-english".to_string(),
            tokenizer_id: "distilbert/distilbert-base-uncased".to_string(),
            revision: "main".to_string(),
            device: DeviceKind::Cpu,
            max_concurrent_inferences: 2,
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(host) = lookup("SENTIMENT_HOST") {
            cfg.host = parse("SENTIMENT_HOST", &host)?;
        }
        if let Some(port) = lookup("SENTIMENT_PORT") {
            cfg.port = parse("SENTIMENT_PORT", &port)?;
        }
        if let Some(model_id) = lookup("SENTIMENT_MODEL_ID") {
            cfg.model_id = model_id;
        }
        if let Some(tokenizer_id) = lookup("SENTIMENT_TOKENIZER_ID") {
            cfg.tokenizer_id = tokenizer_id;
        }
        if let Some(revision) = lookup("SENTIMENT_REVISION") {
            cfg.revision = revision;
        }
        if let Some(device) = lookup("SENTIMENT_DEVICE") {
            cfg.device = parse_device(&device)?;
        }
        if let Some(permits) = lookup("SENTIMENT_MAX_CONCURRENT_INFERENCES") {
            cfg.max_concurrent_inferences = parse("SENTIMENT_MAX_CONCURRENT_INFERENCES", &permits)?;
            if cfg.max_concurrent_inferences == 0 {
                return Err(ConfigError::Zero {
                    key: "SENTIMENT_MAX_CONCURRENT_INFERENCES",
                });
            }
        }
        if let Some(limit) = lookup("SENTIMENT_MAX_BODY_BYTES") {
            cfg.max_body_bytes = parse("SENTIMENT_MAX_BODY_BYTES", &limit)?;
            if cfg.max_body_bytes == 0 {
                return Err(ConfigError::Zero {
                    key: "SENTIMENT_MAX_BODY_BYTES",
                });
            }
        }

        Ok(cfg)
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

fn parse_device(value: &str) -> Result<DeviceKind, ConfigError> {
    match value.trim() {
        "cpu" => Ok(DeviceKind::Cpu),
        "cuda" => Ok(DeviceKind::Cuda(0)),
        other => match other.strip_prefix("cuda:") {
            Some(ordinal) => Ok(DeviceKind::Cuda(parse("SENTIMENT_DEVICE", ordinal)?)),
            None => Err(ConfigError::InvalidValue {
                key: "SENTIMENT_DEVICE",
                value: value.to_string(),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = ServiceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, ServiceConfig::default());
        assert_eq!(cfg.bind_addr().to_string(), "0.0.0.0:5000");
    }

    #[test]
    fn overrides_from_env() {
        let cfg = ServiceConfig::from_lookup(lookup(&[
            ("SENTIMENT_HOST", "127.0.0.1"),
            ("SENTIMENT_PORT", "8080"),
            ("SENTIMENT_DEVICE", "cuda:1"),
            ("SENTIMENT_MAX_CONCURRENT_INFERENCES", "1"),
        ]))
        .unwrap();
        assert_eq!(cfg.bind_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(cfg.device, DeviceKind::Cuda(1));
        assert_eq!(cfg.max_concurrent_inferences, 1);
    }

    #[test]
    fn rejects_bad_values() {
        let err = ServiceConfig::from_lookup(lookup(&[("SENTIMENT_PORT", "http")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "SENTIMENT_PORT",
                value: "http".to_string()
            }
        );

        let err =
            ServiceConfig::from_lookup(lookup(&[("SENTIMENT_MAX_CONCURRENT_INFERENCES", "0")]))
                .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Zero {
                key: "SENTIMENT_MAX_CONCURRENT_INFERENCES"
            }
        );

        assert!(ServiceConfig::from_lookup(lookup(&[("SENTIMENT_DEVICE", "tpu")])).is_err());
    }

    #[test]
    fn parses_distilbert_config() {
        let raw = r#"{
            "activation": "gelu",
            "dim": 768,
            "hidden_dim": 3072,
            "n_heads": 12,
            "n_layers": 6,
            "max_position_embeddings": 512,
            "vocab_size": 30522,
            "dropout": 0.1,
            "id2label": {"0": "NEGATIVE", "1": "POSITIVE"}
        }"#;
        let cfg: DistilBertConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(cfg.activation, Activation::Gelu);
        assert_eq!(cfg.ffn_dim, 3072);
        assert_eq!(cfg.num_labels(), 2);
        assert_eq!(cfg.label(1), Some("POSITIVE"));
        assert_eq!(cfg.label(2), None);
    }
}
