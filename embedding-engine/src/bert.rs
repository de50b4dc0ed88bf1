//! Sentence embeddings from a BERT-family model (all-MiniLM-L6-v2 by default).
//!
//! Weights, config and tokenizer are fetched from the Hugging Face hub on
//! first use and cached by `hf-hub`. Inference runs on the CPU; token
//! embeddings are mean-pooled and L2-normalised.

use crate::Embedder;
use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config, DTYPE};
use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use solefacts_core::{CoreError, EmbeddingError};
use std::path::PathBuf;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

/// MiniLM was trained on sequences of at most this many tokens.
pub const MAX_SEQUENCE_TOKENS: usize = 256;

pub struct BertEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    model_name: String,
    dimension: usize,
}

struct ModelFiles {
    config: PathBuf,
    tokenizer: PathBuf,
    weights: PathBuf,
}

impl BertEmbedder {
    /// Downloads (or reuses the cached copy of) `model_name` and loads it.
    pub fn load(model_name: &str) -> Result<Self, CoreError> {
        info!("Loading embedding model {}", model_name);
        let files = Self::fetch(model_name)?;
        let device = Device::Cpu;

        let raw_config = std::fs::read_to_string(&files.config)?;
        let invalid_config = |e: serde_json::Error| EmbeddingError::ModelLoadingFailed {
            model: model_name.to_string(),
            reason: format!("invalid config.json: {}", e),
        };
        let config: Config = serde_json::from_str(&raw_config).map_err(invalid_config)?;
        let dimension = serde_json::from_str::<serde_json::Value>(&raw_config)
            .map_err(invalid_config)?
            .get("hidden_size")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| EmbeddingError::ModelLoadingFailed {
                model: model_name.to_string(),
                reason: "config.json has no hidden_size".to_string(),
            })? as usize;

        let mut tokenizer =
            Tokenizer::from_file(&files.tokenizer).map_err(|e| EmbeddingError::ModelLoadingFailed {
                model: model_name.to_string(),
                reason: format!("invalid tokenizer.json: {}", e),
            })?;
        tokenizer
            .with_padding(None)
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| EmbeddingError::ModelLoadingFailed {
                model: model_name.to_string(),
                reason: format!("tokenizer truncation: {}", e),
            })?;

        // SAFETY: the weights file is owned by the hf-hub cache and not modified while mapped.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[files.weights], DTYPE, &device) }
            .map_err(|e| load_failed(model_name, e))?;
        let model = BertModel::load(vb, &config).map_err(|e| load_failed(model_name, e))?;

        info!(
            "Embedding model {} ready ({} dimensions)",
            model_name, dimension
        );

        Ok(Self {
            model,
            tokenizer,
            device,
            model_name: model_name.to_string(),
            dimension,
        })
    }

    fn fetch(model_name: &str) -> Result<ModelFiles, CoreError> {
        let api = Api::new().map_err(|e| EmbeddingError::DownloadFailed {
            model: model_name.to_string(),
            file: "-".to_string(),
            reason: e.to_string(),
        })?;
        let repo = api.repo(Repo::new(model_name.to_string(), RepoType::Model));

        let get = |file: &str| {
            repo.get(file).map_err(|e| EmbeddingError::DownloadFailed {
                model: model_name.to_string(),
                file: file.to_string(),
                reason: e.to_string(),
            })
        };

        Ok(ModelFiles {
            config: get("config.json")?,
            tokenizer: get("tokenizer.json")?,
            weights: get("model.safetensors")?,
        })
    }

    fn forward(&self, ids: &[u32]) -> Result<Vec<f32>, candle_core::Error> {
        let token_ids = Tensor::new(ids, &self.device)?.unsqueeze(0)?;
        let token_type_ids = token_ids.zeros_like()?;
        let hidden = self.model.forward(&token_ids, &token_type_ids)?;

        // (1, tokens, hidden) -> (1, hidden)
        let (_, n_tokens, _) = hidden.dims3()?;
        let pooled = (hidden.sum(1)? / n_tokens as f64)?;
        let normalized = pooled.broadcast_div(&pooled.sqr()?.sum_keepdim(1)?.sqrt()?)?;

        normalized.squeeze(0)?.to_vec1::<f32>()
    }
}

impl Embedder for BertEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, CoreError> {
        debug!("Embedding {} characters", text.len());
        let ids = token_ids(&self.tokenizer, text)?;
        let vector = self
            .forward(&ids)
            .map_err(|e| EmbeddingError::InferenceFailed {
                reason: e.to_string(),
            })?;
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

fn token_ids(tokenizer: &Tokenizer, text: &str) -> Result<Vec<u32>, EmbeddingError> {
    tokenizer
        .encode(text, true)
        .map(|encoding| encoding.get_ids().to_vec())
        .map_err(|e| EmbeddingError::TokenizationFailed {
            text_length: text.len(),
            reason: e.to_string(),
        })
}

fn load_failed(model_name: &str, e: candle_core::Error) -> CoreError {
    EmbeddingError::ModelLoadingFailed {
        model: model_name.to_string(),
        reason: e.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    // Word-level vocabulary with no unknown token: any other word fails to encode.
    const CLOSED_VOCAB_TOKENIZER: &str = r#"{
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": null,
        "post_processor": null,
        "decoder": null,
        "model": { "type": "WordLevel", "vocab": { "pegasus": 0 }, "unk_token": "[UNK]" }
    }"#;

    #[test]
    fn test_token_ids_for_known_text() {
        let tokenizer = Tokenizer::from_str(CLOSED_VOCAB_TOKENIZER).unwrap();
        assert_eq!(token_ids(&tokenizer, "pegasus").unwrap(), vec![0]);
    }

    #[test]
    fn test_tokenizer_failure_is_a_tokenization_error() {
        let tokenizer = Tokenizer::from_str(CLOSED_VOCAB_TOKENIZER).unwrap();
        let err = token_ids(&tokenizer, "vaporfly").unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::TokenizationFailed { text_length: 8, .. }
        ));
    }

    #[test]
    #[ignore] // Downloads the model from the Hugging Face hub
    fn test_minilm_embeddings_are_normalised() {
        let embedder = BertEmbedder::load("sentence-transformers/all-MiniLM-L6-v2").unwrap();
        assert_eq!(embedder.dimension(), 384);

        let vector = embedder.embed("Which shoes are best for heel pain?").unwrap();
        assert_eq!(vector.len(), 384);
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }
}
