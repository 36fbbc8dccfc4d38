//! Hugging Face Hub loaders for classifier assets.
//!
//! - [`HfLoader`] - fetches one file from a model repository, with retries
//! - [`TokenizerLoader`] - `tokenizer.json`, optionally from a fallback repo
//! - [`ConfigLoader`] - `config.json` deserialised into a model config
//! - [`WeightsLoader`] - `model.safetensors` or `pytorch_model.bin` as a `VarBuilder`
//!
//! Files land in the regular Hugging Face cache (`HF_HOME`), so every asset is
//! downloaded once per machine.

use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use tokenizers::Tokenizer;

const MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone)]
pub struct HfLoader {
    pub repo: String,
    pub filename: String,
}

impl HfLoader {
    pub fn new(repo: &str, filename: &str) -> Self {
        Self {
            repo: repo.into(),
            filename: filename.into(),
        }
    }

    /// Download the file (or reuse the cached copy) and return its local path.
    pub async fn load(&self) -> anyhow::Result<PathBuf> {
        let hf_api = hf_hub::api::tokio::ApiBuilder::from_env()
            .with_chunk_size(None)
            .build()?;
        let hf_api = hf_api.model(self.repo.clone());

        let mut attempt = 0;
        loop {
            match hf_api.get(self.filename.as_str()).await {
                Ok(path) => {
                    tracing::debug!(repo = %self.repo, file = %self.filename, path = %path.display(), "resolved hub file");
                    return Ok(path);
                }
                Err(e) => {
                    // Concurrent downloads of the same file race on the cache lock.
                    let lock_failure = e.to_string().contains("Lock acquisition failed");
                    if lock_failure && attempt + 1 < MAX_RETRIES {
                        let wait_time = std::time::Duration::from_millis(100 * (1 << attempt));
                        tracing::warn!(repo = %self.repo, file = %self.filename, ?wait_time, "hub cache locked, retrying");
                        tokio::time::sleep(wait_time).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(anyhow::Error::new(e).context(format!(
                        "failed to fetch '{}' from '{}'",
                        self.filename, self.repo
                    )));
                }
            }
        }
    }
}

/// Loads `tokenizer.json`, trying each repository in turn.
///
/// Several fine-tuned checkpoints only ship the slow-tokenizer files
/// (`vocab.txt`, `merges.txt`); their base model's `tokenizer.json` is
/// identical and serves as the fallback.
#[derive(Clone)]
pub struct TokenizerLoader {
    pub tokenizer_file_loader: HfLoader,
    pub fallback: Option<HfLoader>,
}

impl TokenizerLoader {
    pub fn new(repo: &str, filename: &str) -> Self {
        Self {
            tokenizer_file_loader: HfLoader::new(repo, filename),
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, repo: &str) -> Self {
        self.fallback = Some(HfLoader::new(repo, &self.tokenizer_file_loader.filename));
        self
    }

    pub async fn load(&self) -> anyhow::Result<Tokenizer> {
        let tokenizer_file_path = match (self.tokenizer_file_loader.load().await, &self.fallback) {
            (Ok(path), _) => path,
            (Err(e), Some(fallback)) => {
                tracing::warn!(
                    repo = %self.tokenizer_file_loader.repo,
                    fallback = %fallback.repo,
                    "no tokenizer in model repo ({e:#}), using fallback"
                );
                fallback.load().await?
            }
            (Err(e), None) => return Err(e),
        };

        Tokenizer::from_file(tokenizer_file_path).map_err(anyhow::Error::msg)
    }
}

/// Loads a JSON configuration file into `C`.
pub struct ConfigLoader {
    pub config_file_loader: HfLoader,
}

impl ConfigLoader {
    pub fn new(repo: &str, filename: &str) -> Self {
        Self {
            config_file_loader: HfLoader::new(repo, filename),
        }
    }

    /// Returns the parsed config together with the raw JSON text.
    pub async fn load<C: DeserializeOwned>(&self) -> anyhow::Result<(C, String)> {
        let path = self.config_file_loader.load().await?;
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to read config file {:?}: {}", path, e))?;
        let config = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("failed to parse config file {:?}: {}", path, e))?;
        Ok((config, content))
    }
}

/// Loads classifier weights, preferring safetensors over pickled PyTorch files.
#[derive(Clone)]
pub struct WeightsLoader {
    pub repo: String,
}

impl WeightsLoader {
    const SAFETENSORS: &'static str = "model.safetensors";
    const PYTORCH: &'static str = "pytorch_model.bin";

    pub fn new(repo: &str) -> Self {
        Self { repo: repo.into() }
    }

    pub async fn load(&self, dtype: DType, device: &Device) -> anyhow::Result<VarBuilder<'static>> {
        match HfLoader::new(&self.repo, Self::SAFETENSORS).load().await {
            Ok(path) => {
                // SAFETY: the file lives in the hub cache and is not modified while mapped.
                let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[path], dtype, device)? };
                Ok(vb)
            }
            Err(safetensors_err) => {
                tracing::warn!(repo = %self.repo, "no safetensors weights ({safetensors_err:#}), trying {}", Self::PYTORCH);
                let path = HfLoader::new(&self.repo, Self::PYTORCH)
                    .load()
                    .await
                    .map_err(|e| {
                        anyhow::anyhow!(
                            "model weights not found in '{}'. Expected `{}` or `{}`: {e:#}",
                            self.repo,
                            Self::SAFETENSORS,
                            Self::PYTORCH
                        )
                    })?;
                Ok(VarBuilder::from_pth(&path, dtype, device)?)
            }
        }
    }
}
