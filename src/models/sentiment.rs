use crate::loaders::{ConfigLoader, TokenizerLoader, WeightsLoader};
use crate::models::classifier::LabelMap;
use crate::models::{distilbert, roberta, ModelChoice};
use crate::pipelines::sentiment_analysis::{SentimentAnalysisModel, SentimentResult};
use anyhow::Result;
use candle_core::{DType, Device, Tensor};
use std::sync::Arc;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

/// Longest input fed to either model; longer reviews are truncated.
pub const MAX_SEQUENCE_LENGTH: usize = 512;

enum Classifier {
    DistilBert(distilbert::DistilBertForSequenceClassification),
    Roberta(roberta::RobertaForSequenceClassification),
}

impl Classifier {
    fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor> {
        match self {
            Classifier::DistilBert(model) => model.forward(input_ids, attention_mask),
            Classifier::Roberta(model) => model.forward(input_ids, attention_mask),
        }
    }
}

struct Inner {
    classifier: Classifier,
    tokenizer: Tokenizer,
    labels: LabelMap,
}

/// One of the pretrained sentiment checkpoints, ready for inference.
///
/// Clones share weights and tokenizer.
#[derive(Clone)]
pub struct SentimentModel {
    choice: ModelChoice,
    inner: Arc<Inner>,
    device: Device,
}

impl SentimentModel {
    pub async fn load(choice: ModelChoice, device: Device) -> Result<Self> {
        let repo = choice.repo_id();
        tracing::info!(model = %choice.display_name(), repo, device = ?device.location(), "loading sentiment model");

        let config_loader = ConfigLoader::new(repo, "config.json");
        let weights = WeightsLoader::new(repo).load(DType::F32, &device).await?;

        let (classifier, labels, max_length) = match choice {
            ModelChoice::DistilBert => {
                let (config, raw) = config_loader.load::<distilbert::Config>().await?;
                let labels = LabelMap::from_config_json(&raw)?;
                let model = distilbert::DistilBertForSequenceClassification::load(
                    weights,
                    &config,
                    labels.len(),
                )?;
                let max_length = MAX_SEQUENCE_LENGTH.min(config.max_position_embeddings);
                (Classifier::DistilBert(model), labels, max_length)
            }
            ModelChoice::Roberta => {
                let (config, raw) = config_loader.load::<roberta::Config>().await?;
                let labels = LabelMap::from_config_json(&raw)?;
                let model = roberta::RobertaForSequenceClassification::load(
                    weights,
                    &config,
                    labels.len(),
                )?;
                let max_length = MAX_SEQUENCE_LENGTH.min(config.max_sequence_length());
                (Classifier::Roberta(model), labels, max_length)
            }
        };

        let mut tokenizer = TokenizerLoader::new(repo, "tokenizer.json")
            .with_fallback(choice.tokenizer_fallback_repo())
            .load()
            .await?;
        configure_tokenizer(&mut tokenizer, max_length)?;

        tracing::info!(model = %choice.display_name(), labels = labels.len(), max_length, "sentiment model ready");

        Ok(Self {
            choice,
            inner: Arc::new(Inner {
                classifier,
                tokenizer,
                labels,
            }),
            device,
        })
    }

    pub fn choice(&self) -> ModelChoice {
        self.choice
    }
}

/// Truncate to `max_length` tokens and pad batches to their longest member.
pub fn configure_tokenizer(tokenizer: &mut Tokenizer, max_length: usize) -> Result<()> {
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            ..Default::default()
        }))
        .map_err(anyhow::Error::msg)?;

    let (pad_id, pad_token) = match tokenizer.get_padding() {
        Some(padding) => (padding.pad_id, padding.pad_token.clone()),
        None => ["<pad>", "[PAD]"]
            .into_iter()
            .find_map(|token| tokenizer.token_to_id(token).map(|id| (id, token.to_string())))
            .unwrap_or((0, "[PAD]".to_string())),
    };

    tokenizer.with_padding(Some(PaddingParams {
        strategy: PaddingStrategy::BatchLongest,
        pad_id,
        pad_token,
        ..Default::default()
    }));
    Ok(())
}

impl SentimentAnalysisModel for SentimentModel {
    type Options = ModelChoice;

    async fn new(options: Self::Options, device: Device) -> Result<Self> {
        Self::load(options, device).await
    }

    fn classify(&self, texts: &[&str]) -> Result<Vec<SentimentResult>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = self
            .inner
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("tokenization error: {e}"))?;

        let batch_size = encodings.len();
        let seq_len = encodings.first().map_or(0, |e| e.get_ids().len());

        let mut ids = Vec::with_capacity(batch_size * seq_len);
        let mut mask = Vec::with_capacity(batch_size * seq_len);
        for encoding in &encodings {
            ids.extend_from_slice(encoding.get_ids());
            mask.extend_from_slice(encoding.get_attention_mask());
        }

        let input_ids = Tensor::from_vec(ids, (batch_size, seq_len), &self.device)?;
        let attention_mask = Tensor::from_vec(mask, (batch_size, seq_len), &self.device)?;

        let logits = self.inner.classifier.forward(&input_ids, &attention_mask)?;
        self.inner.labels.decode(&logits)
    }

    fn device(&self) -> &Device {
        &self.device
    }
}
