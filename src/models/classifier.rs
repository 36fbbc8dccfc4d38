use crate::pipelines::sentiment_analysis::SentimentResult;
use anyhow::{anyhow, Result};
use candle_core::{DType, Tensor, D};
use candle_nn::ops::softmax;
use serde::Deserialize;
use std::collections::HashMap;

/// Class index to label mapping read from a checkpoint's `config.json`.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMap {
    labels: Vec<String>,
}

#[derive(Deserialize)]
struct RawLabelConfig {
    id2label: Option<HashMap<String, String>>,
    num_labels: Option<usize>,
}

impl LabelMap {
    pub fn new(labels: Vec<String>) -> Self {
        Self {
            labels: labels.iter().map(|l| format_label(l)).collect(),
        }
    }

    /// Build the map from the raw JSON of a Hugging Face model config.
    ///
    /// Configs without `id2label` get `LABEL_<i>` names, as transformers does.
    pub fn from_config_json(content: &str) -> Result<Self> {
        let raw: RawLabelConfig = serde_json::from_str(content)
            .map_err(|e| anyhow!("failed to parse classifier config: {e}"))?;

        let Some(id2label) = raw.id2label else {
            let n = raw.num_labels.unwrap_or(2);
            return Ok(Self::new((0..n).map(|i| format!("LABEL_{i}")).collect()));
        };

        let mut indexed = id2label
            .into_iter()
            .map(|(id, label)| {
                id.parse::<usize>()
                    .map(|id| (id, label))
                    .map_err(|_| anyhow!("id2label key '{id}' is not a class index"))
            })
            .collect::<Result<Vec<_>>>()?;
        indexed.sort_by_key(|(id, _)| *id);

        for (expected, (id, _)) in indexed.iter().enumerate() {
            if *id != expected {
                return Err(anyhow!("id2label is missing class index {expected}"));
            }
        }

        Ok(Self::new(indexed.into_iter().map(|(_, label)| label).collect()))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Turn `(batch, num_labels)` logits into the top label and its probability per row.
    pub fn decode(&self, logits: &Tensor) -> Result<Vec<SentimentResult>> {
        let probabilities = softmax(&logits.to_dtype(DType::F32)?, D::Minus1)?.to_vec2::<f32>()?;

        probabilities
            .into_iter()
            .map(|row| {
                let (index, score) = row
                    .iter()
                    .copied()
                    .enumerate()
                    .max_by(|a, b| a.1.total_cmp(&b.1))
                    .ok_or_else(|| anyhow!("classifier produced no logits"))?;
                let label = self
                    .get(index)
                    .ok_or_else(|| anyhow!("predicted class {index} has no label"))?;
                Ok(SentimentResult {
                    label: label.to_string(),
                    score,
                })
            })
            .collect()
    }
}

/// Labels are reported upper-case (`POSITIVE`, `NEGATIVE`) whatever the checkpoint uses.
pub fn format_label(raw: &str) -> String {
    raw.trim().to_uppercase()
}
