//! Pretrained sentiment classifiers.
//!
//! Two off-the-shelf checkpoints are supported, selected with [`ModelChoice`]:
//! a distilled BERT fine-tuned on SST-2 (fast) and a RoBERTa-large fine-tuned
//! on a mix of English review datasets (more accurate, much slower).

pub mod classifier;
pub mod distilbert;
pub mod layers;
pub mod roberta;
pub mod sentiment;

pub use classifier::LabelMap;
pub use distilbert::DistilBertForSequenceClassification;
pub use roberta::RobertaForSequenceClassification;
pub use sentiment::SentimentModel;

use crate::core::{ModelOptions, ReviewError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The selectable sentiment models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ModelChoice {
    #[default]
    DistilBert,
    Roberta,
}

impl ModelChoice {
    pub const ALL: [ModelChoice; 2] = [ModelChoice::DistilBert, ModelChoice::Roberta];

    /// Lower-case name used on the command line and in output file names.
    pub fn cli_name(&self) -> &'static str {
        match self {
            ModelChoice::DistilBert => "distilbert",
            ModelChoice::Roberta => "roberta",
        }
    }

    /// Name shown in the demo UI and in demo download file names.
    pub fn display_name(&self) -> &'static str {
        match self {
            ModelChoice::DistilBert => "DistilBERT",
            ModelChoice::Roberta => "RoBERTa",
        }
    }

    /// Hugging Face repository holding the fine-tuned weights.
    pub fn repo_id(&self) -> &'static str {
        match self {
            ModelChoice::DistilBert => "distilbert-base-uncased-finetuned-sst-2-english",
            ModelChoice::Roberta => "siebert/sentiment-roberta-large-english",
        }
    }

    /// Base model whose `tokenizer.json` matches the fine-tuned vocabulary.
    pub fn tokenizer_fallback_repo(&self) -> &'static str {
        match self {
            ModelChoice::DistilBert => "distilbert-base-uncased",
            ModelChoice::Roberta => "FacebookAI/roberta-large",
        }
    }
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cli_name())
    }
}

impl FromStr for ModelChoice {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        ModelChoice::ALL
            .into_iter()
            .find(|choice| {
                name.eq_ignore_ascii_case(choice.cli_name())
                    || name.eq_ignore_ascii_case(choice.display_name())
            })
            .ok_or_else(|| ReviewError::UnsupportedModel(name.to_string()))
    }
}

impl TryFrom<String> for ModelChoice {
    type Error = ReviewError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ModelChoice> for String {
    fn from(choice: ModelChoice) -> Self {
        choice.cli_name().to_string()
    }
}

impl ModelOptions for ModelChoice {
    fn cache_key(&self) -> String {
        self.cli_name().to_string()
    }
}
