//! RoBERTa encoder with the sequence-classification head used by
//! `siebert/sentiment-roberta-large-english`.

use crate::models::layers::{
    extended_attention_mask, layer_norm_compat, AttentionNames, HiddenAct, SelfAttention,
};
use candle_core::{DType, IndexOp, Module, Result, Tensor};
use candle_nn::{embedding, linear, Embedding, LayerNorm, Linear, VarBuilder};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    pub vocab_size: usize,
    pub hidden_size: usize,
    pub num_hidden_layers: usize,
    pub num_attention_heads: usize,
    pub intermediate_size: usize,
    #[serde(default)]
    pub hidden_act: HiddenAct,
    pub max_position_embeddings: usize,
    #[serde(default = "default_type_vocab_size")]
    pub type_vocab_size: usize,
    #[serde(default = "default_layer_norm_eps")]
    pub layer_norm_eps: f64,
    #[serde(default = "default_pad_token_id")]
    pub pad_token_id: u32,
}

fn default_type_vocab_size() -> usize {
    1
}

fn default_layer_norm_eps() -> f64 {
    1e-5
}

fn default_pad_token_id() -> u32 {
    1
}

impl Config {
    /// Longest input the position embeddings can address.
    ///
    /// Positions start after the padding index, so `max_position_embeddings`
    /// of 514 leaves room for 512 tokens.
    pub fn max_sequence_length(&self) -> usize {
        self.max_position_embeddings
            .saturating_sub(self.pad_token_id as usize + 1)
    }
}

/// Position ids count non-padding tokens from `padding_idx + 1`; padding
/// tokens keep `padding_idx`.
fn position_ids(input_ids: &Tensor, padding_idx: u32) -> Result<Tensor> {
    let (batch_size, seq_len) = input_ids.dims2()?;
    let rows = input_ids.to_vec2::<u32>()?;

    let mut positions = Vec::with_capacity(batch_size * seq_len);
    for row in rows {
        let mut seen = 0u32;
        for id in row {
            if id == padding_idx {
                positions.push(padding_idx);
            } else {
                seen += 1;
                positions.push(padding_idx + seen);
            }
        }
    }

    Tensor::from_vec(positions, (batch_size, seq_len), input_ids.device())
}

#[derive(Debug, Clone)]
struct Embeddings {
    word_embeddings: Embedding,
    position_embeddings: Embedding,
    token_type_embeddings: Embedding,
    layer_norm: LayerNorm,
    padding_idx: u32,
}

impl Embeddings {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        Ok(Self {
            word_embeddings: embedding(
                config.vocab_size,
                config.hidden_size,
                vb.pp("word_embeddings"),
            )?,
            position_embeddings: embedding(
                config.max_position_embeddings,
                config.hidden_size,
                vb.pp("position_embeddings"),
            )?,
            token_type_embeddings: embedding(
                config.type_vocab_size,
                config.hidden_size,
                vb.pp("token_type_embeddings"),
            )?,
            layer_norm: layer_norm_compat(
                config.hidden_size,
                config.layer_norm_eps,
                vb.pp("LayerNorm"),
            )?,
            padding_idx: config.pad_token_id,
        })
    }

    fn forward(&self, input_ids: &Tensor) -> Result<Tensor> {
        let position_ids = position_ids(input_ids, self.padding_idx)?;
        let token_type_ids = input_ids.zeros_like()?;

        let embeddings = (input_ids.apply(&self.word_embeddings)?
            + token_type_ids.apply(&self.token_type_embeddings)?)?;
        let embeddings = (embeddings + position_ids.apply(&self.position_embeddings)?)?;
        embeddings.apply(&self.layer_norm)
    }
}

#[derive(Debug, Clone)]
struct EncoderLayer {
    attention: SelfAttention,
    attention_output: Linear,
    attention_norm: LayerNorm,
    intermediate: Linear,
    output: Linear,
    output_norm: LayerNorm,
    activation: HiddenAct,
}

impl EncoderLayer {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let hidden = config.hidden_size;
        let eps = config.layer_norm_eps;
        let names = AttentionNames {
            query: "query",
            key: "key",
            value: "value",
        };
        Ok(Self {
            attention: SelfAttention::load(
                vb.pp("attention.self"),
                hidden,
                config.num_attention_heads,
                &names,
            )?,
            attention_output: linear(hidden, hidden, vb.pp("attention.output.dense"))?,
            attention_norm: layer_norm_compat(hidden, eps, vb.pp("attention.output.LayerNorm"))?,
            intermediate: linear(hidden, config.intermediate_size, vb.pp("intermediate.dense"))?,
            output: linear(config.intermediate_size, hidden, vb.pp("output.dense"))?,
            output_norm: layer_norm_compat(hidden, eps, vb.pp("output.LayerNorm"))?,
            activation: config.hidden_act,
        })
    }

    fn forward(&self, hidden_states: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let attention_output = self
            .attention
            .forward(hidden_states, attention_mask)?
            .apply(&self.attention_output)?;
        let hidden_states = (attention_output + hidden_states)?.apply(&self.attention_norm)?;

        let output = hidden_states
            .apply(&self.intermediate)?
            .apply(&self.activation)?
            .apply(&self.output)?;
        (output + hidden_states)?.apply(&self.output_norm)
    }
}

#[derive(Debug, Clone)]
struct ClassificationHead {
    dense: Linear,
    out_proj: Linear,
}

impl ClassificationHead {
    fn load(vb: VarBuilder, hidden_size: usize, num_labels: usize) -> Result<Self> {
        Ok(Self {
            dense: linear(hidden_size, hidden_size, vb.pp("dense"))?,
            out_proj: linear(hidden_size, num_labels, vb.pp("out_proj"))?,
        })
    }
}

impl Module for ClassificationHead {
    fn forward(&self, hidden_states: &Tensor) -> Result<Tensor> {
        hidden_states
            .i((.., 0, ..))?
            .apply(&self.dense)?
            .tanh()?
            .apply(&self.out_proj)
    }
}

/// RoBERTa with its `<s>`-token classification head.
#[derive(Debug, Clone)]
pub struct RobertaForSequenceClassification {
    embeddings: Embeddings,
    layers: Vec<EncoderLayer>,
    classifier: ClassificationHead,
    dtype: DType,
}

impl RobertaForSequenceClassification {
    pub fn load(vb: VarBuilder, config: &Config, num_labels: usize) -> Result<Self> {
        let body = vb.pp("roberta");
        let embeddings = Embeddings::load(body.pp("embeddings"), config)?;

        let mut layers = Vec::with_capacity(config.num_hidden_layers);
        for layer_idx in 0..config.num_hidden_layers {
            layers.push(EncoderLayer::load(
                body.pp(format!("encoder.layer.{layer_idx}")),
                config,
            )?);
        }

        Ok(Self {
            embeddings,
            layers,
            classifier: ClassificationHead::load(
                vb.pp("classifier"),
                config.hidden_size,
                num_labels,
            )?,
            dtype: vb.dtype(),
        })
    }

    /// Returns logits with shape `(batch_size, num_labels)`.
    pub fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let mask = extended_attention_mask(attention_mask, self.dtype)?;

        let mut hidden_states = self.embeddings.forward(input_ids)?;
        for layer in &self.layers {
            hidden_states = layer.forward(&hidden_states, &mask)?;
        }

        hidden_states.apply(&self.classifier)
    }
}
