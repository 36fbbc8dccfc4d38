//! DistilBERT encoder with the sequence-classification head used by
//! `distilbert-base-uncased-finetuned-sst-2-english`.
//!
//! Parameter names follow the transformers checkpoint layout
//! (`distilbert.transformer.layer.{i}.attention.q_lin`, `pre_classifier`, ...).

use crate::models::layers::{
    extended_attention_mask, layer_norm_compat, AttentionNames, HiddenAct, SelfAttention,
};
use candle_core::{DType, IndexOp, Module, Result, Tensor};
use candle_nn::{embedding, linear, Embedding, LayerNorm, Linear, VarBuilder};
use serde::Deserialize;

const LAYER_NORM_EPS: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    pub vocab_size: usize,
    pub dim: usize,
    pub n_layers: usize,
    pub n_heads: usize,
    pub hidden_dim: usize,
    #[serde(default)]
    pub activation: HiddenAct,
    pub max_position_embeddings: usize,
}

#[derive(Debug, Clone)]
struct Embeddings {
    word_embeddings: Embedding,
    position_embeddings: Embedding,
    layer_norm: LayerNorm,
}

impl Embeddings {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        Ok(Self {
            word_embeddings: embedding(config.vocab_size, config.dim, vb.pp("word_embeddings"))?,
            position_embeddings: embedding(
                config.max_position_embeddings,
                config.dim,
                vb.pp("position_embeddings"),
            )?,
            layer_norm: layer_norm_compat(config.dim, LAYER_NORM_EPS, vb.pp("LayerNorm"))?,
        })
    }

    fn forward(&self, input_ids: &Tensor) -> Result<Tensor> {
        let seq_len = input_ids.dim(1)?;
        let position_ids = Tensor::arange(0u32, seq_len as u32, input_ids.device())?;

        let words = input_ids.apply(&self.word_embeddings)?;
        let positions = position_ids.apply(&self.position_embeddings)?;
        words.broadcast_add(&positions)?.apply(&self.layer_norm)
    }
}

#[derive(Debug, Clone)]
struct FeedForward {
    lin1: Linear,
    lin2: Linear,
    activation: HiddenAct,
}

impl FeedForward {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        Ok(Self {
            lin1: linear(config.dim, config.hidden_dim, vb.pp("lin1"))?,
            lin2: linear(config.hidden_dim, config.dim, vb.pp("lin2"))?,
            activation: config.activation,
        })
    }
}

impl Module for FeedForward {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        xs.apply(&self.lin1)?
            .apply(&self.activation)?
            .apply(&self.lin2)
    }
}

/// Post-LayerNorm transformer block.
#[derive(Debug, Clone)]
struct TransformerBlock {
    attention: SelfAttention,
    out_lin: Linear,
    sa_layer_norm: LayerNorm,
    ffn: FeedForward,
    output_layer_norm: LayerNorm,
}

impl TransformerBlock {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let names = AttentionNames {
            query: "q_lin",
            key: "k_lin",
            value: "v_lin",
        };
        Ok(Self {
            attention: SelfAttention::load(vb.pp("attention"), config.dim, config.n_heads, &names)?,
            out_lin: linear(config.dim, config.dim, vb.pp("attention.out_lin"))?,
            sa_layer_norm: layer_norm_compat(config.dim, LAYER_NORM_EPS, vb.pp("sa_layer_norm"))?,
            ffn: FeedForward::load(vb.pp("ffn"), config)?,
            output_layer_norm: layer_norm_compat(
                config.dim,
                LAYER_NORM_EPS,
                vb.pp("output_layer_norm"),
            )?,
        })
    }

    fn forward(&self, hidden_states: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let attention_output = self
            .attention
            .forward(hidden_states, attention_mask)?
            .apply(&self.out_lin)?;
        let hidden_states = (attention_output + hidden_states)?.apply(&self.sa_layer_norm)?;

        let ffn_output = hidden_states.apply(&self.ffn)?;
        (ffn_output + hidden_states)?.apply(&self.output_layer_norm)
    }
}

/// DistilBERT with a two-layer classification head on the first (`[CLS]`) token.
#[derive(Debug, Clone)]
pub struct DistilBertForSequenceClassification {
    embeddings: Embeddings,
    layers: Vec<TransformerBlock>,
    pre_classifier: Linear,
    classifier: Linear,
    dtype: DType,
}

impl DistilBertForSequenceClassification {
    pub fn load(vb: VarBuilder, config: &Config, num_labels: usize) -> Result<Self> {
        let body = vb.pp("distilbert");
        let embeddings = Embeddings::load(body.pp("embeddings"), config)?;

        let mut layers = Vec::with_capacity(config.n_layers);
        for layer_idx in 0..config.n_layers {
            layers.push(TransformerBlock::load(
                body.pp(format!("transformer.layer.{layer_idx}")),
                config,
            )?);
        }

        Ok(Self {
            embeddings,
            layers,
            pre_classifier: linear(config.dim, config.dim, vb.pp("pre_classifier"))?,
            classifier: linear(config.dim, num_labels, vb.pp("classifier"))?,
            dtype: vb.dtype(),
        })
    }

    /// Returns logits with shape `(batch_size, num_labels)`.
    ///
    /// * `input_ids` - `(batch_size, seq_len)` token ids
    /// * `attention_mask` - `(batch_size, seq_len)`, 1 for tokens and 0 for padding
    pub fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let mask = extended_attention_mask(attention_mask, self.dtype)?;

        let mut hidden_states = self.embeddings.forward(input_ids)?;
        for layer in &self.layers {
            hidden_states = layer.forward(&hidden_states, &mask)?;
        }

        hidden_states
            .i((.., 0, ..))?
            .apply(&self.pre_classifier)?
            .relu()?
            .apply(&self.classifier)
    }
}
