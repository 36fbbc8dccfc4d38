//! Building blocks shared by the BERT-family encoders.

use candle_core::{DType, Module, Result, Tensor, D};
use candle_nn::{layer_norm, linear, ops::softmax, LayerNorm, Linear, VarBuilder};
use serde::Deserialize;

const MIN_VALUE_F64: f64 = f32::MIN as f64;

/// Feed-forward activation named by `hidden_act` / `activation` in model configs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HiddenAct {
    #[default]
    Gelu,
    #[serde(alias = "gelu_pytorch_tanh")]
    GeluNew,
    Relu,
}

impl Module for HiddenAct {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        match self {
            HiddenAct::Gelu => xs.gelu_erf(),
            HiddenAct::GeluNew => xs.gelu(),
            HiddenAct::Relu => xs.relu(),
        }
    }
}

/// Load a LayerNorm stored either as `weight`/`bias` or as `gamma`/`beta`
/// (older TensorFlow-converted checkpoints).
pub fn layer_norm_compat(size: usize, eps: f64, vb: VarBuilder) -> Result<LayerNorm> {
    if vb.contains_tensor("weight") {
        return layer_norm(size, eps, vb);
    }
    let weight = vb.get(size, "gamma")?;
    let bias = vb.get(size, "beta")?;
    Ok(LayerNorm::new(weight, bias, eps))
}

/// Expand a `(batch, seq_len)` padding mask (1 = token, 0 = padding) into an
/// additive `(batch, 1, 1, seq_len)` mask for attention scores.
pub fn extended_attention_mask(mask: &Tensor, dtype: DType) -> Result<Tensor> {
    let (batch_size, seq_len) = mask.dims2()?;
    let mask = mask.to_dtype(dtype)?.reshape((batch_size, 1, 1, seq_len))?;
    let inverted_mask = (1.0 - mask)?;
    inverted_mask * MIN_VALUE_F64
}

/// Parameter names of the query/key/value projections inside an attention block.
pub struct AttentionNames {
    pub query: &'static str,
    pub key: &'static str,
    pub value: &'static str,
}

/// Bidirectional multi-head self-attention without the output projection.
#[derive(Debug, Clone)]
pub struct SelfAttention {
    query: Linear,
    key: Linear,
    value: Linear,
    num_attention_heads: usize,
    attention_head_size: usize,
}

impl SelfAttention {
    pub fn load(
        vb: VarBuilder,
        hidden_size: usize,
        num_attention_heads: usize,
        names: &AttentionNames,
    ) -> Result<Self> {
        if hidden_size % num_attention_heads != 0 {
            candle_core::bail!(
                "hidden size {hidden_size} is not divisible by {num_attention_heads} attention heads"
            );
        }
        Ok(Self {
            query: linear(hidden_size, hidden_size, vb.pp(names.query))?,
            key: linear(hidden_size, hidden_size, vb.pp(names.key))?,
            value: linear(hidden_size, hidden_size, vb.pp(names.value))?,
            num_attention_heads,
            attention_head_size: hidden_size / num_attention_heads,
        })
    }

    fn split_heads(&self, xs: &Tensor) -> Result<Tensor> {
        let (batch, seq_len, _) = xs.dims3()?;
        xs.reshape((
            batch,
            seq_len,
            self.num_attention_heads,
            self.attention_head_size,
        ))?
        .transpose(1, 2)?
        .contiguous()
    }

    /// Returns the attention context with shape `(batch, seq_len, hidden_size)`.
    pub fn forward(&self, hidden_states: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let (batch, seq_len, hidden_size) = hidden_states.dims3()?;

        let q = self.split_heads(&hidden_states.apply(&self.query)?)?;
        let k = self.split_heads(&hidden_states.apply(&self.key)?)?;
        let v = self.split_heads(&hidden_states.apply(&self.value)?)?;

        let scale = (self.attention_head_size as f64).powf(-0.5);
        let q = (q * scale)?;

        let attention_scores = q.matmul(&k.transpose(D::Minus2, D::Minus1)?)?;
        let attention_scores = attention_scores.broadcast_add(attention_mask)?;
        let attention_probs = softmax(&attention_scores, D::Minus1)?;

        attention_probs
            .matmul(&v)?
            .transpose(1, 2)?
            .reshape((batch, seq_len, hidden_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    #[test]
    fn padding_positions_are_masked() {
        let mask = Tensor::new(&[[1u32, 1, 0]], &Device::Cpu).unwrap();
        let extended = extended_attention_mask(&mask, DType::F32).unwrap();

        assert_eq!(extended.dims(), &[1, 1, 1, 3]);
        let values = extended.flatten_all().unwrap().to_vec1::<f32>().unwrap();
        assert_eq!(values[0], 0.0);
        assert_eq!(values[1], 0.0);
        assert_eq!(values[2], f32::MIN);
    }

    #[test]
    fn layer_norm_loads_gamma_beta_checkpoints() -> Result<()> {
        let device = Device::Cpu;
        let tensors = std::collections::HashMap::from([
            ("ln.gamma".to_string(), Tensor::ones(4, DType::F32, &device)?),
            ("ln.beta".to_string(), Tensor::full(0.5f32, 4, &device)?),
        ]);
        let vb = VarBuilder::from_tensors(tensors, DType::F32, &device);

        let norm = layer_norm_compat(4, 1e-5, vb.pp("ln"))?;
        let xs = Tensor::new(&[[1f32, 1., 1., 1.]], &device)?;
        // Constant rows normalize to zero, leaving only the bias.
        assert_eq!(xs.apply(&norm)?.to_vec2::<f32>()?, vec![vec![0.5f32; 4]]);
        Ok(())
    }

    #[test]
    fn layer_norm_prefers_weight_bias() -> Result<()> {
        let device = Device::Cpu;
        let tensors = std::collections::HashMap::from([
            ("ln.weight".to_string(), Tensor::ones(4, DType::F32, &device)?),
            ("ln.bias".to_string(), Tensor::full(2f32, 4, &device)?),
        ]);
        let vb = VarBuilder::from_tensors(tensors, DType::F32, &device);

        let norm = layer_norm_compat(4, 1e-5, vb.pp("ln"))?;
        let xs = Tensor::new(&[[3f32, 3., 3., 3.]], &device)?;
        assert_eq!(xs.apply(&norm)?.to_vec2::<f32>()?, vec![vec![2f32; 4]]);
        Ok(())
    }

    #[test]
    fn activation_names_deserialize() {
        let act: HiddenAct = serde_json::from_str("\"gelu\"").unwrap();
        assert_eq!(act, HiddenAct::Gelu);
        let act: HiddenAct = serde_json::from_str("\"gelu_pytorch_tanh\"").unwrap();
        assert_eq!(act, HiddenAct::GeluNew);
    }
}
