use super::model::SentimentAnalysisModel;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentResult {
    pub label: String,
    /// Softmax probability of `label`.
    pub score: f32,
}

pub struct SentimentAnalysisPipeline<M: SentimentAnalysisModel> {
    pub(crate) model: M,
    pub(crate) batch_size: usize,
}

impl<M: SentimentAnalysisModel> SentimentAnalysisPipeline<M> {
    /// Wrap an already loaded model, bypassing the model cache.
    pub fn from_model(model: M, batch_size: usize) -> Self {
        Self {
            model,
            batch_size: batch_size.max(1),
        }
    }

    /// Predict the sentiment of a single text.
    pub fn predict(&self, text: &str) -> anyhow::Result<SentimentResult> {
        self.model
            .classify(&[text])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("model returned no prediction"))
    }

    /// Predict the sentiment of every text, in input order.
    pub fn predict_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<SentimentResult>> {
        self.predict_batch_with_progress(texts, |_| {})
    }

    /// Like [`predict_batch`](Self::predict_batch), calling `on_batch` with the
    /// number of texts finished so far after every chunk.
    pub fn predict_batch_with_progress<F>(
        &self,
        texts: &[&str],
        mut on_batch: F,
    ) -> anyhow::Result<Vec<SentimentResult>>
    where
        F: FnMut(usize),
    {
        let mut results = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(self.batch_size) {
            let predictions = self.model.classify(chunk)?;
            if predictions.len() != chunk.len() {
                anyhow::bail!(
                    "model returned {} predictions for {} texts",
                    predictions.len(),
                    chunk.len()
                );
            }
            results.extend(predictions);
            tracing::debug!(done = results.len(), total = texts.len(), "classified batch");
            on_batch(results.len());
        }

        Ok(results)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn device(&self) -> &candle_core::Device {
        self.model.device()
    }
}
