use super::pipeline::SentimentResult;
use std::future::Future;

pub trait SentimentAnalysisModel {
    type Options: std::fmt::Debug + Clone + Send;

    fn new(
        options: Self::Options,
        device: candle_core::Device,
    ) -> impl Future<Output = anyhow::Result<Self>> + Send
    where
        Self: Sized;

    /// Classify a batch of texts, returning one result per text in input order.
    fn classify(&self, texts: &[&str]) -> anyhow::Result<Vec<SentimentResult>>;

    fn device(&self) -> &candle_core::Device;
}
