use super::model::SentimentAnalysisModel;
use super::pipeline::SentimentAnalysisPipeline;
use crate::core::{global_cache, ModelOptions};
use crate::models::{ModelChoice, SentimentModel};
use crate::pipelines::utils::{build_cache_key, DeviceRequest};

pub const DEFAULT_BATCH_SIZE: usize = 8;

pub struct SentimentAnalysisPipelineBuilder<M: SentimentAnalysisModel> {
    options: M::Options,
    device_request: DeviceRequest,
    batch_size: usize,
}

impl<M: SentimentAnalysisModel> SentimentAnalysisPipelineBuilder<M> {
    pub fn new(options: M::Options) -> Self {
        Self {
            options,
            device_request: DeviceRequest::Default,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn cpu(mut self) -> Self {
        self.device_request = DeviceRequest::Cpu;
        self
    }

    pub fn cuda_device(mut self, index: usize) -> Self {
        self.device_request = DeviceRequest::Cuda(index);
        self
    }

    pub fn device(mut self, device: candle_core::Device) -> Self {
        self.device_request = DeviceRequest::Explicit(device);
        self
    }

    pub fn device_request(mut self, request: DeviceRequest) -> Self {
        self.device_request = request;
        self
    }

    /// Number of texts per forward pass; values below 1 are treated as 1.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub async fn build(self) -> anyhow::Result<SentimentAnalysisPipeline<M>>
    where
        M: Clone + Send + Sync + 'static,
        M::Options: ModelOptions,
    {
        let device = self.device_request.resolve()?;
        let key = build_cache_key(&self.options, &device);
        let options = self.options;
        let model = global_cache()
            .get_or_create(&key, || M::new(options, device))
            .await?;
        Ok(SentimentAnalysisPipeline {
            model,
            batch_size: self.batch_size,
        })
    }
}

impl SentimentAnalysisPipelineBuilder<SentimentModel> {
    pub fn distilbert() -> Self {
        Self::new(ModelChoice::DistilBert)
    }

    pub fn roberta() -> Self {
        Self::new(ModelChoice::Roberta)
    }
}
