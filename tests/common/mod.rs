#![allow(dead_code)]

use candle_core::Device;
use review_sentiment::{ModelChoice, SentimentAnalysisModel, SentimentResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Labels a text POSITIVE when it contains "good", "great" or "love".
#[derive(Clone)]
pub struct KeywordModel {
    pub batches: Arc<Mutex<Vec<usize>>>,
    device: Device,
}

pub static LOADS: AtomicUsize = AtomicUsize::new(0);

impl KeywordModel {
    pub fn new_local() -> Self {
        Self {
            batches: Arc::default(),
            device: Device::Cpu,
        }
    }
}

impl SentimentAnalysisModel for KeywordModel {
    type Options = ModelChoice;

    async fn new(_options: Self::Options, device: Device) -> anyhow::Result<Self> {
        LOADS.fetch_add(1, Ordering::SeqCst);
        Ok(Self {
            batches: Arc::default(),
            device,
        })
    }

    fn classify(&self, texts: &[&str]) -> anyhow::Result<Vec<SentimentResult>> {
        if let Ok(mut batches) = self.batches.lock() {
            batches.push(texts.len());
        }
        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                let positive = ["good", "great", "love"].iter().any(|w| lower.contains(w));
                SentimentResult {
                    label: if positive { "POSITIVE" } else { "NEGATIVE" }.to_string(),
                    score: if positive { 0.9 } else { 0.8 },
                }
            })
            .collect())
    }

    fn device(&self) -> &Device {
        &self.device
    }
}
