//! Exploratory analysis and sentiment scoring for CSV files of movie reviews.
//!
//! Reviews are classified with one of two pretrained transformer checkpoints
//! (DistilBERT fine-tuned on SST-2, or SiEBERT's RoBERTa-large) running on
//! Candle. The crate provides:
//!
//! - [`reviews`] - reading, validating and writing review CSV files
//! - [`eda`] - word counts, summary statistics and group aggregates
//! - [`pipelines`] - the sentiment analysis pipeline and its builder
//! - [`analysis`] - the batch job behind `review-sentiment analyze`
//! - [`demo`] - a small web UI for ad-hoc testing

pub mod analysis;
pub mod core;
pub mod demo;
pub mod eda;
mod loaders;
pub mod models;
pub mod pipelines;
pub mod reviews;

pub use crate::core::{CsvFormat, InferenceConfig, ReviewError};
pub use models::ModelChoice;
pub use pipelines::sentiment_analysis::{
    SentimentAnalysisModel, SentimentAnalysisPipeline, SentimentAnalysisPipelineBuilder,
    SentimentResult,
};
