//! Sentiment analysis pipeline for classifying the tone of reviews.
//!
//! ## Main Types
//!
//! - [`SentimentAnalysisPipeline`] - classify one review or many, in batches
//! - [`SentimentAnalysisPipelineBuilder`] - model, device and batch-size selection
//! - [`SentimentAnalysisModel`] - trait implemented by classifier backends
//! - [`SentimentResult`] - predicted label and its confidence
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use review_sentiment::pipelines::sentiment_analysis::*;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let pipeline = SentimentAnalysisPipelineBuilder::distilbert()
//!     .cpu()
//!     .build()
//!     .await?;
//!
//! let result = pipeline.predict("A gripping, beautifully shot film.")?;
//! println!("{} ({:.4})", result.label, result.score);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod model;
pub mod pipeline;

pub use builder::{SentimentAnalysisPipelineBuilder, DEFAULT_BATCH_SIZE};
pub use model::SentimentAnalysisModel;
pub use pipeline::{SentimentAnalysisPipeline, SentimentResult};

pub use crate::models::{ModelChoice, SentimentModel};
