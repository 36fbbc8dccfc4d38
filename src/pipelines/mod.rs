//! Inference pipelines.
//!
//! Only sentiment analysis is provided; [`utils`] holds device selection and
//! model-cache keys shared by pipeline builders.

pub mod sentiment_analysis;
pub mod utils;

pub use sentiment_analysis::*;
