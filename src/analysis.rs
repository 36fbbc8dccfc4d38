//! Batch sentiment scoring of a review file, the work behind `review-sentiment analyze`.

use crate::core::{CsvFormat, InferenceConfig, ReviewError};
use crate::eda::{label_distribution, GroupSummary};
use crate::models::{ModelChoice, SentimentModel};
use crate::pipelines::sentiment_analysis::{
    SentimentAnalysisModel, SentimentAnalysisPipeline, SentimentAnalysisPipelineBuilder,
    SentimentResult,
};
use crate::reviews::{batch_output_path, read_reviews, write_scored_file, ReviewTable};
use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

#[derive(Clone)]
pub struct AnalysisRequest {
    pub input: PathBuf,
    pub model: ModelChoice,
    /// Defaults to the input file's directory.
    pub output_dir: Option<PathBuf>,
    pub format: CsvFormat,
    pub inference: InferenceConfig,
    pub show_progress: bool,
}

impl AnalysisRequest {
    pub fn new(input: impl Into<PathBuf>, model: ModelChoice) -> Self {
        Self {
            input: input.into(),
            model,
            output_dir: None,
            format: CsvFormat::default(),
            inference: InferenceConfig::default(),
            show_progress: true,
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        resolve_output_dir(&self.input, self.output_dir.as_deref())
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisSummary {
    pub output_path: PathBuf,
    pub reviews: usize,
    pub labels: Vec<GroupSummary>,
}

/// A validated input table and where its results will be written.
#[derive(Debug)]
pub struct PreparedInput {
    pub table: ReviewTable,
    pub output_path: PathBuf,
}

/// Explicit directory, else the input's parent, else the working directory.
pub fn resolve_output_dir(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => match input.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        },
    }
}

/// Check paths, read the table and validate its reviews without loading a model.
pub fn prepare(request: &AnalysisRequest) -> anyhow::Result<PreparedInput> {
    if !request.input.is_file() {
        return Err(ReviewError::InputNotFound(request.input.clone()).into());
    }
    let output_dir = request.output_dir();
    if !output_dir.is_dir() {
        return Err(ReviewError::OutputDirNotFound(output_dir).into());
    }

    let table = read_reviews(&request.input, &request.format)?;
    table.reviews()?;

    Ok(PreparedInput {
        output_path: batch_output_path(&output_dir, request.model, &request.input),
        table,
    })
}

/// Classify every review of `table`, calling `on_batch` with progress.
pub fn classify_table<M, F>(
    pipeline: &SentimentAnalysisPipeline<M>,
    table: &ReviewTable,
    on_batch: F,
) -> anyhow::Result<Vec<SentimentResult>>
where
    M: SentimentAnalysisModel,
    F: FnMut(usize),
{
    let reviews = table.reviews()?;
    pipeline
        .predict_batch_with_progress(&reviews, on_batch)
        .context("Error during sentiment analysis")
}

fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len as u64);
    let style = ProgressStyle::with_template(
        "{msg} {bar:40.cyan/blue} {pos}/{len} [{elapsed_precise}<{eta_precise}]",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar.set_message("Processing");
    bar
}

/// Score a prepared table with `pipeline` and write the results.
pub async fn analyze_with<M>(
    pipeline: SentimentAnalysisPipeline<M>,
    prepared: PreparedInput,
    show_progress: bool,
) -> anyhow::Result<AnalysisSummary>
where
    M: SentimentAnalysisModel + Send + Sync + 'static,
{
    let PreparedInput { table, output_path } = prepared;

    let (table, results) = tokio::task::spawn_blocking(move || {
        let bar = progress_bar(table.len(), show_progress);
        let results = classify_table(&pipeline, &table, |done| bar.set_position(done as u64));
        bar.finish_and_clear();
        results.map(|results| (table, results))
    })
    .await??;

    let reviews = table.reviews()?;
    write_scored_file(&output_path, &reviews, &results)?;

    let labels = label_distribution(&results);
    for group in &labels {
        tracing::info!(label = %group.key, count = group.count, mean_score = group.mean, "label distribution");
    }
    tracing::info!(path = %output_path.display(), reviews = results.len(), "sentiment analysis complete");

    Ok(AnalysisSummary {
        output_path,
        reviews: results.len(),
        labels,
    })
}

/// Validate the input, load the requested model and write scored reviews.
pub async fn analyze_file(request: &AnalysisRequest) -> anyhow::Result<AnalysisSummary> {
    let prepared = prepare(request)?;

    tracing::info!(model = %request.model, "using model");
    let mut builder = SentimentAnalysisPipelineBuilder::<SentimentModel>::new(request.model)
        .device_request(request.inference.device.clone());
    if let Some(batch_size) = request.inference.batch_size {
        builder = builder.batch_size(batch_size);
    }
    let pipeline = builder.build().await.context("Error loading model")?;

    analyze_with(pipeline, prepared, request.show_progress).await
}
