mod common;

use common::{KeywordModel, LOADS};
use review_sentiment::core::global_cache;
use review_sentiment::{ModelChoice, SentimentAnalysisPipeline, SentimentAnalysisPipelineBuilder};
use std::sync::atomic::Ordering;

#[test]
fn predict_single_review() -> anyhow::Result<()> {
    let pipeline = SentimentAnalysisPipeline::from_model(KeywordModel::new_local(), 8);
    let res = pipeline.predict("I love this film")?;
    assert_eq!(res.label, "POSITIVE");
    assert!((res.score - 0.9).abs() < 1e-6);
    Ok(())
}

#[test]
fn batches_are_chunked_and_ordered() -> anyhow::Result<()> {
    let model = KeywordModel::new_local();
    let batches = model.batches.clone();
    let pipeline = SentimentAnalysisPipeline::from_model(model, 2);

    let texts = ["good", "bad", "great", "awful", "love it"];
    let mut progress = Vec::new();
    let results = pipeline.predict_batch_with_progress(&texts, |done| progress.push(done))?;

    let labels: Vec<&str> = results.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(
        labels,
        ["POSITIVE", "NEGATIVE", "POSITIVE", "NEGATIVE", "POSITIVE"]
    );
    assert_eq!(progress, [2, 4, 5]);
    assert_eq!(*batches.lock().unwrap(), [2, 2, 1]);
    Ok(())
}

#[test]
fn empty_batch_skips_the_model() -> anyhow::Result<()> {
    let model = KeywordModel::new_local();
    let batches = model.batches.clone();
    let pipeline = SentimentAnalysisPipeline::from_model(model, 4);

    assert!(pipeline.predict_batch(&[])?.is_empty());
    assert!(batches.lock().unwrap().is_empty());
    Ok(())
}

#[test]
fn zero_batch_size_is_clamped() {
    let pipeline = SentimentAnalysisPipeline::from_model(KeywordModel::new_local(), 0);
    assert_eq!(pipeline.batch_size(), 1);
}

#[tokio::test]
async fn pipelines_share_cached_model() -> anyhow::Result<()> {
    let options = ModelChoice::Roberta;
    let before = LOADS.load(Ordering::SeqCst);

    let first = SentimentAnalysisPipelineBuilder::<KeywordModel>::new(options)
        .cpu()
        .build()
        .await?;
    let second = SentimentAnalysisPipelineBuilder::<KeywordModel>::new(options)
        .cpu()
        .batch_size(3)
        .build()
        .await?;

    assert_eq!(LOADS.load(Ordering::SeqCst) - before, 1);
    assert!(global_cache().len().await >= 1);
    assert_eq!(first.batch_size(), 8);
    assert_eq!(second.batch_size(), 3);

    first.predict("great")?;
    // Both pipelines hold clones of the one cached model.
    assert_eq!(second.model().batches.lock().unwrap().len(), 1);
    Ok(())
}
