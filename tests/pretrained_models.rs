// These download weights from the Hugging Face Hub.

use review_sentiment::{ModelChoice, SentimentAnalysisPipelineBuilder};

#[tokio::test]
#[ignore = "downloads model weights"]
async fn distilbert_scores_reviews() -> anyhow::Result<()> {
    let pipeline = SentimentAnalysisPipelineBuilder::distilbert()
        .cpu()
        .build()
        .await?;
    let results = pipeline.predict_batch(&[
        "An absolute delight from start to finish.",
        "Dull, predictable and far too long.",
    ])?;
    assert_eq!(results[0].label, "POSITIVE");
    assert_eq!(results[1].label, "NEGATIVE");
    assert!(results.iter().all(|r| r.score > 0.5 && r.score <= 1.0));
    Ok(())
}

#[tokio::test]
#[ignore = "downloads model weights"]
async fn roberta_scores_reviews() -> anyhow::Result<()> {
    let pipeline = SentimentAnalysisPipelineBuilder::roberta()
        .cpu()
        .build()
        .await?;
    assert_eq!(pipeline.model().choice(), ModelChoice::Roberta);
    let res = pipeline.predict("I love this movie!")?;
    assert_eq!(res.label, "POSITIVE");
    Ok(())
}
