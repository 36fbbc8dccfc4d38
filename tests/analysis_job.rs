mod common;

use common::KeywordModel;
use review_sentiment::analysis::{analyze_with, classify_table, prepare, AnalysisRequest};
use review_sentiment::eda::{export_word_counts, EdaReport};
use review_sentiment::reviews::{parse_reviews, read_reviews};
use review_sentiment::{CsvFormat, ModelChoice, ReviewError, SentimentAnalysisPipeline};

fn write_input(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("movies.csv");
    // 0x92 is a right single quote in Windows-1252.
    let mut bytes = b"id;review;genre\n".to_vec();
    bytes.extend_from_slice(b"1;Great acting, I loved it;drama\n");
    bytes.extend_from_slice(b"2;It wasn\x92t worth the ticket;comedy\n");
    bytes.extend_from_slice(b"3;\"Good; not great\";drama\n");
    std::fs::write(&path, bytes).unwrap();
    path
}

#[tokio::test]
async fn analyze_writes_scores_in_input_order() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = write_input(dir.path());

    let mut request = AnalysisRequest::new(&input, ModelChoice::DistilBert);
    request.show_progress = false;
    let prepared = prepare(&request)?;

    let model = KeywordModel::new_local();
    let batches = model.batches.clone();
    let pipeline = SentimentAnalysisPipeline::from_model(model, 2);
    let summary = analyze_with(pipeline, prepared, false).await?;

    assert_eq!(
        summary.output_path,
        dir.path().join("distilbert_movies_sentiment_scores.csv")
    );
    assert_eq!(summary.reviews, 3);
    assert_eq!(*batches.lock().unwrap(), [2, 1]);

    let written = std::fs::read_to_string(&summary.output_path)?;
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines[0], "review,sentiment label,sentiment score");
    assert!(lines[1].starts_with("\"Great acting, I loved it\",POSITIVE,"));
    assert!(lines[2].starts_with("It wasn\u{2019}t worth the ticket,NEGATIVE,"));
    assert!(lines[3].starts_with("Good; not great,POSITIVE,"));
    assert_eq!(lines.len(), 4);

    let positive = summary
        .labels
        .iter()
        .find(|g| g.key == "POSITIVE")
        .map(|g| g.count);
    assert_eq!(positive, Some(2));
    Ok(())
}

#[test]
fn missing_reviews_block_classification() {
    let table = parse_reviews(b"review\nGood\n\nNaN\n", &CsvFormat::default()).unwrap();
    let pipeline = SentimentAnalysisPipeline::from_model(KeywordModel::new_local(), 8);

    let err = classify_table(&pipeline, &table, |_| {}).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ReviewError>(),
        Some(ReviewError::MissingReviews(rows)) if rows == &vec![2]
    ));
}

#[test]
fn eda_export_adds_word_counts() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = write_input(dir.path());
    let table = read_reviews(&input, &CsvFormat::default())?;

    let report = EdaReport::build(&table, Some("genre"))?;
    let rendered = report.to_string();
    assert!(rendered.contains("rows: 3"));
    assert!(rendered.contains("drama"));

    let path = export_word_counts(&table, &input, dir.path())?;
    assert_eq!(path, dir.path().join("movies_word_counts.csv"));

    let written = std::fs::read_to_string(&path)?;
    let mut lines = written.lines();
    assert_eq!(lines.next(), Some("id,review,genre,word count"));
    assert_eq!(lines.next(), Some("1,\"Great acting, I loved it\",drama,5"));
    assert_eq!(lines.next(), Some("2,It wasn\u{2019}t worth the ticket,comedy,5"));
    Ok(())
}

#[test]
fn eda_export_needs_existing_directory() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = write_input(dir.path());
    let table = read_reviews(&input, &CsvFormat::default())?;

    let err = export_word_counts(&table, &input, &dir.path().join("missing")).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ReviewError>(),
        Some(ReviewError::OutputDirNotFound(_))
    ));
    Ok(())
}
