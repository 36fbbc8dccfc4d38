use super::ReviewTable;
use crate::core::ReviewError;
use crate::models::ModelChoice;
use crate::pipelines::sentiment_analysis::SentimentResult;
use anyhow::Context;
use csv::WriterBuilder;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const OUTPUT_HEADERS: [&str; 3] = ["review", "sentiment label", "sentiment score"];

/// Write reviews alongside their predictions as comma-separated UTF-8.
pub fn write_scored<W: Write>(
    writer: W,
    reviews: &[&str],
    results: &[SentimentResult],
) -> Result<(), ReviewError> {
    debug_assert_eq!(reviews.len(), results.len());

    let mut csv = WriterBuilder::new().from_writer(writer);
    csv.write_record(OUTPUT_HEADERS)?;
    for (review, result) in reviews.iter().zip(results) {
        let score = result.score.to_string();
        csv.write_record([*review, result.label.as_str(), score.as_str()])?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn write_scored_file(
    path: &Path,
    reviews: &[&str],
    results: &[SentimentResult],
) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create '{}'", path.display()))?;
    write_scored(std::io::BufWriter::new(file), reviews, results)?;
    Ok(())
}

/// Write `table` with an extra trailing column.
pub fn write_table<W: Write>(
    writer: W,
    table: &ReviewTable,
    extra_header: &str,
    extra_values: &[String],
) -> Result<(), ReviewError> {
    let mut csv = WriterBuilder::new().flexible(true).from_writer(writer);

    let mut header: Vec<&str> = table.headers().iter().map(String::as_str).collect();
    header.push(extra_header);
    csv.write_record(&header)?;

    let width = table.headers().len();
    for (row, extra) in table.rows().iter().zip(extra_values) {
        let mut record: Vec<&str> = (0..width)
            .map(|i| row.get(i).map_or("", String::as_str))
            .collect();
        record.push(extra);
        csv.write_record(&record)?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

fn input_stem(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "reviews".to_string())
}

/// `<output_dir>/<model>_<input stem>_sentiment_scores.csv`
pub fn batch_output_path(output_dir: &Path, model: ModelChoice, input: &Path) -> PathBuf {
    output_dir.join(format!(
        "{}_{}_sentiment_scores.csv",
        model.cli_name(),
        input_stem(input)
    ))
}

/// `<output_dir>/<input stem>_word_counts.csv`
pub fn word_counts_output_path(output_dir: &Path, input: &Path) -> PathBuf {
    output_dir.join(format!("{}_word_counts.csv", input_stem(input)))
}

/// File name offered by the demo UI for download.
pub fn demo_download_name(model: ModelChoice) -> String {
    format!("sentiment_results_{}.csv", model.display_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(label: &str, score: f32) -> SentimentResult {
        SentimentResult {
            label: label.into(),
            score,
        }
    }

    #[test]
    fn writes_header_and_rows() {
        let mut out = Vec::new();
        write_scored(
            &mut out,
            &["Loved it", "Meh, \"fine\""],
            &[result("POSITIVE", 0.5), result("NEGATIVE", 0.25)],
        )
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "review,sentiment label,sentiment score\n\
             Loved it,POSITIVE,0.5\n\
             \"Meh, \"\"fine\"\"\",NEGATIVE,0.25\n"
        );
    }

    #[test]
    fn table_gets_extra_column() {
        let table = ReviewTable::new(
            vec!["id".into(), "review".into()],
            vec![vec!["1".into(), "Good fun".into()], vec!["2".into()]],
        );
        let mut out = Vec::new();
        write_table(&mut out, &table, "word count", &["2".into(), "0".into()]).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "id,review,word count\n1,Good fun,2\n2,,0\n"
        );
    }

    #[test]
    fn output_names() {
        let path = batch_output_path(
            Path::new("out"),
            ModelChoice::Roberta,
            Path::new("data/movie_reviews.csv"),
        );
        assert_eq!(path, Path::new("out/roberta_movie_reviews_sentiment_scores.csv"));
        assert_eq!(
            demo_download_name(ModelChoice::DistilBert),
            "sentiment_results_DistilBERT.csv"
        );
    }
}
