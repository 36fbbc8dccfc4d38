use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while validating review inputs before any model is loaded.
///
/// These are user-facing: the CLI prints them verbatim and the demo server
/// turns them into `400 Bad Request` responses.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("input file '{}' does not exist", .0.display())]
    InputNotFound(PathBuf),

    #[error("output directory '{}' does not exist", .0.display())]
    OutputDirNotFound(PathBuf),

    #[error("model '{0}' not supported, choose 'distilbert' or 'roberta'")]
    UnsupportedModel(String),

    #[error("unknown text encoding '{0}'")]
    UnknownEncoding(String),

    #[error("CSV must contain a '{0}' column.")]
    MissingColumn(String),

    /// Row numbers are 1-based data rows (the header is not counted).
    #[error("Some reviews are missing (NaN) in rows {}.", format_rows(.0))]
    MissingReviews(Vec<usize>),

    #[error("The 'review' column must contain valid, non-empty text (rows {}).", format_rows(.0))]
    BlankReviews(Vec<usize>),

    #[error("Rows have more fields than the header (rows {}).", format_rows(.0))]
    ExtraFields(Vec<usize>),

    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),
}

fn format_rows(rows: &[usize]) -> String {
    const SHOWN: usize = 10;
    let mut out = rows
        .iter()
        .take(SHOWN)
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    if rows.len() > SHOWN {
        out.push_str(&format!(" and {} more", rows.len() - SHOWN));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_reviews_lists_rows() {
        let err = ReviewError::MissingReviews(vec![2, 5]);
        assert_eq!(err.to_string(), "Some reviews are missing (NaN) in rows 2, 5.");
    }

    #[test]
    fn extra_fields_lists_rows() {
        let err = ReviewError::ExtraFields(vec![3]);
        assert_eq!(err.to_string(), "Rows have more fields than the header (rows 3).");
    }

    #[test]
    fn long_row_lists_are_shortened() {
        let err = ReviewError::BlankReviews((1..=13).collect());
        assert!(err.to_string().ends_with("(rows 1, 2, 3, 4, 5, 6, 7, 8, 9, 10 and 3 more)."));
    }
}
