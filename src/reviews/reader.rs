use super::ReviewTable;
use crate::core::{CsvFormat, ReviewError};
use anyhow::Context;
use csv::ReaderBuilder;
use std::path::Path;

/// Read a review file from disk.
pub fn read_reviews(path: &Path, format: &CsvFormat) -> anyhow::Result<ReviewTable> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read '{}'", path.display()))?;
    let table = parse_reviews(&bytes, format)?;
    tracing::info!(path = %path.display(), rows = table.len(), columns = table.headers().len(), "loaded reviews");
    Ok(table)
}

/// Decode and parse raw CSV bytes.
///
/// The configured encoding is used unless the data starts with a byte-order
/// mark. Undecodable bytes become U+FFFD rather than failing the whole file.
pub fn parse_reviews(bytes: &[u8], format: &CsvFormat) -> Result<ReviewTable, ReviewError> {
    let encoding = format.resolve_encoding()?;
    let (content, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::warn!(encoding = used.name(), "input contained bytes invalid for its encoding");
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(format.delimiter)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let rows = reader
        .records()
        .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
        .collect::<Result<Vec<Vec<String>>, _>>()?;

    // Short rows read as missing trailing values; long ones have nowhere to go.
    let overlong: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| row.len() > headers.len())
        .map(|(i, _)| i + 1)
        .collect();
    if !overlong.is_empty() {
        return Err(ReviewError::ExtraFields(overlong));
    }

    Ok(ReviewTable::new(headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_semicolon_separated_cp1252() {
        // 0x92 is a right single quotation mark in Windows-1252.
        let bytes = b"id;review;rating\n1;It\x92s great;5\n2;\"Slow; but fine\";3\n";
        let table = parse_reviews(bytes, &CsvFormat::default()).unwrap();

        assert_eq!(table.headers(), &["id", "review", "rating"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.reviews().unwrap(), vec!["It\u{2019}s great", "Slow; but fine"]);
    }

    #[test]
    fn byte_order_mark_overrides_configured_encoding() {
        let bytes = "\u{feff}review\nCafé au lait\n".as_bytes();
        let table = parse_reviews(bytes, &CsvFormat::default()).unwrap();

        assert_eq!(table.headers(), &["review"]);
        assert_eq!(table.reviews().unwrap(), vec!["Café au lait"]);
    }

    #[test]
    fn custom_delimiter_and_encoding() {
        let format = CsvFormat::default().with_delimiter(b',').with_encoding("utf-8");
        let table = parse_reviews("review,score\nÜberragend,9\n".as_bytes(), &format).unwrap();
        assert_eq!(table.reviews().unwrap(), vec!["Überragend"]);
    }

    #[test]
    fn ragged_rows_are_accepted() {
        let table = parse_reviews(b"review;extra\nonly review\n", &CsvFormat::default()).unwrap();
        assert_eq!(table.rows()[0], vec!["only review".to_string()]);
    }

    #[test]
    fn rows_wider_than_header_are_rejected() {
        let err = parse_reviews(b"id;review\n1;good\n2;good;EXTRA\n", &CsvFormat::default())
            .unwrap_err();
        assert!(matches!(err, ReviewError::ExtraFields(rows) if rows == vec![2]));
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reviews.csv");
        std::fs::write(&path, b"review\nLoved it\n").unwrap();

        let table = read_reviews(&path, &CsvFormat::default()).unwrap();
        assert_eq!(table.len(), 1);
    }
}
