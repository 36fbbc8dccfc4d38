//! Review CSV files: reading, validation and writing results.

pub mod reader;
pub mod writer;

pub use reader::{parse_reviews, read_reviews};
pub use writer::{
    batch_output_path, demo_download_name, word_counts_output_path, write_scored,
    write_scored_file, write_table, OUTPUT_HEADERS,
};

use crate::core::config::REVIEW_COLUMN;
use crate::core::ReviewError;

/// Values pandas' `read_csv` treats as missing by default.
const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Whether a raw CSV field counts as a missing value.
pub fn is_missing(value: &str) -> bool {
    NA_VALUES.contains(&value)
}

/// A delimited file held as strings: one header row and any number of data rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ReviewTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Values of column `index`; missing values (short rows or NA markers) are `None`.
    pub fn column_values(&self, index: usize) -> Vec<Option<&str>> {
        self.rows
            .iter()
            .map(|row| row.get(index).map(String::as_str).filter(|v| !is_missing(v)))
            .collect()
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Result<Vec<Option<&str>>, ReviewError> {
        let index = self
            .column_index(name)
            .ok_or_else(|| ReviewError::MissingColumn(name.to_string()))?;
        Ok(self.column_values(index))
    }

    /// The `review` column, checked for classification.
    ///
    /// Fails when the column is absent, when any review is missing, or when
    /// any review is blank, in that order. Row numbers in errors are 1-based.
    pub fn reviews(&self) -> Result<Vec<&str>, ReviewError> {
        let values = self.column(REVIEW_COLUMN)?;

        let missing: Vec<usize> = values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_none())
            .map(|(i, _)| i + 1)
            .collect();
        if !missing.is_empty() {
            return Err(ReviewError::MissingReviews(missing));
        }

        let reviews: Vec<&str> = values.into_iter().flatten().collect();
        let blank: Vec<usize> = reviews
            .iter()
            .enumerate()
            .filter(|(_, r)| r.trim().is_empty())
            .map(|(i, _)| i + 1)
            .collect();
        if !blank.is_empty() {
            return Err(ReviewError::BlankReviews(blank));
        }

        Ok(reviews)
    }
}
