//! Exploratory statistics over review tables.
//!
//! Word counts are whitespace token counts. Summaries mirror what a
//! dataframe `describe()` / `groupby().agg()` pass would show: sample standard
//! deviation, linearly interpolated quartiles, and group keys that skip
//! missing values.

use crate::core::config::REVIEW_COLUMN;
use crate::core::ReviewError;
use crate::pipelines::sentiment_analysis::SentimentResult;
use crate::reviews::{word_counts_output_path, write_table, ReviewTable};
use anyhow::Context;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

pub const WORD_COUNT_COLUMN: &str = "word count";

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Word count of every review; missing reviews count as zero words.
pub fn word_counts(table: &ReviewTable) -> Result<Vec<usize>, ReviewError> {
    Ok(table
        .column(REVIEW_COLUMN)?
        .into_iter()
        .map(|review| review.map_or(0, word_count))
        .collect())
}

/// Write `table` with a trailing word count column to
/// `<output_dir>/<input stem>_word_counts.csv`, returning the path.
pub fn export_word_counts(
    table: &ReviewTable,
    input: &Path,
    output_dir: &Path,
) -> anyhow::Result<PathBuf> {
    if !output_dir.is_dir() {
        return Err(ReviewError::OutputDirNotFound(output_dir.to_path_buf()).into());
    }
    let path = word_counts_output_path(output_dir, input);
    let counts: Vec<String> = word_counts(table)?
        .iter()
        .map(|c| c.to_string())
        .collect();

    let file = std::fs::File::create(&path)
        .with_context(|| format!("failed to create '{}'", path.display()))?;
    write_table(std::io::BufWriter::new(file), table, WORD_COUNT_COLUMN, &counts)?;

    tracing::info!(path = %path.display(), rows = table.len(), "word counts exported");
    Ok(path)
}

/// Summary statistics of a numeric series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Describe {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl Describe {
    pub fn of(values: &[f64]) -> Self {
        let count = values.len();
        if count == 0 {
            return Self {
                count,
                mean: None,
                std: None,
                min: None,
                q25: None,
                median: None,
                q75: None,
                max: None,
            };
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let mean = sorted.iter().sum::<f64>() / count as f64;
        let std = (count > 1).then(|| {
            let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (count - 1) as f64).sqrt()
        });

        Self {
            count,
            mean: Some(mean),
            std,
            min: sorted.first().copied(),
            q25: Some(quantile(&sorted, 0.25)),
            median: Some(quantile(&sorted, 0.5)),
            q75: Some(quantile(&sorted, 0.75)),
            max: sorted.last().copied(),
        }
    }
}

/// Linear-interpolation quantile of a non-empty sorted slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Aggregates of one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub key: String,
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Group `values` by `keys` (paired by position), in first-seen key order.
/// Rows whose key is missing are left out.
pub fn group_aggregates<'a, I>(keys: I, values: &[f64]) -> Vec<GroupSummary>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut order: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(GroupSummary, f64)> = Vec::new();

    for (key, &value) in keys.into_iter().zip(values) {
        let Some(key) = key else { continue };
        match order.get(key) {
            Some(&index) => {
                let (summary, sum) = &mut groups[index];
                summary.count += 1;
                summary.min = summary.min.min(value);
                summary.max = summary.max.max(value);
                *sum += value;
            }
            None => {
                order.insert(key, groups.len());
                groups.push((
                    GroupSummary {
                        key: key.to_string(),
                        count: 1,
                        mean: value,
                        min: value,
                        max: value,
                    },
                    value,
                ));
            }
        }
    }

    groups
        .into_iter()
        .map(|(mut summary, sum)| {
            summary.mean = sum / summary.count as f64;
            summary
        })
        .collect()
}

/// Count and mean confidence per predicted label.
pub fn label_distribution(results: &[SentimentResult]) -> Vec<GroupSummary> {
    let scores: Vec<f64> = results.iter().map(|r| r.score as f64).collect();
    group_aggregates(results.iter().map(|r| Some(r.label.as_str())), &scores)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewLength {
    /// 1-based data row.
    pub row: usize,
    pub words: usize,
    pub text: String,
}

/// Overview of a review table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdaReport {
    pub rows: usize,
    pub columns: Vec<String>,
    pub missing_reviews: usize,
    pub word_counts: Describe,
    pub shortest: Option<ReviewLength>,
    pub longest: Option<ReviewLength>,
    pub group_by: Option<String>,
    pub groups: Vec<GroupSummary>,
}

impl EdaReport {
    /// Build the report; `group_by` names a column whose values group the word counts.
    pub fn build(table: &ReviewTable, group_by: Option<&str>) -> Result<Self, ReviewError> {
        let reviews = table.column(REVIEW_COLUMN)?;
        let counts = word_counts(table)?;
        let values: Vec<f64> = counts.iter().map(|&c| c as f64).collect();

        let present = || {
            reviews
                .iter()
                .zip(&counts)
                .enumerate()
                .filter_map(|(i, (review, &words))| review.map(|text| (i + 1, words, text)))
        };
        let to_length = |(row, words, text): (usize, usize, &str)| ReviewLength {
            row,
            words,
            text: text.to_string(),
        };
        // Ties go to the earliest row.
        let shortest = present().min_by_key(|&(row, words, _)| (words, row)).map(to_length);
        let longest = present()
            .max_by_key(|&(row, words, _)| (words, std::cmp::Reverse(row)))
            .map(to_length);

        let groups = match group_by {
            Some(column) => group_aggregates(table.column(column)?, &values),
            None => Vec::new(),
        };

        Ok(Self {
            rows: table.len(),
            columns: table.headers().to_vec(),
            missing_reviews: reviews.iter().filter(|r| r.is_none()).count(),
            word_counts: Describe::of(&values),
            shortest,
            longest,
            group_by: group_by.map(str::to_string),
            groups,
        })
    }
}

fn fmt_stat(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

fn preview(text: &str) -> String {
    const MAX_CHARS: usize = 60;
    if text.chars().count() <= MAX_CHARS {
        text.to_string()
    } else {
        let cut: String = text.chars().take(MAX_CHARS).collect();
        format!("{cut}...")
    }
}

impl fmt::Display for EdaReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "rows: {}", self.rows)?;
        writeln!(f, "columns: {}", self.columns.join(", "))?;
        writeln!(f, "missing reviews: {}", self.missing_reviews)?;
        writeln!(f)?;

        let d = &self.word_counts;
        writeln!(f, "word count")?;
        writeln!(f, "  count  {}", d.count)?;
        for (name, value) in [
            ("mean", d.mean),
            ("std", d.std),
            ("min", d.min),
            ("25%", d.q25),
            ("50%", d.median),
            ("75%", d.q75),
            ("max", d.max),
        ] {
            writeln!(f, "  {name:<5}  {}", fmt_stat(value))?;
        }

        if let Some(s) = &self.shortest {
            writeln!(f, "\nshortest review (row {}, {} words): {}", s.row, s.words, preview(&s.text))?;
        }
        if let Some(l) = &self.longest {
            writeln!(f, "longest review (row {}, {} words): {}", l.row, l.words, preview(&l.text))?;
        }

        if let Some(column) = &self.group_by {
            writeln!(f, "\nword count by '{column}'")?;
            write!(f, "{}", GroupTable(&self.groups))?;
        }
        Ok(())
    }
}

/// Renders group summaries as an aligned text table.
pub struct GroupTable<'a>(pub &'a [GroupSummary]);

impl fmt::Display for GroupTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .0
            .iter()
            .map(|g| g.key.chars().count())
            .max()
            .unwrap_or(0)
            .max(5);
        writeln!(f, "  {:<width$}  {:>6}  {:>8}  {:>8}  {:>8}", "group", "count", "mean", "min", "max")?;
        for g in self.0 {
            writeln!(
                f,
                "  {:<width$}  {:>6}  {:>8.2}  {:>8.2}  {:>8.2}",
                g.key, g.count, g.mean, g.min, g.max
            )?;
        }
        Ok(())
    }
}
