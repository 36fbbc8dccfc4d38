use crate::core::error::ReviewError;
use crate::pipelines::utils::DeviceRequest;
use encoding_rs::Encoding;

/// Delimiter used by the review dataset this tool was written for.
pub const DEFAULT_DELIMITER: u8 = b';';
/// The dataset is exported from a Windows spreadsheet, so cp1252 is the default.
pub const DEFAULT_ENCODING: &str = "windows-1252";
/// Name of the column holding the review text.
pub const REVIEW_COLUMN: &str = "review";

/// How review CSV files are laid out on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvFormat {
    pub delimiter: u8,
    /// A WHATWG encoding label such as `windows-1252` or `utf-8`.
    pub encoding: String,
}

impl Default for CsvFormat {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            encoding: DEFAULT_ENCODING.to_string(),
        }
    }
}

impl CsvFormat {
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_encoding(mut self, label: impl Into<String>) -> Self {
        self.encoding = label.into();
        self
    }

    /// Resolve the configured label into an `encoding_rs` encoding.
    pub fn resolve_encoding(&self) -> Result<&'static Encoding, ReviewError> {
        Encoding::for_label(self.encoding.trim().as_bytes())
            .ok_or_else(|| ReviewError::UnknownEncoding(self.encoding.clone()))
    }
}

/// Settings for running inference over many reviews.
#[derive(Clone, Default)]
pub struct InferenceConfig {
    pub batch_size: Option<usize>,
    pub device: DeviceRequest,
}
