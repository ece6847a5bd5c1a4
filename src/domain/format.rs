// ============================================================
// DATASET FORMAT
// ============================================================
// Which column mapping applies to a batch of rows. Detected once
// per input from the header; every row in the batch is read under
// the same mapping. Rows that do not fit are dropped, never patched.

use serde::{Deserialize, Serialize};

/// Known input shapes, detected from the header row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DatasetFormat {
    /// Label in field 0, content joined from the remaining fields
    LabelFirst,
    /// Label in field 0, content in field 1
    TextFirst,
    /// Pipe-delimited content|label with the label as a trailing short token
    UrlStatusPipe,
    /// Content and label columns located by ranked header aliases
    HeaderMapped,
    /// No known shape matched; the caller drops the input (fail closed)
    Unknown,
}

impl DatasetFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetFormat::LabelFirst => "label-first",
            DatasetFormat::TextFirst => "text-first",
            DatasetFormat::UrlStatusPipe => "url-status-pipe",
            DatasetFormat::HeaderMapped => "header-mapped",
            DatasetFormat::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for DatasetFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Concrete column indices resolved for a detected format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    /// Index of the content column
    pub content_idx: usize,
    /// Index of the label column
    pub label_idx: usize,
    /// Join every field from `content_idx` onward into the content
    /// (label-first shape, where unquoted delimiters split the text)
    pub join_remaining: bool,
    /// Read the label from the row's final field regardless of row width
    pub label_from_end: bool,
}

impl ColumnMap {
    pub fn new(content_idx: usize, label_idx: usize) -> Self {
        Self {
            content_idx,
            label_idx,
            join_remaining: false,
            label_from_end: false,
        }
    }

    /// Pull (content, label) out of a row under this mapping.
    /// None when the row is too narrow to fit the mapping; such rows are
    /// dropped by the caller.
    pub fn extract(&self, row: &[String], delimiter: u8) -> Option<(String, String)> {
        let label = if self.label_from_end {
            row.last()?.clone()
        } else {
            row.get(self.label_idx)?.clone()
        };

        let content = if self.join_remaining {
            if row.len() <= self.content_idx {
                return None;
            }
            // Re-join with the delimiter that split the text column
            row[self.content_idx..].join(&(delimiter as char).to_string())
        } else {
            row.get(self.content_idx)?.clone()
        };

        Some((content, label))
    }
}

/// Detection outcome: the format tag plus columns when the format is known
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatDetection {
    pub format: DatasetFormat,
    pub columns: Option<ColumnMap>,
}

impl FormatDetection {
    pub fn unknown() -> Self {
        Self {
            format: DatasetFormat::Unknown,
            columns: None,
        }
    }

    pub fn is_known(&self) -> bool {
        self.format != DatasetFormat::Unknown
    }
}
