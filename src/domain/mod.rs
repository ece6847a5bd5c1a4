// ============================================================
// DOMAIN LAYER
// ============================================================
// Core types and value objects for the ingestion pipeline
// No I/O, no async; pure data shared by every layer above

pub mod dataset;
pub mod error;
pub mod format;
pub mod indicators;
pub mod record;
pub mod scan;

pub use dataset::{Dataset, DatasetSummary};
pub use format::{ColumnMap, DatasetFormat, FormatDetection};
pub use record::{LabeledRecord, RawRow};
pub use scan::{ScanType, ThreatLevel, ThreatScale};
