// ============================================================
// DATASET & SUMMARY
// ============================================================
// A dataset names one import batch; the summary is derived from
// its records on demand and never stored as authoritative state.

use serde::{Deserialize, Serialize};

use super::scan::ScanType;

/// A named, identified collection of labeled records from one import batch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub dataset_id: String,
    pub name: String,
    pub scan_type: ScanType,
    pub description: Option<String>,
    pub created_at: Option<String>,
}

/// Aggregate statistics over a sequence of labeled records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub total_records: usize,
    pub phishing_count: usize,
    pub legitimate_count: usize,
    /// phishing / total * 100; 0 when the batch is empty
    pub phishing_percentage: f64,
    pub average_length: f64,
    pub min_length: usize,
    pub max_length: usize,
}

impl DatasetSummary {
    /// Summary of an empty batch
    pub fn empty() -> Self {
        Self {
            total_records: 0,
            phishing_count: 0,
            legitimate_count: 0,
            phishing_percentage: 0.0,
            average_length: 0.0,
            min_length: 0,
            max_length: 0,
        }
    }
}

impl Default for DatasetSummary {
    fn default() -> Self {
        Self::empty()
    }
}
