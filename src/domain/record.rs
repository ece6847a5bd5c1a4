// ============================================================
// LABELED RECORD
// ============================================================
// Canonical unit produced by the ingestion pipeline.
// Immutable after creation; the pipeline never mutates records.

use serde::{Deserialize, Serialize};

use super::scan::{ScanType, ThreatLevel};

/// One delimited-text line after quote-aware splitting.
/// Ephemeral; produced and consumed within a single parse pass.
pub type RawRow = Vec<String>;

/// Canonical labeled record shared by every scan pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabeledRecord {
    pub id: String,
    pub dataset_id: String,
    pub content: String,
    pub scan_type: ScanType,
    pub is_phishing: bool,
    pub threat_level: ThreatLevel,
    pub indicators: Vec<String>,
    pub created_at: String,
}

impl LabeledRecord {
    /// Content length in characters; truncation and summaries count the same way
    pub fn content_length(&self) -> usize {
        self.content.chars().count()
    }

    /// Label, threat level and indicators must stay in agreement:
    /// legitimate records carry a safe level and no indicators,
    /// phishing records carry an unsafe level and at least one indicator.
    pub fn label_coupling_holds(&self) -> bool {
        if self.is_phishing {
            !self.threat_level.is_safe() && !self.indicators.is_empty()
        } else {
            self.threat_level.is_safe() && self.indicators.is_empty()
        }
    }
}
