// ============================================================
// DATASET CSV EXPORT
// ============================================================
// Writes records back out in the label,text layout the training
// scripts consume

use csv::WriterBuilder;

use crate::domain::error::{AppError, Result};
use crate::domain::record::LabeledRecord;

/// Serialize records as `label,text` CSV with a header row.
/// Fields containing delimiters or quotes are quoted by the writer.
pub fn export_records_csv(records: &[LabeledRecord]) -> Result<String> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());

    writer
        .write_record(["label", "text"])
        .map_err(|e| AppError::Internal(format!("Failed to write CSV header: {}", e)))?;

    for record in records {
        let label = if record.is_phishing {
            "phishing"
        } else {
            "legitimate"
        };
        writer
            .write_record([label, record.content.as_str()])
            .map_err(|e| AppError::Internal(format!("Failed to write CSV row: {}", e)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("Failed to flush CSV writer: {}", e)))?;

    String::from_utf8(bytes)
        .map_err(|e| AppError::Internal(format!("CSV output was not valid UTF-8: {}", e)))
}
