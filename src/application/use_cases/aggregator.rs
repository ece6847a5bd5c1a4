// ============================================================
// BATCH AGGREGATOR
// ============================================================
// Splits prepared records into insert-sized chunks and derives
// the dataset summary in a single pass

use crate::domain::dataset::DatasetSummary;
use crate::domain::record::LabeledRecord;

/// Records per insert transaction when the caller supplies no size
pub const DEFAULT_CHUNK_SIZE: usize = 100;

pub struct BatchAggregator {
    chunk_size: usize,
}

impl Default for BatchAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl BatchAggregator {
    pub fn new(chunk_size: usize) -> Self {
        // chunks() panics on zero
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Fixed-size chunks in input order; the final chunk may be smaller
    pub fn chunk<'a>(&self, records: &'a [LabeledRecord]) -> Vec<&'a [LabeledRecord]> {
        records.chunks(self.chunk_size).collect()
    }

    /// Summary statistics over a batch. Lengths are counted in characters,
    /// the same unit the normalizer truncates in.
    pub fn summarize(records: &[LabeledRecord]) -> DatasetSummary {
        if records.is_empty() {
            return DatasetSummary::empty();
        }

        let mut phishing_count = 0usize;
        let mut total_chars = 0usize;
        let mut min_length = usize::MAX;
        let mut max_length = 0usize;

        for record in records {
            if record.is_phishing {
                phishing_count += 1;
            }
            let length = record.content_length();
            total_chars += length;
            min_length = min_length.min(length);
            max_length = max_length.max(length);
        }

        let total = records.len();
        DatasetSummary {
            total_records: total,
            phishing_count,
            legitimate_count: total - phishing_count,
            phishing_percentage: (phishing_count as f64 / total as f64) * 100.0,
            average_length: total_chars as f64 / total as f64,
            min_length,
            max_length,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::scan::{ScanType, ThreatLevel};

    fn record(id: usize, content: &str, is_phishing: bool) -> LabeledRecord {
        LabeledRecord {
            id: format!("rec-{}", id),
            dataset_id: "ds-1".to_string(),
            content: content.to_string(),
            scan_type: ScanType::Sms,
            is_phishing,
            threat_level: if is_phishing {
                ThreatLevel::Medium
            } else {
                ThreatLevel::None
            },
            indicators: if is_phishing {
                vec!["urgency_tone".to_string()]
            } else {
                Vec::new()
            },
            created_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_summary_counts_and_lengths() {
        let records = vec![
            record(1, "WINNER click now", true),
            record(2, "see you at 5", false),
            record(3, "urgent verify account", true),
            record(4, "ok", false),
        ];

        let summary = BatchAggregator::summarize(&records);

        assert_eq!(summary.total_records, 4);
        assert_eq!(summary.phishing_count, 2);
        assert_eq!(summary.legitimate_count, 2);
        assert!((summary.phishing_percentage - 50.0).abs() < f64::EPSILON);
        assert_eq!(summary.min_length, 2);
        assert_eq!(summary.max_length, 21);
        let expected_avg = (16 + 12 + 21 + 2) as f64 / 4.0;
        assert!((summary.average_length - expected_avg).abs() < 1e-9);
    }

    #[test]
    fn test_empty_batch_summary_is_zeroed() {
        let summary = BatchAggregator::summarize(&[]);

        assert_eq!(summary.total_records, 0);
        assert_eq!(summary.phishing_percentage, 0.0);
        assert_eq!(summary.min_length, 0);
        assert_eq!(summary.max_length, 0);
    }

    #[test]
    fn test_summary_counts_characters_not_bytes() {
        let records = vec![record(1, "héllo", false)];
        let summary = BatchAggregator::summarize(&records);

        assert_eq!(summary.min_length, 5);
        assert_eq!(summary.max_length, 5);
    }

    #[test]
    fn test_chunks_cover_all_records_in_order() {
        let records: Vec<LabeledRecord> = (0..250)
            .map(|i| record(i, "some message content", i % 2 == 0))
            .collect();

        let aggregator = BatchAggregator::new(100);
        let chunks = aggregator.chunk(&records);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 100);
        assert_eq!(chunks[1].len(), 100);
        assert_eq!(chunks[2].len(), 50);

        let flattened: Vec<&str> = chunks
            .iter()
            .flat_map(|chunk| chunk.iter().map(|r| r.id.as_str()))
            .collect();
        let original: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(flattened, original);
    }

    #[test]
    fn test_empty_batch_produces_no_chunks() {
        let aggregator = BatchAggregator::default();
        assert!(aggregator.chunk(&[]).is_empty());
    }

    #[test]
    fn test_zero_chunk_size_is_clamped() {
        let aggregator = BatchAggregator::new(0);
        assert_eq!(aggregator.chunk_size(), 1);
    }
}
