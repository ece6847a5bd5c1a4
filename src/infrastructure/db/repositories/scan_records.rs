use std::sync::Arc;

use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;

use crate::application::use_cases::ingestion::RecordSink;
use crate::domain::dataset::{Dataset, DatasetSummary};
use crate::domain::error::{AppError, Result};
use crate::domain::record::LabeledRecord;
use crate::domain::scan::{ScanType, ThreatLevel};
use crate::infrastructure::db::ScanDb;

use super::datasets::DatasetRepository;

pub struct ScanRecordRepository {
    pool: SqlitePool,
}

impl ScanRecordRepository {
    pub fn new(db: &ScanDb) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    /// Inserts a batch of records atomically
    pub async fn insert_chunk(&self, records: &[LabeledRecord]) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to begin transaction: {e}")))?;

        let mut affected = 0u64;
        for record in records {
            let indicators = serde_json::to_string(&record.indicators)
                .map_err(|e| AppError::Internal(format!("Failed to encode indicators: {e}")))?;

            let res = sqlx::query(
                "INSERT INTO scan_records (id, dataset_id, content, scan_type, is_phishing, threat_level, indicators, created_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&record.id)
            .bind(&record.dataset_id)
            .bind(&record.content)
            .bind(record.scan_type.as_str())
            .bind(record.is_phishing as i64)
            .bind(record.threat_level.as_str())
            .bind(&indicators)
            .bind(&record.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to insert scan record: {e}")))?;

            affected += res.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to commit transaction: {e}")))?;

        Ok(affected)
    }

    pub async fn list_by_dataset(&self, dataset_id: &str, limit: i64) -> Result<Vec<LabeledRecord>> {
        let rows = sqlx::query_as::<_, ScanRecordEntity>(
            "SELECT id, dataset_id, content, scan_type, is_phishing, threat_level, indicators, created_at \
             FROM scan_records WHERE dataset_id = ? ORDER BY created_at, id LIMIT ?",
        )
        .bind(dataset_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list scan records: {e}")))?;

        rows.into_iter().map(|e| e.try_into()).collect()
    }

    pub async fn count_by_dataset(&self, dataset_id: &str) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM scan_records WHERE dataset_id = ?")
                .bind(dataset_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(format!("Failed to count scan records: {e}")))?;

        Ok(count)
    }

    /// Recomputes the dataset summary from stored rows.
    /// LENGTH() on SQLite text counts characters, matching the
    /// char-based lengths used at normalization time.
    pub async fn summarize_dataset(&self, dataset_id: &str) -> Result<DatasetSummary> {
        let row = sqlx::query_as::<_, SummaryEntity>(
            "SELECT COUNT(*) AS total, \
                    COALESCE(SUM(is_phishing), 0) AS phishing, \
                    COALESCE(MIN(LENGTH(content)), 0) AS min_length, \
                    COALESCE(MAX(LENGTH(content)), 0) AS max_length, \
                    COALESCE(AVG(LENGTH(content)), 0.0) AS average_length \
             FROM scan_records WHERE dataset_id = ?",
        )
        .bind(dataset_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to summarize dataset: {e}")))?;

        if row.total == 0 {
            return Ok(DatasetSummary::empty());
        }

        Ok(DatasetSummary {
            total_records: row.total as usize,
            phishing_count: row.phishing as usize,
            legitimate_count: (row.total - row.phishing) as usize,
            phishing_percentage: row.phishing as f64 / row.total as f64 * 100.0,
            average_length: row.average_length,
            min_length: row.min_length as usize,
            max_length: row.max_length as usize,
        })
    }
}

/// Persistence adapter handed to the importer
pub struct SqliteRecordSink {
    datasets: DatasetRepository,
    records: ScanRecordRepository,
}

impl SqliteRecordSink {
    pub fn new(db: &ScanDb) -> Self {
        Self {
            datasets: DatasetRepository::new(db),
            records: ScanRecordRepository::new(db),
        }
    }

    pub fn into_shared(self) -> Arc<dyn RecordSink> {
        Arc::new(self)
    }
}

#[async_trait]
impl RecordSink for SqliteRecordSink {
    async fn create_dataset(&self, dataset: &Dataset) -> Result<()> {
        self.datasets.insert(dataset).await
    }

    async fn persist_chunk(&self, records: &[LabeledRecord]) -> Result<u64> {
        self.records.insert_chunk(records).await
    }
}

#[derive(sqlx::FromRow)]
struct ScanRecordEntity {
    id: String,
    dataset_id: String,
    content: String,
    scan_type: String,
    is_phishing: i64,
    threat_level: String,
    indicators: String,
    created_at: String,
}

impl TryFrom<ScanRecordEntity> for LabeledRecord {
    type Error = AppError;

    fn try_from(entity: ScanRecordEntity) -> Result<LabeledRecord> {
        let scan_type = ScanType::parse(&entity.scan_type).ok_or_else(|| {
            AppError::DatabaseError(format!(
                "Unknown scan type in scan_records: {}",
                entity.scan_type
            ))
        })?;
        let threat_level = ThreatLevel::parse(&entity.threat_level).ok_or_else(|| {
            AppError::DatabaseError(format!(
                "Unknown threat level in scan_records: {}",
                entity.threat_level
            ))
        })?;
        let indicators: Vec<String> = serde_json::from_str(&entity.indicators)
            .map_err(|e| AppError::DatabaseError(format!("Failed to decode indicators: {e}")))?;

        Ok(LabeledRecord {
            id: entity.id,
            dataset_id: entity.dataset_id,
            content: entity.content,
            scan_type,
            is_phishing: entity.is_phishing != 0,
            threat_level,
            indicators,
            created_at: entity.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SummaryEntity {
    total: i64,
    phishing: i64,
    min_length: i64,
    max_length: i64,
    average_length: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::aggregator::BatchAggregator;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_dataset(id: &str) -> Dataset {
        Dataset {
            dataset_id: id.to_string(),
            name: "sms fixture".to_string(),
            scan_type: ScanType::Sms,
            description: None,
            created_at: None,
        }
    }

    fn sample_record(dataset_id: &str, content: &str, is_phishing: bool) -> LabeledRecord {
        LabeledRecord {
            id: Uuid::new_v4().to_string(),
            dataset_id: dataset_id.to_string(),
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
            created_at: Utc::now().to_rfc3339(),
        }
    }

    async fn seeded_repo(dataset_id: &str) -> (ScanDb, ScanRecordRepository) {
        let db = ScanDb::connect_in_memory().await.unwrap();
        DatasetRepository::new(&db)
            .insert(&sample_dataset(dataset_id))
            .await
            .unwrap();
        let repo = ScanRecordRepository::new(&db);
        (db, repo)
    }

    #[tokio::test]
    async fn test_insert_chunk_and_list_roundtrip() {
        let (_db, repo) = seeded_repo("ds-1").await;

        let records = vec![
            sample_record("ds-1", "win a free prize now", true),
            sample_record("ds-1", "lunch at noon?", false),
        ];

        let affected = repo.insert_chunk(&records).await.unwrap();
        assert_eq!(affected, 2);
        assert_eq!(repo.count_by_dataset("ds-1").await.unwrap(), 2);

        let stored = repo.list_by_dataset("ds-1", 10).await.unwrap();
        assert_eq!(stored.len(), 2);

        let phishing = stored.iter().find(|r| r.is_phishing).unwrap();
        assert_eq!(phishing.content, "win a free prize now");
        assert_eq!(phishing.threat_level, ThreatLevel::Medium);
        assert_eq!(phishing.indicators, vec!["urgency_tone".to_string()]);

        let legit = stored.iter().find(|r| !r.is_phishing).unwrap();
        assert!(legit.indicators.is_empty());
    }

    #[tokio::test]
    async fn test_empty_chunk_is_a_noop() {
        let (_db, repo) = seeded_repo("ds-1").await;

        assert_eq!(repo.insert_chunk(&[]).await.unwrap(), 0);
        assert_eq!(repo.count_by_dataset("ds-1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_dataset_delete_cascades_to_records() {
        let (db, repo) = seeded_repo("ds-1").await;

        repo.insert_chunk(&[sample_record("ds-1", "verify your account", true)])
            .await
            .unwrap();
        assert_eq!(repo.count_by_dataset("ds-1").await.unwrap(), 1);

        DatasetRepository::new(&db).delete("ds-1").await.unwrap();
        assert_eq!(repo.count_by_dataset("ds-1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sql_summary_matches_in_memory_aggregation() {
        let (_db, repo) = seeded_repo("ds-1").await;

        let records = vec![
            sample_record("ds-1", "free prize", true),
            sample_record("ds-1", "hey", false),
            sample_record("ds-1", "team meeting moved to 3pm", false),
        ];
        repo.insert_chunk(&records).await.unwrap();

        let from_sql = repo.summarize_dataset("ds-1").await.unwrap();
        let from_memory = BatchAggregator::summarize(&records);

        assert_eq!(from_sql.total_records, from_memory.total_records);
        assert_eq!(from_sql.phishing_count, from_memory.phishing_count);
        assert_eq!(from_sql.legitimate_count, from_memory.legitimate_count);
        assert_eq!(from_sql.min_length, from_memory.min_length);
        assert_eq!(from_sql.max_length, from_memory.max_length);
        assert!((from_sql.average_length - from_memory.average_length).abs() < 1e-9);
        assert!((from_sql.phishing_percentage - from_memory.phishing_percentage).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_summary_of_missing_dataset_is_empty() {
        let (_db, repo) = seeded_repo("ds-1").await;

        let summary = repo.summarize_dataset("nope").await.unwrap();
        assert_eq!(summary, DatasetSummary::empty());
    }
}
