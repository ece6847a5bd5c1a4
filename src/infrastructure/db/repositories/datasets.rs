use crate::domain::dataset::Dataset;
use crate::domain::error::{AppError, Result};
use crate::domain::scan::ScanType;
use crate::infrastructure::db::ScanDb;
use sqlx::sqlite::SqlitePool;

pub struct DatasetRepository {
    pool: SqlitePool,
}

impl DatasetRepository {
    pub fn new(db: &ScanDb) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    pub async fn insert(&self, dataset: &Dataset) -> Result<()> {
        sqlx::query(
            "INSERT INTO datasets (dataset_id, name, scan_type, description) VALUES (?, ?, ?, ?)",
        )
        .bind(&dataset.dataset_id)
        .bind(&dataset.name)
        .bind(dataset.scan_type.as_str())
        .bind(&dataset.description)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to insert dataset: {e}")))?;

        Ok(())
    }

    pub async fn get(&self, dataset_id: &str) -> Result<Dataset> {
        let row = sqlx::query_as::<_, DatasetEntity>(
            "SELECT dataset_id, name, scan_type, description, created_at FROM datasets \
             WHERE dataset_id = ?",
        )
        .bind(dataset_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch dataset: {e}")))?;

        match row {
            Some(entity) => entity.try_into(),
            None => Err(AppError::NotFound(format!(
                "Dataset not found: {}",
                dataset_id
            ))),
        }
    }

    pub async fn list_all(&self) -> Result<Vec<Dataset>> {
        let rows = sqlx::query_as::<_, DatasetEntity>(
            "SELECT dataset_id, name, scan_type, description, created_at FROM datasets \
             ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list datasets: {e}")))?;

        rows.into_iter().map(|e| e.try_into()).collect()
    }

    pub async fn list_by_scan_type(&self, scan_type: ScanType) -> Result<Vec<Dataset>> {
        let rows = sqlx::query_as::<_, DatasetEntity>(
            "SELECT dataset_id, name, scan_type, description, created_at FROM datasets \
             WHERE scan_type = ? ORDER BY created_at DESC",
        )
        .bind(scan_type.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list datasets: {e}")))?;

        rows.into_iter().map(|e| e.try_into()).collect()
    }

    /// Deletes the dataset row; scan records follow via FK cascade
    pub async fn delete(&self, dataset_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM datasets WHERE dataset_id = ?")
            .bind(dataset_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete dataset: {e}")))?;

        Ok(result.rows_affected())
    }
}

#[derive(sqlx::FromRow)]
struct DatasetEntity {
    dataset_id: String,
    name: String,
    scan_type: String,
    description: Option<String>,
    created_at: String,
}

impl TryFrom<DatasetEntity> for Dataset {
    type Error = AppError;

    fn try_from(entity: DatasetEntity) -> Result<Dataset> {
        let scan_type = ScanType::parse(&entity.scan_type).ok_or_else(|| {
            AppError::DatabaseError(format!("Unknown scan type in datasets: {}", entity.scan_type))
        })?;

        Ok(Dataset {
            dataset_id: entity.dataset_id,
            name: entity.name,
            scan_type,
            description: entity.description,
            created_at: Some(entity.created_at),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_dataset(id: &str, scan_type: ScanType) -> Dataset {
        Dataset {
            dataset_id: id.to_string(),
            name: format!("{} training set", scan_type.as_str()),
            scan_type,
            description: Some("imported from fixture".to_string()),
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_roundtrip() {
        let db = ScanDb::connect_in_memory().await.unwrap();
        let repo = DatasetRepository::new(&db);

        repo.insert(&sample_dataset("ds-1", ScanType::Sms))
            .await
            .unwrap();

        let fetched = repo.get("ds-1").await.unwrap();
        assert_eq!(fetched.dataset_id, "ds-1");
        assert_eq!(fetched.scan_type, ScanType::Sms);
        assert_eq!(
            fetched.description.as_deref(),
            Some("imported from fixture")
        );
        assert!(fetched.created_at.is_some());
    }

    #[tokio::test]
    async fn test_get_missing_returns_not_found() {
        let db = ScanDb::connect_in_memory().await.unwrap();
        let repo = DatasetRepository::new(&db);

        let err = repo.get("missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_by_scan_type_filters() {
        let db = ScanDb::connect_in_memory().await.unwrap();
        let repo = DatasetRepository::new(&db);

        repo.insert(&sample_dataset("ds-url", ScanType::Url))
            .await
            .unwrap();
        repo.insert(&sample_dataset("ds-sms", ScanType::Sms))
            .await
            .unwrap();

        let all = repo.list_all().await.unwrap();
        assert_eq!(all.len(), 2);

        let urls = repo.list_by_scan_type(ScanType::Url).await.unwrap();
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].dataset_id, "ds-url");
    }

    #[tokio::test]
    async fn test_delete_reports_rows_affected() {
        let db = ScanDb::connect_in_memory().await.unwrap();
        let repo = DatasetRepository::new(&db);

        repo.insert(&sample_dataset("ds-1", ScanType::Email))
            .await
            .unwrap();

        assert_eq!(repo.delete("ds-1").await.unwrap(), 1);
        assert_eq!(repo.delete("ds-1").await.unwrap(), 0);
    }
}
