use crate::domain::error::{AppError, Result};
use crate::domain::scan::ScanType;
use crate::infrastructure::db::ScanDb;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePool;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelVersion {
    pub version_id: String,
    pub name: String,
    pub scan_type: ScanType,
    pub version: String,
    pub accuracy: Option<f64>,
    pub precision_score: Option<f64>,
    pub recall: Option<f64>,
    pub f1_score: Option<f64>,
    pub training_params: Option<String>,
    pub dataset_id: Option<String>,
    pub is_active: bool,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelVersionInput {
    pub version_id: String,
    pub name: String,
    pub scan_type: ScanType,
    pub version: String,
    pub accuracy: Option<f64>,
    pub precision_score: Option<f64>,
    pub recall: Option<f64>,
    pub f1_score: Option<f64>,
    pub training_params: Option<String>,
    pub dataset_id: Option<String>,
}

pub struct ModelVersionRepository {
    pool: SqlitePool,
}

impl ModelVersionRepository {
    pub fn new(db: &ScanDb) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    pub async fn insert(&self, version: &ModelVersionInput) -> Result<()> {
        sqlx::query(
            "INSERT INTO model_versions (version_id, name, scan_type, version, accuracy, precision_score, recall, f1_score, training_params, dataset_id) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&version.version_id)
        .bind(&version.name)
        .bind(version.scan_type.as_str())
        .bind(&version.version)
        .bind(version.accuracy)
        .bind(version.precision_score)
        .bind(version.recall)
        .bind(version.f1_score)
        .bind(&version.training_params)
        .bind(&version.dataset_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to insert model version: {e}")))?;

        Ok(())
    }

    pub async fn get(&self, version_id: &str) -> Result<ModelVersion> {
        let row = sqlx::query_as::<_, ModelVersionEntity>(
            "SELECT version_id, name, scan_type, version, accuracy, precision_score, recall, f1_score, training_params, dataset_id, is_active, created_at \
             FROM model_versions WHERE version_id = ?",
        )
        .bind(version_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch model version: {e}")))?;

        match row {
            Some(entity) => entity.try_into(),
            None => Err(AppError::NotFound(format!(
                "Model version not found: {}",
                version_id
            ))),
        }
    }

    pub async fn list_all(&self) -> Result<Vec<ModelVersion>> {
        let rows = sqlx::query_as::<_, ModelVersionEntity>(
            "SELECT version_id, name, scan_type, version, accuracy, precision_score, recall, f1_score, training_params, dataset_id, is_active, created_at \
             FROM model_versions ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list model versions: {e}")))?;

        rows.into_iter().map(|e| e.try_into()).collect()
    }

    pub async fn list_by_scan_type(&self, scan_type: ScanType) -> Result<Vec<ModelVersion>> {
        let rows = sqlx::query_as::<_, ModelVersionEntity>(
            "SELECT version_id, name, scan_type, version, accuracy, precision_score, recall, f1_score, training_params, dataset_id, is_active, created_at \
             FROM model_versions WHERE scan_type = ? ORDER BY created_at DESC",
        )
        .bind(scan_type.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list model versions: {e}")))?;

        rows.into_iter().map(|e| e.try_into()).collect()
    }

    /// Marks one version active for its scan type; any previously
    /// active version of that scan type is demoted in the same
    /// transaction
    pub async fn activate(&self, version_id: &str) -> Result<ModelVersion> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to begin transaction: {e}")))?;

        let scan_type: Option<String> =
            sqlx::query_scalar("SELECT scan_type FROM model_versions WHERE version_id = ?")
                .bind(version_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(format!("Failed to fetch model version: {e}"))
                })?;

        let scan_type = scan_type.ok_or_else(|| {
            AppError::NotFound(format!("Model version not found: {}", version_id))
        })?;

        sqlx::query("UPDATE model_versions SET is_active = 0 WHERE scan_type = ?")
            .bind(&scan_type)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to demote model versions: {e}"))
            })?;

        sqlx::query("UPDATE model_versions SET is_active = 1 WHERE version_id = ?")
            .bind(version_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to activate model version: {e}"))
            })?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to commit transaction: {e}")))?;

        self.get(version_id).await
    }

    pub async fn get_active(&self, scan_type: ScanType) -> Result<Option<ModelVersion>> {
        let row = sqlx::query_as::<_, ModelVersionEntity>(
            "SELECT version_id, name, scan_type, version, accuracy, precision_score, recall, f1_score, training_params, dataset_id, is_active, created_at \
             FROM model_versions WHERE scan_type = ? AND is_active = 1",
        )
        .bind(scan_type.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch active model: {e}")))?;

        row.map(|e| e.try_into()).transpose()
    }
}

#[derive(sqlx::FromRow)]
struct ModelVersionEntity {
    version_id: String,
    name: String,
    scan_type: String,
    version: String,
    accuracy: Option<f64>,
    precision_score: Option<f64>,
    recall: Option<f64>,
    f1_score: Option<f64>,
    training_params: Option<String>,
    dataset_id: Option<String>,
    is_active: i64,
    created_at: String,
}

impl TryFrom<ModelVersionEntity> for ModelVersion {
    type Error = AppError;

    fn try_from(entity: ModelVersionEntity) -> Result<ModelVersion> {
        let scan_type = ScanType::parse(&entity.scan_type).ok_or_else(|| {
            AppError::DatabaseError(format!(
                "Unknown scan type in model_versions: {}",
                entity.scan_type
            ))
        })?;

        Ok(ModelVersion {
            version_id: entity.version_id,
            name: entity.name,
            scan_type,
            version: entity.version,
            accuracy: entity.accuracy,
            precision_score: entity.precision_score,
            recall: entity.recall,
            f1_score: entity.f1_score,
            training_params: entity.training_params,
            dataset_id: entity.dataset_id,
            is_active: entity.is_active != 0,
            created_at: Some(entity.created_at),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input(version_id: &str, scan_type: ScanType) -> ModelVersionInput {
        ModelVersionInput {
            version_id: version_id.to_string(),
            name: "url-classifier".to_string(),
            scan_type,
            version: "1.0.0".to_string(),
            accuracy: Some(0.93),
            precision_score: Some(0.91),
            recall: Some(0.89),
            f1_score: Some(0.90),
            training_params: Some(r#"{"epochs":10}"#.to_string()),
            dataset_id: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_roundtrip() {
        let db = ScanDb::connect_in_memory().await.unwrap();
        let repo = ModelVersionRepository::new(&db);

        repo.insert(&sample_input("mv-1", ScanType::Url))
            .await
            .unwrap();

        let fetched = repo.get("mv-1").await.unwrap();
        assert_eq!(fetched.name, "url-classifier");
        assert_eq!(fetched.scan_type, ScanType::Url);
        assert_eq!(fetched.accuracy, Some(0.93));
        assert!(!fetched.is_active);
    }

    #[tokio::test]
    async fn test_get_missing_returns_not_found() {
        let db = ScanDb::connect_in_memory().await.unwrap();
        let repo = ModelVersionRepository::new(&db);

        let err = repo.get("missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_activation_keeps_single_active_per_scan_type() {
        let db = ScanDb::connect_in_memory().await.unwrap();
        let repo = ModelVersionRepository::new(&db);

        repo.insert(&sample_input("mv-1", ScanType::Url))
            .await
            .unwrap();
        repo.insert(&sample_input("mv-2", ScanType::Url))
            .await
            .unwrap();
        repo.insert(&sample_input("mv-sms", ScanType::Sms))
            .await
            .unwrap();

        let activated = repo.activate("mv-1").await.unwrap();
        assert!(activated.is_active);

        // Activating a sibling demotes the first
        repo.activate("mv-2").await.unwrap();
        assert!(!repo.get("mv-1").await.unwrap().is_active);
        assert!(repo.get("mv-2").await.unwrap().is_active);

        // Other scan types are untouched
        repo.activate("mv-sms").await.unwrap();
        assert!(repo.get("mv-2").await.unwrap().is_active);

        let active_url = repo.get_active(ScanType::Url).await.unwrap().unwrap();
        assert_eq!(active_url.version_id, "mv-2");
        assert!(repo.get_active(ScanType::Email).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_activate_missing_returns_not_found() {
        let db = ScanDb::connect_in_memory().await.unwrap();
        let repo = ModelVersionRepository::new(&db);

        let err = repo.activate("missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_by_scan_type_filters() {
        let db = ScanDb::connect_in_memory().await.unwrap();
        let repo = ModelVersionRepository::new(&db);

        repo.insert(&sample_input("mv-1", ScanType::Url))
            .await
            .unwrap();
        repo.insert(&sample_input("mv-2", ScanType::Sms))
            .await
            .unwrap();

        assert_eq!(repo.list_all().await.unwrap().len(), 2);

        let sms = repo.list_by_scan_type(ScanType::Sms).await.unwrap();
        assert_eq!(sms.len(), 1);
        assert_eq!(sms[0].version_id, "mv-2");
    }
}
