use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{
    delete, dev::Server, get, post, web, App, HttpRequest, HttpResponse, HttpServer, Responder,
    Scope,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::application::use_cases::generator::{GeneratorConfig, SyntheticGenerator};
use crate::application::use_cases::ingestion::{
    clamp_row_cap, DatasetImporter, ImportOutcome, IngestionConfig, IngestionPipeline, RecordSink,
};
use crate::application::use_cases::rate_limiter::RateLimiter;
use crate::application::use_cases::service_config::ServiceConfig;
use crate::domain::dataset::{Dataset, DatasetSummary};
use crate::domain::error::{AppError, Result};
use crate::domain::record::LabeledRecord;
use crate::domain::scan::{ScanType, ThreatScale};
use crate::infrastructure::csv::{export_records_csv, DelimiterChoice};
use crate::infrastructure::db::repositories::{
    DatasetRepository, ModelVersion, ModelVersionInput, ModelVersionRepository,
    ScanRecordRepository, SqliteRecordSink,
};
use crate::infrastructure::db::ScanDb;

pub struct AppState {
    pub config: ServiceConfig,
    pub datasets: DatasetRepository,
    pub records: ScanRecordRepository,
    pub models: ModelVersionRepository,
    pub sink: Arc<dyn RecordSink>,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(db: &ScanDb, config: ServiceConfig) -> Self {
        Self {
            datasets: DatasetRepository::new(db),
            records: ScanRecordRepository::new(db),
            models: ModelVersionRepository::new(db),
            sink: SqliteRecordSink::new(db).into_shared(),
            rate_limiter: RateLimiter::with_default_store(config.rate_limit.clone()),
            config,
        }
    }
}

// ===== REQUEST / RESPONSE TYPES =====

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportDatasetRequest {
    pub name: String,
    pub scan_type: String,
    pub content: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Single delimiter character; omitted or "auto" means detect
    #[serde(default)]
    pub delimiter: Option<String>,
    #[serde(default)]
    pub threat_scale: Option<String>,
    #[serde(default)]
    pub max_content_length: Option<usize>,
    #[serde(default)]
    pub max_rows: Option<usize>,
    #[serde(default)]
    pub chunk_size: Option<usize>,
    #[serde(default)]
    pub sample_size: Option<usize>,
    /// false runs the pipeline without writing anything
    #[serde(default)]
    pub persist: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateDatasetRequest {
    pub name: String,
    pub scan_type: String,
    pub count: usize,
    #[serde(default)]
    pub phishing_ratio: Option<f64>,
    #[serde(default)]
    pub threat_scale: Option<String>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub chunk_size: Option<usize>,
    #[serde(default)]
    pub sample_size: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub dataset_id: String,
    pub name: String,
    pub format: String,
    pub summary: DatasetSummary,
    pub sample_records: Vec<LabeledRecord>,
    pub persisted_records: u64,
    pub rows_skipped: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanTypeQuery {
    #[serde(default)]
    pub scan_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecordsQuery {
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetDetail {
    pub dataset: Dataset,
    pub record_count: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateModelVersionRequest {
    pub name: String,
    pub scan_type: String,
    pub version: String,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub precision_score: Option<f64>,
    #[serde(default)]
    pub recall: Option<f64>,
    #[serde(default)]
    pub f1_score: Option<f64>,
    #[serde(default)]
    pub training_params: Option<serde_json::Value>,
    #[serde(default)]
    pub dataset_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub deleted: u64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<i64>,
}

// ===== DATASET ROUTES =====

#[post("/datasets/import")]
async fn import_dataset(
    state: web::Data<AppState>,
    http_req: HttpRequest,
    req: web::Json<ImportDatasetRequest>,
) -> impl Responder {
    if let Err(err) = state.rate_limiter.enforce(&caller_key(&http_req, "import")) {
        return error_response(&err);
    }

    match run_import(&state, req.into_inner()).await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(err) => error_response(&err),
    }
}

async fn run_import(state: &AppState, req: ImportDatasetRequest) -> Result<ImportReport> {
    let scan_type = parse_scan_type(&req.scan_type)?;
    let delimiter = parse_delimiter(req.delimiter.as_deref())?;
    let defaults = &state.config.ingestion;

    let mut config = IngestionConfig::new(scan_type)
        .with_delimiter(delimiter)
        .with_max_content_length(
            req.max_content_length
                .unwrap_or_else(|| scan_type.content_cap()),
        )
        .with_max_rows(clamp_row_cap(
            req.max_rows.unwrap_or(defaults.default_max_rows),
        ));
    if let Some(raw) = &req.threat_scale {
        config = config.with_threat_scale(parse_threat_scale(raw)?);
    }

    let dataset = Dataset {
        dataset_id: Uuid::new_v4().to_string(),
        name: req.name.clone(),
        scan_type,
        description: req.description.clone(),
        created_at: None,
    };

    let mut pipeline = IngestionPipeline::new(config);
    let outcome = if req.persist.unwrap_or(true) {
        let chunk_size = req.chunk_size.unwrap_or(defaults.default_chunk_size);
        let importer = DatasetImporter::new(Arc::clone(&state.sink), chunk_size);
        importer.import(pipeline, &req.content, &dataset).await?
    } else {
        let batch = pipeline.prepare(&req.content, &dataset.dataset_id)?;
        ImportOutcome {
            batch,
            persisted_records: 0,
        }
    };

    info!(
        "Imported dataset {} ({}): {} records persisted, {} rows skipped",
        dataset.dataset_id, req.name, outcome.persisted_records, outcome.batch.rows_skipped
    );

    let sample_size = req.sample_size.unwrap_or(defaults.sample_size);
    let batch = outcome.batch;
    Ok(ImportReport {
        dataset_id: batch.dataset_id,
        name: req.name,
        format: batch.format.as_str().to_string(),
        summary: batch.summary,
        sample_records: batch.records.into_iter().take(sample_size).collect(),
        persisted_records: outcome.persisted_records,
        rows_skipped: batch.rows_skipped,
    })
}

#[post("/datasets/generate")]
async fn generate_dataset(
    state: web::Data<AppState>,
    http_req: HttpRequest,
    req: web::Json<GenerateDatasetRequest>,
) -> impl Responder {
    if let Err(err) = state
        .rate_limiter
        .enforce(&caller_key(&http_req, "generate"))
    {
        return error_response(&err);
    }

    match run_generate(&state, req.into_inner()).await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(err) => error_response(&err),
    }
}

async fn run_generate(state: &AppState, req: GenerateDatasetRequest) -> Result<ImportReport> {
    let scan_type = parse_scan_type(&req.scan_type)?;
    let defaults = &state.config.ingestion;

    let mut config = GeneratorConfig::new(scan_type, req.count);
    if let Some(ratio) = req.phishing_ratio {
        config = config.with_phishing_ratio(ratio);
    }
    if let Some(raw) = &req.threat_scale {
        config = config.with_threat_scale(parse_threat_scale(raw)?);
    }
    if let Some(seed) = req.seed {
        config = config.with_seed(seed);
    }

    let dataset = Dataset {
        dataset_id: Uuid::new_v4().to_string(),
        name: req.name.clone(),
        scan_type,
        description: req.description.clone(),
        created_at: None,
    };

    let mut generator = SyntheticGenerator::new(config);
    let batch = generator.generate(&dataset.dataset_id)?;

    let chunk_size = req.chunk_size.unwrap_or(defaults.default_chunk_size);
    let importer = DatasetImporter::new(Arc::clone(&state.sink), chunk_size);
    let persisted_records = importer.persist(&dataset, &batch.records).await?;

    info!(
        "Generated dataset {} ({}): {} records persisted",
        dataset.dataset_id, req.name, persisted_records
    );

    let sample_size = req.sample_size.unwrap_or(defaults.sample_size);
    Ok(ImportReport {
        dataset_id: batch.dataset_id,
        name: req.name,
        format: "synthetic".to_string(),
        summary: batch.summary,
        sample_records: batch.records.into_iter().take(sample_size).collect(),
        persisted_records,
        rows_skipped: 0,
    })
}

#[get("/datasets")]
async fn list_datasets(
    state: web::Data<AppState>,
    query: web::Query<ScanTypeQuery>,
) -> impl Responder {
    let result = match &query.scan_type {
        Some(raw) => match parse_scan_type(raw) {
            Ok(scan_type) => state.datasets.list_by_scan_type(scan_type).await,
            Err(err) => return error_response(&err),
        },
        None => state.datasets.list_all().await,
    };

    match result {
        Ok(datasets) => HttpResponse::Ok().json(datasets),
        Err(err) => error_response(&err),
    }
}

#[get("/datasets/{dataset_id}")]
async fn get_dataset(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let dataset_id = path.into_inner();

    let dataset = match state.datasets.get(&dataset_id).await {
        Ok(dataset) => dataset,
        Err(err) => return error_response(&err),
    };

    match state.records.count_by_dataset(&dataset_id).await {
        Ok(record_count) => HttpResponse::Ok().json(DatasetDetail {
            dataset,
            record_count,
        }),
        Err(err) => error_response(&err),
    }
}

#[get("/datasets/{dataset_id}/records")]
async fn list_dataset_records(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<RecordsQuery>,
) -> impl Responder {
    let dataset_id = path.into_inner();

    if let Err(err) = state.datasets.get(&dataset_id).await {
        return error_response(&err);
    }

    let limit = query.limit.unwrap_or(100);
    match state.records.list_by_dataset(&dataset_id, limit).await {
        Ok(records) => HttpResponse::Ok().json(records),
        Err(err) => error_response(&err),
    }
}

#[get("/datasets/{dataset_id}/summary")]
async fn dataset_summary(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let dataset_id = path.into_inner();

    if let Err(err) = state.datasets.get(&dataset_id).await {
        return error_response(&err);
    }

    match state.records.summarize_dataset(&dataset_id).await {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(err) => error_response(&err),
    }
}

#[get("/datasets/{dataset_id}/export")]
async fn export_dataset(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let dataset_id = path.into_inner();

    if let Err(err) = state.datasets.get(&dataset_id).await {
        return error_response(&err);
    }

    let records = match state.records.list_by_dataset(&dataset_id, i64::MAX).await {
        Ok(records) => records,
        Err(err) => return error_response(&err),
    };

    match export_records_csv(&records) {
        Ok(csv) => HttpResponse::Ok().content_type("text/csv").body(csv),
        Err(err) => error_response(&err),
    }
}

#[delete("/datasets/{dataset_id}")]
async fn delete_dataset(
    state: web::Data<AppState>,
    http_req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    if let Err(err) = state.rate_limiter.enforce(&caller_key(&http_req, "delete")) {
        return error_response(&err);
    }

    let dataset_id = path.into_inner();
    match state.datasets.delete(&dataset_id).await {
        Ok(0) => error_response(&AppError::NotFound(format!(
            "Dataset not found: {}",
            dataset_id
        ))),
        Ok(deleted) => {
            info!("Deleted dataset {}", dataset_id);
            HttpResponse::Ok().json(DeleteResponse { deleted })
        }
        Err(err) => error_response(&err),
    }
}

// ===== MODEL ROUTES =====

#[get("/models")]
async fn list_models(
    state: web::Data<AppState>,
    query: web::Query<ScanTypeQuery>,
) -> impl Responder {
    let result = match &query.scan_type {
        Some(raw) => match parse_scan_type(raw) {
            Ok(scan_type) => state.models.list_by_scan_type(scan_type).await,
            Err(err) => return error_response(&err),
        },
        None => state.models.list_all().await,
    };

    match result {
        Ok(models) => HttpResponse::Ok().json(models),
        Err(err) => error_response(&err),
    }
}

#[post("/models")]
async fn create_model(
    state: web::Data<AppState>,
    req: web::Json<CreateModelVersionRequest>,
) -> impl Responder {
    match run_create_model(&state, req.into_inner()).await {
        Ok(model) => HttpResponse::Ok().json(model),
        Err(err) => error_response(&err),
    }
}

async fn run_create_model(
    state: &AppState,
    req: CreateModelVersionRequest,
) -> Result<ModelVersion> {
    let scan_type = parse_scan_type(&req.scan_type)?;
    let training_params = match req.training_params {
        Some(value) => Some(
            serde_json::to_string(&value)
                .map_err(|e| AppError::Internal(format!("Failed to encode training params: {e}")))?,
        ),
        None => None,
    };

    let input = ModelVersionInput {
        version_id: Uuid::new_v4().to_string(),
        name: req.name,
        scan_type,
        version: req.version,
        accuracy: req.accuracy,
        precision_score: req.precision_score,
        recall: req.recall,
        f1_score: req.f1_score,
        training_params,
        dataset_id: req.dataset_id,
    };

    state.models.insert(&input).await?;
    state.models.get(&input.version_id).await
}

#[post("/models/{version_id}/activate")]
async fn activate_model(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    match state.models.activate(&path.into_inner()).await {
        Ok(model) => HttpResponse::Ok().json(model),
        Err(err) => error_response(&err),
    }
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
    })
}

// ===== HELPERS =====

fn parse_scan_type(raw: &str) -> Result<ScanType> {
    ScanType::parse(raw)
        .ok_or_else(|| AppError::ValidationError(format!("Unknown scan type: {}", raw)))
}

fn parse_threat_scale(raw: &str) -> Result<ThreatScale> {
    ThreatScale::parse(raw)
        .ok_or_else(|| AppError::ValidationError(format!("Unknown threat scale: {}", raw)))
}

fn parse_delimiter(raw: Option<&str>) -> Result<DelimiterChoice> {
    match raw {
        None => Ok(DelimiterChoice::Auto),
        Some("auto") => Ok(DelimiterChoice::Auto),
        Some(s) if s.len() == 1 && s.is_ascii() => Ok(DelimiterChoice::Char(s.as_bytes()[0])),
        Some(other) => Err(AppError::ValidationError(format!(
            "Delimiter must be a single character, got '{}'",
            other
        ))),
    }
}

/// Rate limit key: caller IP plus action, so a noisy importer does not
/// consume the delete budget
fn caller_key(req: &HttpRequest, action: &str) -> String {
    let info = req.connection_info();
    let ip = info.realip_remote_addr().unwrap_or("unknown");
    format!("{}:{}", ip, action)
}

fn error_response(err: &AppError) -> HttpResponse {
    let body = ErrorResponse {
        error: err.to_string(),
        retry_after_secs: None,
    };

    match err {
        AppError::EmptyInput
        | AppError::UnrecognizedLabel(_)
        | AppError::ContentTooShort(_)
        | AppError::ValidationError(_)
        | AppError::ParseError(_) => HttpResponse::BadRequest().json(body),
        AppError::NotFound(_) => HttpResponse::NotFound().json(body),
        AppError::RateLimited { retry_after_secs } => {
            HttpResponse::TooManyRequests().json(ErrorResponse {
                retry_after_secs: Some(*retry_after_secs),
                ..body
            })
        }
        AppError::DatabaseError(_) | AppError::IoError(_) | AppError::Internal(_) => {
            error!("Request failed: {}", err);
            HttpResponse::InternalServerError().json(body)
        }
    }
}

fn api_scope() -> Scope {
    web::scope("/api/v1")
        .service(import_dataset)
        .service(generate_dataset)
        .service(list_datasets)
        .service(get_dataset)
        .service(list_dataset_records)
        .service(dataset_summary)
        .service(export_dataset)
        .service(delete_dataset)
        .service(list_models)
        .service(create_model)
        .service(activate_model)
        .service(health)
}

pub fn start_server(state: AppState) -> std::io::Result<Server> {
    let bind_address = state.config.server.bind_address.clone();
    let port = state.config.server.port;
    let data = web::Data::new(state);

    let server = HttpServer::new(move || {
        let cors = Cors::permissive(); // Allow all origins for local tool

        App::new()
            .wrap(cors)
            .app_data(data.clone())
            .service(api_scope())
    })
    .bind((bind_address, port))?
    .run();

    Ok(server)
}
