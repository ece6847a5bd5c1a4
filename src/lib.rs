pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;

use std::path::Path;

use tracing::{info, warn};

use crate::application::use_cases::service_config::ServiceConfig;
use crate::domain::error::{AppError, Result};
use crate::infrastructure::db::ScanDb;
use crate::interfaces::http::{start_server, AppState};

pub use domain::{Dataset, DatasetSummary, LabeledRecord, ScanType, ThreatLevel, ThreatScale};

const CONFIG_PATH: &str = "phishguard.json";

pub async fn run() -> Result<()> {
    let _ = tracing_subscriber::fmt().with_env_filter("info").try_init();

    let config = ServiceConfig::load_or_default(Path::new(CONFIG_PATH));
    let validation = config.validate();
    for warning in &validation.warnings {
        warn!("Config warning: {}", warning);
    }
    if !validation.valid {
        return Err(AppError::ValidationError(format!(
            "Invalid configuration: {}",
            validation.errors.join("; ")
        )));
    }

    let db = ScanDb::connect(Path::new(&config.database.path)).await?;

    info!(
        "Starting phishguard on {}:{} (db: {})",
        config.server.bind_address, config.server.port, config.database.path
    );

    let server = start_server(AppState::new(&db, config))?;
    server.await.map_err(AppError::from)
}
