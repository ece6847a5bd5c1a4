mod datasets;
mod model_versions;
mod scan_records;

pub use datasets::DatasetRepository;
pub use model_versions::{ModelVersion, ModelVersionInput, ModelVersionRepository};
pub use scan_records::{ScanRecordRepository, SqliteRecordSink};
