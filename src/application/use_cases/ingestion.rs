// ============================================================
// DATASET INGESTION
// ============================================================
// Orchestrates the import path: parse rows, detect the column
// shape once, resolve labels, normalize, aggregate. Row-level
// failures drop the row; batch-level failures fail the import.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::application::use_cases::aggregator::BatchAggregator;
use crate::application::use_cases::format_detector::FormatDetector;
use crate::application::use_cases::label_resolver::LabelResolver;
use crate::application::use_cases::normalizer::{
    NormalizerConfig, RandomSource, RecordNormalizer, DEFAULT_MAX_CONTENT_LENGTH,
    MIN_CONTENT_LENGTH,
};
use crate::domain::dataset::{Dataset, DatasetSummary};
use crate::domain::error::{AppError, Result};
use crate::domain::format::{ColumnMap, DatasetFormat};
use crate::domain::record::LabeledRecord;
use crate::domain::scan::{ScanType, ThreatScale};
use crate::infrastructure::csv::{read_lossy, DelimitedTextParser, DelimiterChoice};

/// Data rows processed per import when the caller supplies no cap
pub const DEFAULT_MAX_ROWS: usize = 5_000;

/// Upper bound a service request can raise the row cap to
pub const MAX_ROWS_CEILING: usize = 15_000;

/// Lower bound a service request can push the row cap down to
pub const MIN_ROWS_FLOOR: usize = 1_000;

/// Clamp a requested row cap into the window the service accepts
pub fn clamp_row_cap(requested: usize) -> usize {
    requested.clamp(MIN_ROWS_FLOOR, MAX_ROWS_CEILING)
}

/// Per-import knobs; one config covers one input batch
#[derive(Debug, Clone)]
pub struct IngestionConfig {
    pub scan_type: ScanType,
    pub threat_scale: ThreatScale,
    pub delimiter: DelimiterChoice,
    pub max_content_length: usize,
    pub min_content_length: usize,
    pub max_rows: usize,
}

impl IngestionConfig {
    pub fn new(scan_type: ScanType) -> Self {
        Self {
            scan_type,
            threat_scale: ThreatScale::default(),
            delimiter: DelimiterChoice::Auto,
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
            min_content_length: MIN_CONTENT_LENGTH,
            max_rows: DEFAULT_MAX_ROWS,
        }
    }

    pub fn with_delimiter(mut self, delimiter: DelimiterChoice) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_threat_scale(mut self, threat_scale: ThreatScale) -> Self {
        self.threat_scale = threat_scale;
        self
    }

    pub fn with_max_content_length(mut self, max_content_length: usize) -> Self {
        self.max_content_length = max_content_length;
        self
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    fn normalizer_config(&self) -> NormalizerConfig {
        NormalizerConfig {
            max_content_length: self.max_content_length,
            min_content_length: self.min_content_length,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.normalizer_config().validate()?;
        if self.max_rows == 0 {
            return Err(AppError::ValidationError(
                "max_rows must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Everything the pipeline produced for one input batch
#[derive(Debug, Clone)]
pub struct PreparedBatch {
    pub dataset_id: String,
    pub format: DatasetFormat,
    pub records: Vec<LabeledRecord>,
    pub summary: DatasetSummary,
    /// Rows parsed but dropped: unresolvable labels, short content,
    /// rows narrower than the detected columns
    pub rows_skipped: usize,
}

/// One pipeline instance prepares one batch under one config
pub struct IngestionPipeline {
    config: IngestionConfig,
    resolver: LabelResolver,
    normalizer: RecordNormalizer,
}

impl IngestionPipeline {
    pub fn new(config: IngestionConfig) -> Self {
        let resolver = LabelResolver::new(config.scan_type, config.threat_scale);
        let normalizer = RecordNormalizer::new(config.normalizer_config());
        Self {
            config,
            resolver,
            normalizer,
        }
    }

    /// Use an injected random source for indicator draws
    pub fn with_random_source(config: IngestionConfig, random: Box<dyn RandomSource>) -> Self {
        let resolver = LabelResolver::new(config.scan_type, config.threat_scale);
        let normalizer = RecordNormalizer::with_random_source(config.normalizer_config(), random);
        Self {
            config,
            resolver,
            normalizer,
        }
    }

    pub fn config(&self) -> &IngestionConfig {
        &self.config
    }

    /// Turn raw delimited text into labeled records plus their summary.
    /// Empty input is an error; an unrecognized column shape is not, it
    /// yields a zero-record batch tagged unknown.
    pub fn prepare(&mut self, text: &str, dataset_id: &str) -> Result<PreparedBatch> {
        self.config.validate()?;

        let parser = DelimitedTextParser::for_choice(self.config.delimiter, text);
        let rows = parser.parse_text(text)?;
        let delimiter = parser.delimiter();

        let header = rows.first().ok_or(AppError::EmptyInput)?;
        let detection = FormatDetector::new(self.config.scan_type).detect(header, delimiter);
        let format = detection.format;

        let columns = match detection.columns {
            Some(columns) => columns,
            None => {
                warn!(
                    "No known column shape in input for dataset {}; dropping {} rows",
                    dataset_id,
                    rows.len()
                );
                return Ok(PreparedBatch {
                    dataset_id: dataset_id.to_string(),
                    format,
                    records: Vec::new(),
                    summary: DatasetSummary::empty(),
                    rows_skipped: rows.len(),
                });
            }
        };

        // The pipe shape matches data rows as well as headers, so row 0 is
        // kept as a candidate there; a true header row still drops because
        // its label token never resolves. Header-keyed shapes skip row 0.
        let data_start = if format == DatasetFormat::UrlStatusPipe {
            0
        } else {
            1
        };

        let mut records = Vec::new();
        let mut rows_skipped = 0usize;

        for row in rows.iter().skip(data_start).take(self.config.max_rows) {
            match self.prepare_row(row, &columns, delimiter, dataset_id) {
                Ok(record) => records.push(record),
                Err(err) => {
                    rows_skipped += 1;
                    debug!("Dropped row for dataset {}: {}", dataset_id, err);
                }
            }
        }

        let summary = BatchAggregator::summarize(&records);
        info!(
            "Prepared {} records ({} skipped) as {} for dataset {}",
            records.len(),
            rows_skipped,
            format,
            dataset_id
        );

        Ok(PreparedBatch {
            dataset_id: dataset_id.to_string(),
            format,
            records,
            summary,
            rows_skipped,
        })
    }

    fn prepare_row(
        &mut self,
        row: &[String],
        columns: &ColumnMap,
        delimiter: u8,
        dataset_id: &str,
    ) -> Result<LabeledRecord> {
        let (content, label) = columns.extract(row, delimiter).ok_or_else(|| {
            AppError::ParseError(format!(
                "Row has {} fields, too narrow for the detected columns",
                row.len()
            ))
        })?;

        let (is_phishing, threat_level) = self.resolver.resolve(&label)?;

        self.normalizer.normalize(
            &content,
            is_phishing,
            threat_level,
            self.config.scan_type,
            dataset_id,
        )
    }
}

/// Persistence seam the importer writes through
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn create_dataset(&self, dataset: &Dataset) -> Result<()>;

    /// Insert one chunk of records; returns rows written
    async fn persist_chunk(&self, records: &[LabeledRecord]) -> Result<u64>;
}

/// A prepared batch plus what actually reached the sink
#[derive(Debug)]
pub struct ImportOutcome {
    pub batch: PreparedBatch,
    pub persisted_records: u64,
}

/// Runs the pipeline and writes the result through a sink
pub struct DatasetImporter {
    sink: Arc<dyn RecordSink>,
    aggregator: BatchAggregator,
}

impl DatasetImporter {
    pub fn new(sink: Arc<dyn RecordSink>, chunk_size: usize) -> Self {
        Self {
            sink,
            aggregator: BatchAggregator::new(chunk_size),
        }
    }

    /// Prepare and persist one batch. A zero-record batch (unknown shape,
    /// or every row dropped) writes nothing, not even the dataset row.
    pub async fn import(
        &self,
        mut pipeline: IngestionPipeline,
        text: &str,
        dataset: &Dataset,
    ) -> Result<ImportOutcome> {
        let batch = pipeline.prepare(text, &dataset.dataset_id)?;
        let persisted_records = self.persist(dataset, &batch.records).await?;

        Ok(ImportOutcome {
            batch,
            persisted_records,
        })
    }

    pub async fn import_file(
        &self,
        pipeline: IngestionPipeline,
        path: &Path,
        dataset: &Dataset,
    ) -> Result<ImportOutcome> {
        let text = read_lossy(path)?;
        self.import(pipeline, &text, dataset).await
    }

    /// Persist already-prepared records: one dataset row, then records in
    /// chunked transactions
    pub async fn persist(&self, dataset: &Dataset, records: &[LabeledRecord]) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        self.sink.create_dataset(dataset).await?;

        let mut persisted: u64 = 0;
        for chunk in self.aggregator.chunk(records) {
            persisted += self.sink.persist_chunk(chunk).await?;
        }

        info!(
            "Persisted {} records for dataset {}",
            persisted, dataset.dataset_id
        );
        Ok(persisted)
    }
}
