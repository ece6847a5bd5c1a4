pub mod use_cases;

pub use use_cases::aggregator::BatchAggregator;
pub use use_cases::format_detector::FormatDetector;
pub use use_cases::generator::{GeneratorConfig, SyntheticGenerator};
pub use use_cases::ingestion::{DatasetImporter, IngestionConfig, IngestionPipeline, RecordSink};
pub use use_cases::label_resolver::LabelResolver;
pub use use_cases::normalizer::{RecordNormalizer, StdRandomSource};
pub use use_cases::rate_limiter::{RateLimitDecision, RateLimiter};
pub use use_cases::service_config::ServiceConfig;
