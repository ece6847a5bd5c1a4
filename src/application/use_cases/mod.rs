pub mod aggregator;
pub mod format_detector;
pub mod generator;
pub mod ingestion;
pub mod label_resolver;
pub mod normalizer;
pub mod rate_limiter;
pub mod service_config;
