// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// Delimited-text parsing and dataset export

mod exporter;
mod parser;

pub use exporter::export_records_csv;
pub use parser::{read_lossy, DelimitedTextParser, DelimiterChoice};
