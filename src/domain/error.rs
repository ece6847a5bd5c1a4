use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize)]
pub enum AppError {
    EmptyInput,
    UnrecognizedLabel(String),
    ContentTooShort(String),
    ValidationError(String),
    ParseError(String),
    DatabaseError(String),
    IoError(String),
    NotFound(String),
    RateLimited { retry_after_secs: i64 },
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::EmptyInput => write!(f, "Empty input: no non-blank lines to parse"),
            AppError::UnrecognizedLabel(msg) => write!(f, "Unrecognized label: {}", msg),
            AppError::ContentTooShort(msg) => write!(f, "Content too short: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::RateLimited { retry_after_secs } => {
                write!(f, "Rate limited: retry after {}s", retry_after_secs)
            }
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

// Implement std::error::Error so the error composes with boxed error chains
impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
