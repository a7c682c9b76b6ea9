use thiserror::Error;

#[derive(Error, Debug)]
pub enum CastError {
    #[error("Attribute '{column}' must be an instance of {expected}")]
    TypeMismatch { column: String, expected: &'static str },
    #[error("Parse error in {value_type}: {message}")]
    Parse { value_type: &'static str, message: String },
    #[error("Unknown field '{field}' for {value_type}")]
    UnknownField { value_type: &'static str, field: String },
    #[error("Invalid value for field '{field}': {message}")]
    InvalidField { field: String, message: String },
    #[error("Config error: {0}")]
    Config(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, CastError>;

// Helper conversions
impl From<rusqlite::Error> for CastError {
    fn from(e: rusqlite::Error) -> Self { Self::Persistence(e.to_string()) }
}
impl From<config::ConfigError> for CastError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
impl From<serde_json::Error> for CastError {
    fn from(e: serde_json::Error) -> Self { Self::Serialization(e.to_string()) }
}
