//! Error types for the hexsge library

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HexSgeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Compression error: {0}")]
    Compression(String),

    #[error("Sparse matrix error: {0}")]
    SparseMatrix(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Missing column '{column}' in {path}")]
    MissingColumn { column: String, path: String },

    #[error("Threshold validation error: {field} must be between {min} and {max}, got {value}")]
    ThresholdValidation {
        field: String,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, HexSgeError>;

impl From<nalgebra_sparse::SparseFormatError> for HexSgeError {
    fn from(err: nalgebra_sparse::SparseFormatError) -> Self {
        HexSgeError::SparseMatrix(format!("Sparse format error: {:?}", err))
    }
}

impl From<gzp::GzpError> for HexSgeError {
    fn from(err: gzp::GzpError) -> Self {
        HexSgeError::Compression(err.to_string())
    }
}

impl From<tempfile::PersistError> for HexSgeError {
    fn from(err: tempfile::PersistError) -> Self {
        HexSgeError::Io(err.error)
    }
}
