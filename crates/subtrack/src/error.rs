use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubtrackError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Sheet error: {0}")]
    Sheet(#[from] SheetError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Invalid pattern for field '{field}': {reason}")]
    InvalidPattern { field: String, reason: String },

    #[error("Invalid dataset '{kind}': {reason}")]
    InvalidDataset { kind: String, reason: String },
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("No spreadsheet registered for dataset '{0}'")]
    UnknownDataset(String),

    #[error("Failed to read spreadsheet '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode workbook: {0}")]
    Decode(String),
}

#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Workbook contains no sheets")]
    NoSheets,

    #[error("Worksheet '{0}' not found in workbook")]
    MissingSheet(String),

    #[error("Worksheet has no rows")]
    EmptySheet,

    #[error("No header row found within the first {scanned} rows")]
    HeaderNotFound { scanned: usize },
}

pub type Result<T> = std::result::Result<T, SubtrackError>;
