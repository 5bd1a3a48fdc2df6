use analytics::AnalyticsError;
use api_client::error::ApiError;
use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Remote analysis path is unavailable: {0}")]
    RemoteUnavailable(#[from] ApiError),

    #[error("Remote analysis result was not usable: {0}")]
    RemoteRejected(String),

    #[error(transparent)]
    Analysis(#[from] AnalyticsError),

    #[error("Invalid analysis request: {0}")]
    InvalidRequest(#[from] CoreError),

    #[error("No data found for source '{0}'")]
    SourceNotFound(String),

    #[error("Invalid data source id '{0}'")]
    InvalidSourceId(String),

    #[error("Failed to read series data: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse series data: {0}")]
    Csv(#[from] csv::Error),

    #[error("Row {row} does not hold a number: '{value}'")]
    MalformedData { row: usize, value: String },
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Exported CSV is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}
