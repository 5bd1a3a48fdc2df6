use analyzer::{AnalyzerError, ExportError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Analyzer error: {0}")]
    Analyzer(#[from] AnalyzerError),
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::Analyzer(AnalyzerError::SourceNotFound(_)) => {
                (StatusCode::NOT_FOUND, self.inner_message())
            }
            AppError::Analyzer(
                AnalyzerError::InvalidSourceId(_) | AnalyzerError::InvalidRequest(_),
            ) => (StatusCode::BAD_REQUEST, self.inner_message()),
            AppError::Analyzer(AnalyzerError::RemoteUnavailable(err)) => {
                tracing::error!(error = ?err, "Remote data source error.");
                (
                    StatusCode::BAD_GATEWAY,
                    "The remote data source is unavailable".to_string(),
                )
            }
            AppError::Analyzer(analyzer_err) => {
                tracing::error!(error = ?analyzer_err, "Analyzer error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An error occurred while reading the data".to_string(),
                )
            }
            AppError::Export(ExportError::UnsupportedFormat(_)) => {
                (StatusCode::BAD_REQUEST, self.inner_message())
            }
            AppError::Export(export_err) => {
                tracing::error!(error = ?export_err, "Export error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An error occurred during export".to_string(),
                )
            }
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
        }
    }

    fn inner_message(&self) -> String {
        match self {
            AppError::Analyzer(e) => e.to_string(),
            AppError::Export(e) => e.to_string(),
            AppError::BadRequest(message) => message.clone(),
        }
    }
}

/// Converts our custom `AppError` into an HTTP response.
///
/// The body uses the same `{success, error}` envelope the data endpoint
/// answers with, so a remote client can read either.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = self.status_and_message();
        let body = Json(json!({ "success": false, "error": error_message }));
        (status, body).into_response()
    }
}
