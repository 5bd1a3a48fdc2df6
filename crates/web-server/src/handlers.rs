use crate::{error::AppError, AppState};
use analytics::AnalysisResult;
use analyzer::{export_data, ExportFormat, Report, ReportConfig};
use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use core_types::AnalysisRequest;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// # GET /api/health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// # POST /api/analysis/analyze
/// Always answers 200 with a result; a failed analysis is `success: false`.
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<AnalysisResult>, AppError> {
    let request: AnalysisRequest =
        serde_json::from_value(body).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let result = state.dispatcher.analyze(&request).await;
    Ok(Json(result))
}

/// # POST /api/reports
pub async fn generate_report(
    State(state): State<Arc<AppState>>,
    Json(config): Json<ReportConfig>,
) -> Result<Json<Report>, AppError> {
    let report = state.assembler.generate_report(config).await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub data: Value,
    pub format: String,
}

/// # POST /api/export
/// Answers with the exported document as an attachment.
pub async fn export(Json(request): Json<ExportRequest>) -> Result<Response, AppError> {
    let format: ExportFormat = request.format.parse()?;
    let exported = export_data(&request.data, format)?;
    let disposition = format!("attachment; filename=\"export.{}\"", exported.file_extension);

    Ok((
        [
            (header::CONTENT_TYPE, exported.media_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        exported.body,
    )
        .into_response())
}

#[derive(Debug, Serialize)]
pub struct SeriesResponse {
    pub success: bool,
    pub data: Vec<f64>,
}

/// # GET /api/data/:source_id
pub async fn get_series(
    Path(source_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<SeriesResponse>, AppError> {
    let data = state.source.fetch_series(&source_id).await?;
    Ok(Json(SeriesResponse {
        success: true,
        data,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use analyzer::{DataSource, Dispatcher, InMemoryDataSource};
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use core_types::ResultSource;
    use serde_json::json;

    fn state() -> Arc<AppState> {
        let source: Arc<dyn DataSource> =
            Arc::new(InMemoryDataSource::new().with_series("ramp", vec![1.0, 2.0, 3.0, 4.0]));
        Arc::new(AppState::new(Dispatcher::local_only(), source))
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn analyze_runs_locally_and_echoes_the_type() {
        let Json(result) = analyze(
            State(state()),
            Json(json!({"data": [1, 2, 3, 4, 5], "analysisType": "statistical"})),
        )
        .await
        .unwrap();

        assert!(result.is_success());
        assert_eq!(result.source(), ResultSource::Local);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["analysisType"], json!("statistical"));
        assert_eq!(value["result"]["mean"], json!(3.0));
    }

    #[tokio::test]
    async fn analyze_reports_engine_failures_in_the_body() {
        let Json(result) = analyze(
            State(state()),
            Json(json!({"data": [], "analysisType": "trend"})),
        )
        .await
        .unwrap();

        assert!(!result.is_success());
        assert!(result.error().is_some());
    }

    #[tokio::test]
    async fn analyze_rejects_invalid_options() {
        let err = analyze(
            State(state()),
            Json(json!({"data": [1, 2], "analysisType": "frequency", "options": {"bins": 0}})),
        )
        .await
        .unwrap_err();

        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn analyze_rejects_oversized_histograms() {
        let err = analyze(
            State(state()),
            Json(json!({
                "data": [1, 2, 3],
                "analysisType": "frequency",
                "options": {"bins": 18446744073709551615u64}
            })),
        )
        .await
        .unwrap_err();

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("bins"));
    }

    #[tokio::test]
    async fn report_is_generated_from_the_configured_source() {
        let config: ReportConfig = serde_json::from_value(json!({
            "dataSource": "ramp",
            "analysisTypes": ["trend", "statistical"],
            "includeCharts": false
        }))
        .unwrap();
        let Json(report) = generate_report(State(state()), Json(config)).await.unwrap();

        assert_eq!(report.metadata.analysis_count, 2);
        assert!(report.charts.is_empty());
        assert!(report.summary.starts_with("The data shows an increasing trend"));
    }

    #[tokio::test]
    async fn unknown_source_is_not_found() {
        let err = get_series(Path("nope".to_string()), State(state()))
            .await
            .unwrap_err();
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn series_is_served_in_the_envelope() {
        let Json(series) = get_series(Path("ramp".to_string()), State(state()))
            .await
            .unwrap();
        let value = serde_json::to_value(&series).unwrap();
        assert_eq!(value, json!({"success": true, "data": [1.0, 2.0, 3.0, 4.0]}));
    }

    #[tokio::test]
    async fn export_sets_content_type_and_attachment_name() {
        let response = export(Json(ExportRequest {
            data: json!([{"a": 1}, {"a": 2}]),
            format: "excel".to_string(),
        }))
        .await
        .unwrap();

        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "application/vnd.ms-excel");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"export.xls\""
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"a\n1\n2\n");
    }

    #[tokio::test]
    async fn export_rejects_unknown_formats() {
        let err = export(Json(ExportRequest {
            data: json!([]),
            format: "pdf".to_string(),
        }))
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
