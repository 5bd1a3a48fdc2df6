use analytics::AnalysisResult;
use analyzer::{
    AnalyzerError, DispatchState, Dispatcher, InMemoryDataSource, ReportAssembler, ReportConfig,
};
use api_client::ApiClient;
use api_client::error::ApiError;
use async_trait::async_trait;
use core_types::{AnalysisKind, AnalysisRequest, AnalysisType, ResultSource};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A backend that is always down.
struct UnreachableBackend {
    calls: AtomicUsize,
}

impl UnreachableBackend {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ApiClient for UnreachableBackend {
    async fn analyze(&self, _request: &AnalysisRequest) -> Result<AnalysisResult, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ApiError::Status(500, "backend exploded".to_string()))
    }

    async fn fetch_series(&self, _source_id: &str) -> Result<Vec<f64>, ApiError> {
        Err(ApiError::Status(500, "backend exploded".to_string()))
    }
}

/// A backend that answers every request with the same canned JSON body.
struct CannedBackend {
    body: serde_json::Value,
}

#[async_trait]
impl ApiClient for CannedBackend {
    async fn analyze(&self, _request: &AnalysisRequest) -> Result<AnalysisResult, ApiError> {
        serde_json::from_value(self.body.clone()).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    async fn fetch_series(&self, _source_id: &str) -> Result<Vec<f64>, ApiError> {
        Ok(vec![])
    }
}

fn with_backend(client: impl ApiClient + 'static) -> Dispatcher {
    Dispatcher::new(Some(Arc::new(client)))
}

fn one_to_five(kind: AnalysisKind) -> AnalysisRequest {
    AnalysisRequest::new(vec![1.0, 2.0, 3.0, 4.0, 5.0], kind)
}

#[tokio::test]
async fn failing_remote_falls_back_to_local_statistics() {
    let backend = Arc::new(UnreachableBackend::new());
    let dispatcher = Dispatcher::new(Some(backend.clone()));

    let outcome = dispatcher.dispatch(&one_to_five(AnalysisKind::Statistical)).await;

    assert!(outcome.result.is_success());
    assert_eq!(outcome.result.source(), ResultSource::Local);
    let stats = outcome.result.payload().and_then(|p| p.as_statistical()).unwrap();
    assert_eq!(stats.mean, 3.0);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    assert!(outcome.transitions.iter().any(|state| matches!(
        state,
        DispatchState::RemoteFailed { reason } if reason.contains("backend exploded")
    )));
    assert_eq!(outcome.transitions.last(), Some(&DispatchState::Done));
}

#[tokio::test]
async fn empty_series_yields_a_failed_result() {
    let dispatcher = with_backend(UnreachableBackend::new());
    let request = AnalysisRequest::new(vec![], AnalysisKind::Statistical);

    let result = dispatcher.analyze(&request).await;

    assert!(!result.is_success());
    assert_eq!(result.source(), ResultSource::Local);
    assert_eq!(result.error(), Some("Cannot analyze an empty series"));
}

#[tokio::test]
async fn oversized_histogram_is_a_failed_result() {
    let request = AnalysisRequest::new(vec![1.0, 2.0, 3.0], AnalysisKind::Frequency { bins: usize::MAX });

    let result = Dispatcher::local_only().analyze(&request).await;

    assert!(!result.is_success());
    assert_eq!(result.analysis_type(), AnalysisType::Frequency);
    assert!(result.error().is_some_and(|e| e.contains("bins")));
}

#[tokio::test]
async fn remote_success_is_attributed_to_the_remote_path() {
    let dispatcher = with_backend(CannedBackend {
        body: json!({
            "success": true,
            "analysisType": "frequency",
            "source": "local",
            "result": {
                "distribution": [{"value": 7.0, "count": 1, "percentage": 100.0}],
                "histogram": [{"bin": 0, "range": [7.0, 7.0], "count": 1, "percentage": 100.0}],
                "uniqueValues": 1,
                "mostFrequent": {"value": 7.0, "count": 1, "percentage": 100.0},
                "entropy": 0.0
            }
        }),
    });

    let outcome = dispatcher.dispatch(&one_to_five(AnalysisKind::frequency())).await;

    assert!(outcome.result.is_success());
    assert_eq!(outcome.result.source(), ResultSource::Remote);
    // The canned remote answer, not a local recomputation over 1..5.
    assert_eq!(
        outcome.result.payload().and_then(|p| p.as_frequency()).map(|f| f.unique_values),
        Some(1)
    );
    assert!(outcome.transitions.contains(&DispatchState::RemoteSucceeded));
    assert!(!outcome.transitions.contains(&DispatchState::LocalComputed));
}

#[tokio::test]
async fn remote_reported_failure_triggers_fallback() {
    let dispatcher = with_backend(CannedBackend {
        body: json!({"success": false, "analysisType": "trend", "error": "model not loaded"}),
    });

    let result = dispatcher.analyze(&one_to_five(AnalysisKind::Trend)).await;

    assert!(result.is_success());
    assert_eq!(result.source(), ResultSource::Local);
    assert_eq!(result.payload().and_then(|p| p.as_trend()).map(|t| t.slope), Some(1.0));
}

#[tokio::test]
async fn remote_answer_for_another_kind_triggers_fallback() {
    // A well-formed, successful answer, but for a different analysis.
    let stats = analytics::compute_statistics(&[9.0, 9.0]).unwrap();
    let dispatcher = with_backend(CannedBackend {
        body: json!({
            "success": true,
            "analysisType": "statistical",
            "source": "remote",
            "result": serde_json::to_value(stats).unwrap()
        }),
    });

    let outcome = dispatcher.dispatch(&one_to_five(AnalysisKind::Basic)).await;

    assert!(outcome.transitions.iter().any(|state| matches!(
        state,
        DispatchState::RemoteFailed { reason } if reason.contains("asked for basic")
    )));
    assert!(!outcome.transitions.contains(&DispatchState::RemoteSucceeded));
    let result = outcome.result;
    assert!(result.is_success());
    assert_eq!(result.analysis_type(), AnalysisType::Basic);
    assert_eq!(result.source(), ResultSource::Local);
    let basic = result.payload().and_then(|p| p.as_basic()).unwrap();
    assert!(basic.trend.is_some());
    assert_eq!(basic.data_quality.completeness, 100.0);
}

#[tokio::test]
async fn report_omits_kinds_that_fail_on_a_single_point() {
    let source = InMemoryDataSource::new().with_series("single", vec![42.0]);
    let assembler = ReportAssembler::new(
        with_backend(UnreachableBackend::new()),
        Arc::new(source),
    );
    let config = ReportConfig::new("single", vec![AnalysisType::Statistical, AnalysisType::Trend]);

    let report = assembler.generate_report(config).await.unwrap();

    assert_eq!(report.analyses.kinds().collect::<Vec<_>>(), vec![AnalysisType::Statistical]);
    assert_eq!(report.metadata.analysis_count, 1);
    assert_eq!(report.metadata.data_points, 1);
    assert_eq!(
        report.summary,
        "The data contains 1 observations with a mean of 42.00 and a standard deviation of 0.00."
    );
    // Line chart plus the box plot for the statistical analysis.
    assert_eq!(report.charts.len(), 2);
}

#[tokio::test]
async fn report_keeps_request_order_and_honours_include_charts() {
    let series: Vec<f64> = (1..=20).map(f64::from).collect();
    let source = InMemoryDataSource::new().with_series("ramp", series);
    let assembler = ReportAssembler::new(Dispatcher::local_only(), Arc::new(source));
    let mut config = ReportConfig::new(
        "ramp",
        vec![
            AnalysisType::Frequency,
            AnalysisType::Anomaly,
            AnalysisType::Frequency,
            AnalysisType::Statistical,
        ],
    );
    config.include_charts = false;

    let report = assembler.generate_report(config).await.unwrap();

    assert_eq!(
        report.analyses.kinds().collect::<Vec<_>>(),
        vec![AnalysisType::Frequency, AnalysisType::Anomaly, AnalysisType::Statistical]
    );
    assert!(report.charts.is_empty());

    let value = serde_json::to_value(&report).unwrap();
    let keys: Vec<&String> = value["analyses"].as_object().unwrap().keys().collect();
    assert_eq!(keys, ["frequency", "anomaly", "statistical"]);
    assert_eq!(value["metadata"]["analysisCount"], json!(3));
    assert_eq!(value["rawData"].as_array().unwrap().len(), 20);
}

#[tokio::test]
async fn unknown_data_source_fails_the_report() {
    let assembler = ReportAssembler::new(
        Dispatcher::local_only(),
        Arc::new(InMemoryDataSource::new()),
    );
    let err = assembler
        .generate_report(ReportConfig::new("missing", vec![AnalysisType::Statistical]))
        .await
        .unwrap_err();

    assert!(matches!(err, AnalyzerError::SourceNotFound(id) if id == "missing"));
}

#[tokio::test]
async fn empty_source_produces_an_empty_report() {
    let source = InMemoryDataSource::new().with_series("blank", vec![]);
    let assembler = ReportAssembler::new(Dispatcher::local_only(), Arc::new(source));

    let report = assembler
        .generate_report(ReportConfig::new("blank", AnalysisType::ALL.to_vec()))
        .await
        .unwrap();

    assert!(report.analyses.is_empty());
    assert_eq!(report.summary, "No analysis results are available.");
}
