use crate::error::ApiError;
use crate::responses::{ApiEnvelope, ApiErrorResponse};
use analytics::AnalysisResult;
use async_trait::async_trait;
use configuration::RemoteConfig;
use core_types::AnalysisRequest;
use reqwest::Url;
use serde::de::DeserializeOwned;

pub mod error;
pub mod responses;

/// The abstract interface for the remote analysis backend.
/// This trait is the contract the dispatcher and the remote data source use,
/// allowing the underlying implementation (HTTP or a test stub) to be swapped out.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Runs one analysis on the backend.
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, ApiError>;

    /// Fetches the sample series registered under `source_id`.
    async fn fetch_series(&self, source_id: &str) -> Result<Vec<f64>, ApiError>;
}

/// A concrete implementation of the `ApiClient` over HTTP+JSON.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base: Url,
    base_url: String,
}

impl BackendClient {
    /// Builds a client whose every call is bounded by `config.timeout`.
    pub fn new(config: &RemoteConfig) -> Result<Self, ApiError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let base = Url::parse(&base_url).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(format!("{base_url} cannot be a base URL")));
        }

        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Appends `segments` to the base URL path. Each segment is
    /// percent-encoded, so `/`, `?` and `#` stay inside it.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        if let Some(bad) = segments.iter().find(|s| matches!(**s, "" | "." | "..")) {
            return Err(ApiError::InvalidUrl(format!("invalid path segment {bad:?}")));
        }
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Reads the body and decodes it as `T`, turning non-2xx answers into
    /// `ApiError::Status` with the most specific message available.
    async fn read_json<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str::<T>(&text).map_err(|e| ApiError::Deserialization(e.to_string()))
        } else {
            let message = serde_json::from_str::<ApiErrorResponse>(&text)
                .ok()
                .and_then(|body| body.error.or(body.message))
                .unwrap_or(text);
            Err(ApiError::Status(status.as_u16(), message))
        }
    }
}

#[async_trait]
impl ApiClient for BackendClient {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, ApiError> {
        let url = self.endpoint(&["api", "analysis", "analyze"])?;
        tracing::debug!(%url, analysis = %request.analysis_type(), points = request.series().len(), "Sending remote analysis request.");

        let response = self.client.post(url).json(request).send().await?;
        self.read_json::<AnalysisResult>(response).await
    }

    async fn fetch_series(&self, source_id: &str) -> Result<Vec<f64>, ApiError> {
        let url = self.endpoint(&["api", "data", source_id])?;
        tracing::debug!(%url, "Fetching series from the backend.");

        let response = self.client.get(url).send().await?;
        let envelope: ApiEnvelope<Vec<f64>> = self.read_json(response).await?;
        envelope.into_data().map_err(ApiError::Rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{AnalysisKind, ResultSource};
    use std::time::Duration;

    fn client_for(server: &mockito::ServerGuard) -> BackendClient {
        BackendClient::new(&RemoteConfig {
            enabled: true,
            base_url: server.url(),
            timeout: Duration::from_secs(2),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn analyze_posts_the_wire_request_and_decodes_the_result() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/analysis/analyze")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"data": [1.0, 2.0, 3.0], "analysisType": "trend"}"#.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "success": true,
                    "analysisType": "trend",
                    "result": {
                        "slope": 1.0, "intercept": 1.0, "rSquared": 1.0,
                        "direction": "increasing", "changeRate": 200.0,
                        "confidence": "high", "prediction": [4.0, 5.0, 6.0, 7.0, 8.0]
                    },
                    "timestamp": "2024-05-01T12:00:00Z"
                }"#,
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let request = AnalysisRequest::new(vec![1.0, 2.0, 3.0], AnalysisKind::Trend);
        let result = client.analyze(&request).await.unwrap();

        mock.assert_async().await;
        assert!(result.is_success());
        assert_eq!(result.source(), ResultSource::Remote);
        let trend = result.payload().and_then(|p| p.as_trend()).unwrap();
        assert_eq!(trend.slope, 1.0);
    }

    #[tokio::test]
    async fn non_success_status_maps_to_status_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/analysis/analyze")
            .with_status(503)
            .with_body(r#"{"success": false, "error": "maintenance"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let request = AnalysisRequest::new(vec![1.0], AnalysisKind::Statistical);
        let err = client.analyze(&request).await.unwrap_err();

        assert!(matches!(err, ApiError::Status(503, ref msg) if msg == "maintenance"));
    }

    #[tokio::test]
    async fn malformed_body_maps_to_deserialization_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/analysis/analyze")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = client_for(&server);
        let request = AnalysisRequest::new(vec![1.0], AnalysisKind::Statistical);
        assert!(matches!(
            client.analyze(&request).await,
            Err(ApiError::Deserialization(_))
        ));
    }

    #[tokio::test]
    async fn fetch_series_unwraps_the_envelope() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/data/sensor-7")
            .with_status(200)
            .with_body(r#"{"success": true, "data": [4.0, 5.5, 6.0]}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/api/data/missing")
            .with_status(200)
            .with_body(r#"{"success": false, "error": "unknown source"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        assert_eq!(client.fetch_series("sensor-7").await.unwrap(), vec![4.0, 5.5, 6.0]);
        assert!(matches!(
            client.fetch_series("missing").await,
            Err(ApiError::Rejected(msg)) if msg == "unknown source"
        ));
    }

    #[tokio::test]
    async fn source_id_is_sent_as_a_single_path_segment() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/data/plant%2F3%3Fline=a%23b")
            .with_status(200)
            .with_body(r#"{"success": true, "data": [1.0]}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        assert_eq!(client.fetch_series("plant/3?line=a#b").await.unwrap(), vec![1.0]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn dot_segments_are_refused_before_any_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let client = client_for(&server);
        for id in ["..", ".", ""] {
            assert!(matches!(
                client.fetch_series(id).await,
                Err(ApiError::InvalidUrl(_))
            ));
        }
        mock.assert_async().await;
    }

    #[test]
    fn base_url_keeps_its_path_prefix() {
        let client = BackendClient::new(&RemoteConfig {
            enabled: true,
            base_url: "http://localhost:5000/backend/".to_string(),
            timeout: Duration::from_secs(1),
        })
        .unwrap();
        let url = client.endpoint(&["api", "data", "a b"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/backend/api/data/a%20b");
    }

    #[test]
    fn unparsable_base_url_is_rejected() {
        let err = BackendClient::new(&RemoteConfig {
            enabled: true,
            base_url: "not a url".to_string(),
            timeout: Duration::from_secs(1),
        })
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl(_)));
    }

    #[test]
    fn trailing_slash_is_trimmed_from_the_base_url() {
        let client = BackendClient::new(&RemoteConfig {
            enabled: true,
            base_url: "http://localhost:5000/".to_string(),
            timeout: Duration::from_secs(1),
        })
        .unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000");
    }
}
