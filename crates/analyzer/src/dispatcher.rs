use crate::error::AnalyzerError;
use analytics::{AnalysisEngine, AnalysisResult};
use api_client::ApiClient;
use async_trait::async_trait;
use core_types::{AnalysisRequest, ResultSource};
use std::sync::Arc;

/// Reason recorded for the remote stage when no remote client is configured.
pub const REMOTE_DISABLED: &str = "remote path disabled";

/// One way of producing an `AnalysisResult` for a request.
///
/// An `Err` means "this path could not answer"; the dispatcher decides what
/// happens next.
#[async_trait]
pub trait AnalysisStrategy: Send + Sync {
    fn source(&self) -> ResultSource;

    async fn execute(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalyzerError>;
}

/// Delegates to the remote analysis backend.
pub struct RemoteStrategy {
    client: Arc<dyn ApiClient>,
}

impl RemoteStrategy {
    pub fn new(client: Arc<dyn ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AnalysisStrategy for RemoteStrategy {
    fn source(&self) -> ResultSource {
        ResultSource::Remote
    }

    /// A remote answer only counts when it succeeded and is about the kind
    /// that was asked for. Whatever the backend wrote in `source`, the result
    /// is attributed to the remote path.
    async fn execute(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalyzerError> {
        let result = self.client.analyze(request).await?;

        if result.analysis_type() != request.analysis_type() {
            return Err(AnalyzerError::RemoteRejected(format!(
                "asked for {} but received {}",
                request.analysis_type(),
                result.analysis_type()
            )));
        }
        if !result.is_success() {
            return Err(AnalyzerError::RemoteRejected(
                result
                    .error()
                    .unwrap_or("remote analysis reported failure")
                    .to_string(),
            ));
        }

        Ok(result.attributed_to(ResultSource::Remote))
    }
}

/// Runs the in-process engines.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStrategy {
    engine: AnalysisEngine,
}

impl LocalStrategy {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AnalysisStrategy for LocalStrategy {
    fn source(&self) -> ResultSource {
        ResultSource::Local
    }

    async fn execute(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalyzerError> {
        let payload = self.engine.run(request)?;
        Ok(AnalysisResult::success(payload, ResultSource::Local))
    }
}

/// The stages a single dispatch moves through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchState {
    Pending,
    RemoteAttempted,
    RemoteSucceeded,
    RemoteFailed { reason: String },
    LocalComputed,
    Done,
}

/// The result of one dispatch together with the states it went through.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub result: AnalysisResult,
    pub transitions: Vec<DispatchState>,
}

/// Routes each request to the remote path first and to the local engines
/// when the remote path cannot answer.
///
/// Cheap to clone; both strategies are shared.
#[derive(Clone)]
pub struct Dispatcher {
    remote: Option<Arc<dyn AnalysisStrategy>>,
    local: Arc<dyn AnalysisStrategy>,
}

impl Dispatcher {
    /// A dispatcher that tries `client` first when one is given.
    pub fn new(client: Option<Arc<dyn ApiClient>>) -> Self {
        let remote = client.map(|c| Arc::new(RemoteStrategy::new(c)) as Arc<dyn AnalysisStrategy>);
        Self::with_strategies(remote, Arc::new(LocalStrategy::new()))
    }

    /// A dispatcher that always computes in-process.
    pub fn local_only() -> Self {
        Self::new(None)
    }

    pub fn with_strategies(
        remote: Option<Arc<dyn AnalysisStrategy>>,
        local: Arc<dyn AnalysisStrategy>,
    ) -> Self {
        Self { remote, local }
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Produces a terminal result for `request`. Never fails: engine errors
    /// come back as `success = false` results.
    pub async fn analyze(&self, request: &AnalysisRequest) -> AnalysisResult {
        self.dispatch(request).await.result
    }

    #[tracing::instrument(skip(self, request), fields(analysis = %request.analysis_type(), points = request.series().len()))]
    pub async fn dispatch(&self, request: &AnalysisRequest) -> DispatchOutcome {
        let mut state = DispatchState::Pending;
        let mut transitions = vec![state.clone()];
        let mut result: Option<AnalysisResult> = None;

        loop {
            state = match state {
                DispatchState::Pending => DispatchState::RemoteAttempted,
                DispatchState::RemoteAttempted => match &self.remote {
                    None => DispatchState::RemoteFailed {
                        reason: REMOTE_DISABLED.to_string(),
                    },
                    Some(remote) => match remote.execute(request).await {
                        Ok(remote_result) => {
                            result = Some(remote_result);
                            DispatchState::RemoteSucceeded
                        }
                        Err(e) => DispatchState::RemoteFailed {
                            reason: e.to_string(),
                        },
                    },
                },
                DispatchState::RemoteSucceeded => DispatchState::Done,
                DispatchState::RemoteFailed { ref reason } => {
                    if self.remote.is_some() {
                        tracing::warn!(%reason, "Remote analysis failed, falling back to local engines.");
                    }
                    let local_result = match self.local.execute(request).await {
                        Ok(local_result) => local_result,
                        Err(e) => AnalysisResult::failure(
                            request.analysis_type(),
                            e.to_string(),
                            self.local.source(),
                        ),
                    };
                    result = Some(local_result);
                    DispatchState::LocalComputed
                }
                DispatchState::LocalComputed => DispatchState::Done,
                DispatchState::Done => break,
            };
            tracing::debug!(state = ?state, "Dispatch transition.");
            transitions.push(state.clone());
        }

        let result = result.unwrap_or_else(|| {
            AnalysisResult::failure(
                request.analysis_type(),
                "dispatch finished without a result",
                ResultSource::Local,
            )
        });
        DispatchOutcome { result, transitions }
    }
}
