use analyzer::{
    DataSource, Dispatcher, FileDataSource, RemoteDataSource, ReportAssembler,
};
use api_client::BackendClient;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use configuration::{Config, DataSourceKind};
use core_types::AnalysisOptions;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer, ExposeHeaders},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub assembler: ReportAssembler,
    pub source: Arc<dyn DataSource>,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, source: Arc<dyn DataSource>) -> Self {
        let assembler = ReportAssembler::new(dispatcher.clone(), source.clone());
        Self {
            dispatcher,
            assembler,
            source,
        }
    }

    /// The server computes locally so that it can itself act as another
    /// instance's remote backend. Only the report data source may be remote.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let source: Arc<dyn DataSource> = match config.report.data_source {
            DataSourceKind::File => Arc::new(FileDataSource::new(&config.report.data_dir)),
            DataSourceKind::Remote => {
                let client = BackendClient::new(&config.remote)?;
                Arc::new(RemoteDataSource::new(Arc::new(client)))
            }
        };

        let state = Self::new(Dispatcher::local_only(), source);
        let options = AnalysisOptions {
            threshold: Some(config.analysis.z_threshold),
            bins: Some(config.analysis.histogram_bins),
        };
        Ok(Self {
            assembler: state.assembler.with_options(options),
            ..state
        })
    }
}

/// Builds the router with every route and middleware attached.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any())
        .expose_headers(ExposeHeaders::any());

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/analysis/analyze", post(handlers::analyze))
        .route("/api/reports", post(handlers::generate_report))
        .route("/api/export", post(handlers::export))
        .route("/api/data/:source_id", get(handlers::get_series))
        .with_state(state)
        .layer(cors)
        // This middleware will automatically log information about every incoming request.
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(1024 * 1024 * 50)) // Set a 50MB body limit
}

/// The main function to configure and run the web server.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    // Tracing is initialized by the binary that calls this.
    let app_state = Arc::new(AppState::from_config(config)?);
    let addr = config.server.addr;

    tracing::info!(
        %addr,
        data_source = ?config.report.data_source,
        "Web server started and listening on http://{}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(app_state)).await?;

    Ok(())
}
