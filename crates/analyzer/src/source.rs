use crate::error::AnalyzerError;
use api_client::ApiClient;
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

/// Where a report's series comes from.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch_series(&self, source_id: &str) -> Result<Vec<f64>, AnalyzerError>;
}

/// Series held in memory, keyed by source id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataSource {
    series: HashMap<String, Vec<f64>>,
}

impl InMemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, source_id: impl Into<String>, values: Vec<f64>) -> Self {
        self.series.insert(source_id.into(), values);
        self
    }
}

#[async_trait]
impl DataSource for InMemoryDataSource {
    async fn fetch_series(&self, source_id: &str) -> Result<Vec<f64>, AnalyzerError> {
        self.series
            .get(source_id)
            .cloned()
            .ok_or_else(|| AnalyzerError::SourceNotFound(source_id.to_string()))
    }
}

/// Reads `{data_dir}/{source_id}.csv`.
#[derive(Debug, Clone)]
pub struct FileDataSource {
    data_dir: PathBuf,
}

impl FileDataSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn path_for(&self, source_id: &str) -> Result<PathBuf, AnalyzerError> {
        let valid = !source_id.is_empty()
            && source_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !source_id.starts_with('.');
        if !valid {
            return Err(AnalyzerError::InvalidSourceId(source_id.to_string()));
        }
        Ok(self.data_dir.join(format!("{source_id}.csv")))
    }
}

#[async_trait]
impl DataSource for FileDataSource {
    async fn fetch_series(&self, source_id: &str) -> Result<Vec<f64>, AnalyzerError> {
        let path = self.path_for(source_id)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AnalyzerError::SourceNotFound(source_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let series = parse_series(bytes.as_slice())?;
        tracing::debug!(path = %path.display(), points = series.len(), "Loaded series from file.");
        Ok(series)
    }
}

/// Fetches series from the remote backend's data endpoint.
pub struct RemoteDataSource {
    client: Arc<dyn ApiClient>,
}

impl RemoteDataSource {
    pub fn new(client: Arc<dyn ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for RemoteDataSource {
    async fn fetch_series(&self, source_id: &str) -> Result<Vec<f64>, AnalyzerError> {
        Ok(self.client.fetch_series(source_id).await?)
    }
}

/// Parses CSV or one-value-per-line text, reading the first column.
///
/// Blank lines are skipped. A first row that does not parse as a number is
/// treated as a header; any later non-numeric row is an error.
pub fn parse_series<R: Read>(reader: R) -> Result<Vec<f64>, AnalyzerError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut series = Vec::new();
    let mut seen_row = false;
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let Some(field) = record.get(0).filter(|f| !f.is_empty()) else {
            continue;
        };
        match field.parse::<f64>() {
            Ok(value) => series.push(value),
            Err(_) if !seen_row => {
                tracing::debug!(header = field, "Skipping header row.");
            }
            Err(_) => {
                return Err(AnalyzerError::MalformedData {
                    row: row + 1,
                    value: field.to_string(),
                });
            }
        }
        seen_row = true;
    }
    Ok(series)
}
