use crate::dispatcher::Dispatcher;
use crate::error::AnalyzerError;
use crate::source::DataSource;
use analytics::{AnalysisPayload, HistogramBin, TrendDirection};
use chrono::{DateTime, Utc};
use core_types::{AnalysisKind, AnalysisOptions, AnalysisRequest, AnalysisType};
use futures::future::join_all;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::sync::Arc;
use uuid::Uuid;

pub const REPORT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format requested by the caller. Carried through verbatim; rendering
/// is left to whoever displays the report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Json,
    Html,
    Pdf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub data_source: String,
    pub analysis_types: Vec<AnalysisType>,
    #[serde(default)]
    pub format: ReportFormat,
    #[serde(default = "default_include_charts")]
    pub include_charts: bool,
}

fn default_include_charts() -> bool {
    true
}

impl ReportConfig {
    pub fn new(data_source: impl Into<String>, analysis_types: Vec<AnalysisType>) -> Self {
        Self {
            title: None,
            data_source: data_source.into(),
            analysis_types,
            format: ReportFormat::default(),
            include_charts: true,
        }
    }

    /// The requested kinds in request order, each at most once.
    pub fn requested_kinds(&self) -> Vec<AnalysisType> {
        let mut kinds: Vec<AnalysisType> = Vec::with_capacity(self.analysis_types.len());
        for kind in &self.analysis_types {
            if !kinds.contains(kind) {
                kinds.push(*kind);
            }
        }
        kinds
    }
}

/// Successful analyses keyed by kind, in the order they were requested.
///
/// Serializes as a JSON object whose keys keep that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analyses(Vec<(AnalysisType, AnalysisPayload)>);

impl Analyses {
    /// A new map with `payload` added under `kind`. An existing entry for the
    /// same kind is kept.
    pub fn with(mut self, kind: AnalysisType, payload: AnalysisPayload) -> Self {
        if self.get(kind).is_none() {
            self.0.push((kind, payload));
        }
        self
    }

    pub fn get(&self, kind: AnalysisType) -> Option<&AnalysisPayload> {
        self.0.iter().find(|(k, _)| *k == kind).map(|(_, p)| p)
    }

    pub fn kinds(&self) -> impl Iterator<Item = AnalysisType> + '_ {
        self.0.iter().map(|(k, _)| *k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (AnalysisType, &AnalysisPayload)> {
        self.0.iter().map(|(k, p)| (*k, p))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Analyses {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (kind, payload) in &self.0 {
            map.serialize_entry(kind.as_str(), payload)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: usize,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoxPlot {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Data for one chart; drawing it is up to the consumer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Chart {
    Line { title: String, data: Vec<ChartPoint> },
    Histogram { title: String, data: Vec<HistogramBin> },
    Boxplot { title: String, data: BoxPlot },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub report_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub data_points: usize,
    pub analysis_count: usize,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub config: ReportConfig,
    pub raw_data: Vec<f64>,
    pub analyses: Analyses,
    pub charts: Vec<Chart>,
    pub summary: String,
    pub metadata: ReportMetadata,
}

/// Runs every requested analysis over one data source and assembles the
/// results into a `Report`.
#[derive(Clone)]
pub struct ReportAssembler {
    dispatcher: Dispatcher,
    source: Arc<dyn DataSource>,
    options: AnalysisOptions,
}

impl ReportAssembler {
    pub fn new(dispatcher: Dispatcher, source: Arc<dyn DataSource>) -> Self {
        Self {
            dispatcher,
            source,
            options: AnalysisOptions::default(),
        }
    }

    /// Options (z threshold, bin count) applied to every kind that takes them.
    pub fn with_options(mut self, options: AnalysisOptions) -> Self {
        self.options = options;
        self
    }

    /// Fetching the series is the only step that can fail the whole report.
    /// Kinds whose analysis fails are left out of `analyses`.
    #[tracing::instrument(skip(self, config), fields(source = %config.data_source))]
    pub async fn generate_report(&self, config: ReportConfig) -> Result<Report, AnalyzerError> {
        let series = self.source.fetch_series(&config.data_source).await?;

        let requests = config
            .requested_kinds()
            .into_iter()
            .map(|kind| {
                AnalysisKind::from_parts(kind, &self.options)
                    .map(|kind| AnalysisRequest::new(series.clone(), kind))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let results = join_all(requests.iter().map(|r| self.dispatcher.analyze(r))).await;

        let analyses = results.into_iter().fold(Analyses::default(), |acc, result| {
            let kind = result.analysis_type();
            if let Some(error) = result.error() {
                tracing::warn!(analysis = %kind, error, "Analysis failed; leaving it out of the report.");
            }
            match result.into_payload() {
                Some(payload) => acc.with(kind, payload),
                None => acc,
            }
        });

        let charts = if config.include_charts {
            build_charts(&series, &analyses)
        } else {
            Vec::new()
        };
        let summary = summarize(&analyses);
        let metadata = ReportMetadata {
            report_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            data_points: series.len(),
            analysis_count: analyses.len(),
            version: REPORT_VERSION.to_string(),
        };

        tracing::info!(
            report_id = %metadata.report_id,
            data_points = metadata.data_points,
            analyses = metadata.analysis_count,
            "Report generated."
        );

        Ok(Report {
            config,
            raw_data: series,
            analyses,
            charts,
            summary,
            metadata,
        })
    }
}

/// A line chart of the raw series, plus a histogram when frequency analysis
/// succeeded and a box plot when statistical analysis succeeded.
pub fn build_charts(series: &[f64], analyses: &Analyses) -> Vec<Chart> {
    let mut charts = vec![Chart::Line {
        title: "Data trend".to_string(),
        data: series
            .iter()
            .enumerate()
            .map(|(x, &y)| ChartPoint { x, y })
            .collect(),
    }];

    if let Some(frequency) = analyses
        .get(AnalysisType::Frequency)
        .and_then(AnalysisPayload::as_frequency)
    {
        charts.push(Chart::Histogram {
            title: "Data distribution".to_string(),
            data: frequency.histogram.clone(),
        });
    }

    if let Some(stats) = analyses
        .get(AnalysisType::Statistical)
        .and_then(AnalysisPayload::as_statistical)
    {
        charts.push(Chart::Boxplot {
            title: "Statistical summary".to_string(),
            data: BoxPlot {
                min: stats.min,
                q1: stats.q1,
                median: stats.median,
                q3: stats.q3,
                max: stats.max,
            },
        });
    }

    charts
}

/// One fixed sentence per analysis present, in map order.
pub fn summarize(analyses: &Analyses) -> String {
    if analyses.is_empty() {
        return "No analysis results are available.".to_string();
    }

    analyses
        .iter()
        .map(|(_, payload)| sentence_for(payload))
        .collect::<Vec<_>>()
        .join(" ")
}

fn sentence_for(payload: &AnalysisPayload) -> String {
    match payload {
        AnalysisPayload::Statistical(stats) => format!(
            "The data contains {} observations with a mean of {:.2} and a standard deviation of {:.2}.",
            stats.count, stats.mean, stats.standard_deviation
        ),
        AnalysisPayload::Trend(trend) => {
            let article = match trend.direction {
                TrendDirection::Increasing => "an",
                TrendDirection::Decreasing | TrendDirection::Stable => "a",
            };
            match trend.change_rate {
                Some(rate) => format!(
                    "The data shows {article} {} trend with a change rate of {rate:.2}%.",
                    trend.direction
                ),
                None => format!(
                    "The data shows {article} {} trend; the change rate is unavailable because the first value is zero.",
                    trend.direction
                ),
            }
        }
        AnalysisPayload::Anomaly(report) => {
            let mut sentence = format!(
                "Detected {} anomalies, an anomaly rate of {:.2}%.",
                report.anomalies.len(),
                report.anomaly_rate
            );
            if let Some(severity) = report.max_severity() {
                sentence.push_str(&format!(" The most severe anomaly is rated {severity}."));
            }
            sentence
        }
        AnalysisPayload::Frequency(report) => format!(
            "Found {} unique values with a Shannon entropy of {:.2} bits.",
            report.unique_values, report.entropy
        ),
        AnalysisPayload::Basic(basic) => format!(
            "Data quality: {:.2}% complete, {:.2}% unique.",
            basic.data_quality.completeness, basic.data_quality.uniqueness
        ),
    }
}
