use crate::error::ExportError;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    /// CSV content labelled as an Excel document. Spreadsheet tools open it,
    /// but it is not a real workbook.
    Excel,
}

impl ExportFormat {
    pub fn media_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json",
            ExportFormat::Excel => "application/vnd.ms-excel",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Excel => "xls",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Csv => f.write_str("csv"),
            ExportFormat::Json => f.write_str("json"),
            ExportFormat::Excel => f.write_str("excel"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "excel" => Ok(ExportFormat::Excel),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// An exported document ready to be written to disk or sent over HTTP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedData {
    pub media_type: &'static str,
    pub file_extension: &'static str,
    pub body: String,
}

/// Serializes `data` in `format`.
pub fn export_data(data: &Value, format: ExportFormat) -> Result<ExportedData, ExportError> {
    let body = match format {
        ExportFormat::Json => serde_json::to_string_pretty(data)?,
        ExportFormat::Csv | ExportFormat::Excel => to_csv(data)?,
    };
    tracing::debug!(%format, bytes = body.len(), "Data exported.");

    Ok(ExportedData {
        media_type: format.media_type(),
        file_extension: format.file_extension(),
        body,
    })
}

/// Flattens a JSON document into CSV.
///
/// An array of objects takes its header from the first object's keys; later
/// objects leave missing keys empty. Any other array becomes a single `value`
/// column. A lone object is one row and a scalar is one cell.
fn to_csv(data: &Value) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    match data {
        Value::Array(items) => match items.first().and_then(Value::as_object) {
            Some(first) => {
                let headers: Vec<&String> = first.keys().collect();
                writer.write_record(&headers)?;
                for item in items {
                    let row: Vec<String> = headers
                        .iter()
                        .map(|key| item.get(key.as_str()).map(cell).unwrap_or_default())
                        .collect();
                    writer.write_record(&row)?;
                }
            }
            None => {
                writer.write_record(["value"])?;
                for item in items {
                    writer.write_record([cell(item)])?;
                }
            }
        },
        Value::Object(map) => {
            writer.write_record(map.keys())?;
            writer.write_record(map.values().map(cell))?;
        }
        scalar => writer.write_record([cell(scalar)])?,
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Csv(e.into_error().into()))?;
    Ok(String::from_utf8(bytes)?)
}

/// Strings are written bare; nested values as compact JSON.
fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
