//! # Insight Analyzer
//!
//! The orchestration layer that sits between callers and the engines.
//!
//! ## Architectural Principles
//!
//! - **Remote first, local always:** `Dispatcher` asks the remote backend and
//!   falls back to the in-process engines on any remote failure. Callers get a
//!   terminal `AnalysisResult` either way.
//! - **Immutable outputs:** reports are assembled by folding finished results
//!   into new values; nothing is patched after construction.
//!
//! ## Public API
//!
//! - `Dispatcher::analyze`: analyse one request.
//! - `ReportAssembler::generate_report`: run several analyses over one data source.
//! - `export_data`: serialize any JSON document as CSV, JSON or Excel-flavoured CSV.
//! - `DataSource` and its adapters: where report series come from.

pub mod dispatcher;
pub mod error;
pub mod export;
pub mod report;
pub mod source;

pub use dispatcher::{
    AnalysisStrategy, DispatchOutcome, DispatchState, Dispatcher, LocalStrategy, RemoteStrategy,
};
pub use error::{AnalyzerError, ExportError};
pub use export::{export_data, ExportFormat, ExportedData};
pub use report::{Analyses, Chart, Report, ReportAssembler, ReportConfig, ReportFormat, ReportMetadata};
pub use source::{parse_series, DataSource, FileDataSource, InMemoryDataSource, RemoteDataSource};
