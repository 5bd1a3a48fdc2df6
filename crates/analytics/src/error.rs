use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Cannot analyze an empty series")]
    EmptyInput,

    #[error("Not enough data for {analysis}: at least {required} points are required, got {actual}")]
    InsufficientData {
        analysis: &'static str,
        required: usize,
        actual: usize,
    },

    #[error("Series contains a non-finite value at index {index}")]
    NonFiniteInput { index: usize },

    #[error("{0} is undefined for a series with zero variance")]
    DegenerateInput(&'static str),

    #[error("Invalid option: {0}")]
    InvalidOption(String),
}
