use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Failed to build or send the HTTP request: {0}")]
    Request(#[from] reqwest::Error),

    #[error("The backend answered with HTTP {0}: {1}")]
    Status(u16, String),

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("The backend rejected the request: {0}")]
    Rejected(String),

    #[error("Cannot build a backend URL: {0}")]
    InvalidUrl(String),
}
