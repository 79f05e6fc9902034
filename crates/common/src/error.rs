use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("HTTP request failed: {0}")]
    HttpRequest(String),

    #[error("fetch of {url} returned status {status}")]
    Fetch { url: String, status: u16 },

    #[error("HTML parsing failed: {0}")]
    HtmlParse(String),

    #[error("store operation failed: {0}")]
    Store(String),

    #[error("configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<reqwest::Error> for IngestError {
    fn from(err: reqwest::Error) -> Self {
        IngestError::HttpRequest(err.to_string())
    }
}

pub type IngestResult<T> = Result<T, IngestError>;
