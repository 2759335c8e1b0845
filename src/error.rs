use thiserror::Error;

#[derive(Error, Debug)]
pub enum FastLegendError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP Error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Phrase Corpus Error: {0}")]
    Corpus(String),

    #[error("Data Validation Error: {0}")]
    Validation(String),
}

pub type FlResult<T> = Result<T, FastLegendError>;
