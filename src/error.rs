use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Row {row}: amount {value:?} is not a number")]
    InvalidAmount { row: usize, value: String },

    #[error("Row {row}: date {value:?} is not a recognized date")]
    InvalidDate { row: usize, value: String },

    #[error("Cluster count must be at least 1 (got {0})")]
    InvalidClusterCount(usize),

    #[error("Clustering failed: {0}")]
    Cluster(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, SpyError>;
