use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("database query failed: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("required column '{column}' missing from {input}")]
    MissingColumn { input: String, column: String },

    #[error("could not parse '{0}' as a month")]
    DateParse(String),

    #[error("duplicate (state, month) keys in {side} table: {keys:?}")]
    DuplicateKeys {
        side: &'static str,
        keys: Vec<String>,
    },

    #[error("missing dimension row: {0}")]
    MissingReference(String),

    #[error("unsupported input format: {0}")]
    UnsupportedFormat(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EtlError>;
