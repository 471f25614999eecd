use thiserror::Error;

#[derive(Error, Debug)]
pub enum InsightError {
    #[error("Schema infeasible: {reason}")]
    SchemaInfeasible { reason: String, suggestion: String },

    #[error("No numeric metric available for aggregation")]
    MissingMetric,

    #[error("Unsupported aggregation: {0}")]
    UnsupportedAggregation(String),

    #[error("Invalid value for filter '{key}': {value}")]
    InvalidFilterValue { key: String, value: String },

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Excel error: {0}")]
    Excel(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Polars error: {0}")]
    Polars(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<duckdb::Error> for InsightError {
    fn from(err: duckdb::Error) -> Self {
        InsightError::Execution(err.to_string())
    }
}

impl From<polars::prelude::PolarsError> for InsightError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        InsightError::Polars(err.to_string())
    }
}

impl From<calamine::Error> for InsightError {
    fn from(err: calamine::Error) -> Self {
        InsightError::Excel(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, InsightError>;
