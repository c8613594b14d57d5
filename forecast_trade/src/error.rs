//! Error types for the forecast_trade crate

use chrono::NaiveDate;
use polars::prelude::PolarsError;
use thiserror::Error;
use trade_math::MathError;

/// Custom error types for the forecast_trade crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// No usable rows remain after cleaning
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Fewer rows than a feature window or training minimum requires
    #[error("Insufficient history for {context}: need {required} rows, have {available}")]
    InsufficientHistory {
        context: String,
        required: usize,
        available: usize,
    },

    /// Model fitting raised a numeric error
    #[error("Fit failure in {model}: {message}")]
    FitFailure { model: String, message: String },

    /// A computation hit a zero denominator
    #[error("Division guard: {0}")]
    DivisionGuard(String),

    /// The input series itself is inconsistent
    #[error("Corrupt input on {date}: {reason}")]
    CorruptInput { date: NaiveDate, reason: String },

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error while reading configuration
    #[error("Config error: {0}")]
    Config(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error reading or writing CSV records
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error rendering JSON
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error from the numeric primitives
    #[error("Math error: {0}")]
    MathError(#[from] MathError),
}

impl ForecastError {
    /// Wrap a numeric error raised while fitting `model`
    pub fn fit_failure(model: impl Into<String>, err: impl std::fmt::Display) -> Self {
        ForecastError::FitFailure {
            model: model.into(),
            message: err.to_string(),
        }
    }

    /// Whether the error only invalidates a single step or candidate
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ForecastError::InsufficientHistory { .. }
                | ForecastError::FitFailure { .. }
                | ForecastError::DivisionGuard(_)
        )
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<toml::de::Error> for ForecastError {
    fn from(err: toml::de::Error) -> Self {
        ForecastError::Config(err.to_string())
    }
}
