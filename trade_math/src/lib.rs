//! # Trade Math
//!
//! Numeric primitives used by the forecasting engine.
//! This crate provides rolling window statistics over price series and the
//! least-squares machinery behind the autoregressive forecasting models.

use thiserror::Error;

// Indicator modules
pub mod autoregression;
pub mod moving_averages;
pub mod volatility;

/// Errors that can occur in trading-related calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("Singular system: {0}")]
    Singular(String),
}

/// Result type for trading math operations
pub type Result<T> = std::result::Result<T, MathError>;
