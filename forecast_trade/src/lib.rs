//! # Forecast Trade
//!
//! Next-day close forecasting for a single daily OHLCV series.
//!
//! ## Features
//!
//! - Cleaning of raw daily tables with calendar attributes ([`preprocess`])
//! - Lag, rolling mean, volatility, momentum and range features ([`features`])
//! - Moving average, ARIMA and weighted hybrid models behind one
//!   [`ForecastModel`] trait ([`models`])
//! - Model ranking by held-out MAPE ([`selector`])
//! - Forward forecast with trend and confidence labels ([`forecaster`])
//! - Walk-forward backtesting over a trailing window ([`backtest`])
//! - Append-only prediction history in memory or CSV ([`prediction`])
//!
//! ## Quick Start
//!
//! ```no_run
//! use forecast_trade::config::PipelineConfig;
//! use forecast_trade::pipeline::ForecastPipeline;
//! use forecast_trade::prediction::InMemoryPredictionStore;
//!
//! # fn main() -> forecast_trade::error::Result<()> {
//! let pipeline = ForecastPipeline::from_csv("prices.csv", PipelineConfig::default())?;
//!
//! let mut store = InMemoryPredictionStore::new();
//! let forecast = pipeline.forecast(&mut store)?;
//! println!(
//!     "{} -> {:.2} ({:?}, {:?})",
//!     forecast.prediction.target_date,
//!     forecast.prediction.predicted_price,
//!     forecast.prediction.trend,
//!     forecast.confidence,
//! );
//!
//! let report = pipeline.backtest()?;
//! if let Some(summary) = report.summary() {
//!     println!("trend accuracy {:.1}%", summary.trend_accuracy);
//! }
//! # Ok(())
//! # }
//! ```

pub mod backtest;
pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod forecaster;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod prediction;
pub mod preprocess;
pub mod selector;

// Re-export commonly used types
pub use crate::backtest::{BacktestEngine, BacktestReport, BacktestSummary, SkippedStep};
pub use crate::config::{BacktestConfig, FeatureConfig, PipelineConfig};
pub use crate::data::{DataLoader, PriceBar, PriceSeries, RawBar};
pub use crate::error::{ForecastError, Result};
pub use crate::features::{FeatureBuilder, FeatureTable};
pub use crate::forecaster::{Confidence, Forecast, Forecaster, Outlook};
pub use crate::metrics::ModelMetrics;
pub use crate::models::{ForecastModel, ModelSpec};
pub use crate::pipeline::{
    rank_models, run_backtest, run_backtest_with, run_forecast, ForecastPipeline,
};
pub use crate::prediction::{
    CsvPredictionStore, InMemoryPredictionStore, Prediction, PredictionStore, Trend,
};
pub use crate::preprocess::Preprocessor;
pub use crate::selector::{ModelRanking, ModelSelector};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
