//! # Price Forecast Workspace
//!
//! Next-day close forecasting and walk-forward backtesting for a single
//! daily price series. The engine lives in [`forecast_trade`], the numeric
//! primitives in [`trade_math`].
//!
//! ## Example
//!
//! ```
//! use chrono::{Duration, NaiveDate};
//! use price_forecast_workspace::{
//!     rank_models, run_backtest, PipelineConfig, PriceBar, PriceSeries,
//! };
//!
//! let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
//! let bars = (0..120)
//!     .map(|i| {
//!         let close = 100.0 + i as f64;
//!         PriceBar {
//!             date: start + Duration::days(i),
//!             open: close,
//!             high: close + 1.0,
//!             low: close - 1.0,
//!             close,
//!             adjusted_close: close,
//!             volume: 1_000.0,
//!         }
//!     })
//!     .collect();
//! let series = PriceSeries::new(bars).unwrap();
//!
//! let ranking = rank_models(&series, &PipelineConfig::default()).unwrap();
//! assert_eq!(ranking.winner().unwrap().name, "arima(5,1,0)");
//!
//! // 120 days is shorter than a trading year, every step is skipped
//! let report = run_backtest(&series, 30, 252).unwrap();
//! assert!(report.records.is_empty());
//! ```

pub use forecast_trade;
pub use trade_math;

pub use forecast_trade::{
    rank_models, run_backtest, run_backtest_with, run_forecast, BacktestReport, Confidence,
    ForecastError, ForecastPipeline, ModelRanking, PipelineConfig, Prediction, PredictionStore,
    PriceBar, PriceSeries, Trend,
};
