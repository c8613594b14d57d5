//! Pipeline configuration
//!
//! Every section has defaults, so an empty TOML document is a valid
//! configuration:
//!
//! ```toml
//! train_ratio = 0.8
//!
//! [features]
//! lags = [1, 2, 3, 5, 7]
//! ma_windows = [7, 14, 30, 60]
//!
//! [[models]]
//! kind = "moving_average"
//! window = 7
//!
//! [[models]]
//! kind = "arima"
//! p = 5
//! d = 1
//! q = 0
//!
//! [backtest]
//! window_days = 60
//! min_train_days = 252
//! ```

use crate::error::{ForecastError, Result};
use crate::models::arima::ArimaOrder;
use crate::models::ModelSpec;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Window sizes used by the feature builder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Lag offsets for `close_lag_{l}`
    pub lags: Vec<usize>,
    /// Windows for `close_MA_{w}`
    pub ma_windows: Vec<usize>,
    /// Windows for `close_volatility_{w}`
    pub volatility_windows: Vec<usize>,
    /// Periods for `close_momentum_{p}` and `close_roc_{p}`
    pub momentum_periods: Vec<usize>,
    /// Windows for `avg_range_{w}`
    pub range_windows: Vec<usize>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            lags: vec![1, 2, 3, 5, 7],
            ma_windows: vec![7, 14, 30, 60],
            volatility_windows: vec![7, 14, 30],
            momentum_periods: vec![5, 10, 20],
            range_windows: vec![7, 30],
        }
    }
}

impl FeatureConfig {
    /// Check every window is usable
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("lags", &self.lags),
            ("ma_windows", &self.ma_windows),
            ("momentum_periods", &self.momentum_periods),
            ("range_windows", &self.range_windows),
        ];
        for (name, values) in positive {
            if values.iter().any(|&v| v == 0) {
                return Err(ForecastError::InvalidParameter(format!(
                    "{} must be greater than zero",
                    name
                )));
            }
        }
        if self.volatility_windows.iter().any(|&w| w < 2) {
            return Err(ForecastError::InvalidParameter(
                "volatility_windows must be at least 2".to_string(),
            ));
        }
        Ok(())
    }

    /// Index of the first row that has full history for every feature
    pub fn first_complete_row(&self) -> usize {
        let shifts = self.lags.iter().chain(&self.momentum_periods).copied();
        let windows = self
            .ma_windows
            .iter()
            .chain(&self.volatility_windows)
            .chain(&self.range_windows)
            .map(|w| w.saturating_sub(1));

        shifts.chain(windows).max().unwrap_or(0)
    }
}

/// Walk-forward backtest settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Trailing calendar days replayed
    pub window_days: u32,
    /// Training rows required before a step is attempted
    pub min_train_days: usize,
    /// ARIMA order refitted at every step
    pub order: ArimaOrder,
    /// Share of each training slice used for the per-step MAPE
    pub evaluation_ratio: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            window_days: 60,
            min_train_days: 252,
            order: ArimaOrder::default(),
            evaluation_ratio: 0.2,
        }
    }
}

impl BacktestConfig {
    /// Check settings are usable
    pub fn validate(&self) -> Result<()> {
        if self.evaluation_ratio <= 0.0 || self.evaluation_ratio >= 1.0 {
            return Err(ForecastError::InvalidParameter(format!(
                "evaluation_ratio must be in (0, 1), got {}",
                self.evaluation_ratio
            )));
        }
        self.order.validate()
    }
}

/// Where persisted artifacts are written
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Sorted model comparison table
    pub model_comparison_path: Option<PathBuf>,
    /// Append-only prediction history
    pub prediction_history_path: Option<PathBuf>,
}

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub features: FeatureConfig,
    /// Candidate models, in tie-break order
    pub models: Vec<ModelSpec>,
    /// Chronological share of rows used for training
    pub train_ratio: f64,
    pub backtest: BacktestConfig,
    pub output: OutputConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            features: FeatureConfig::default(),
            models: vec![
                ModelSpec::MovingAverage { window: 7 },
                ModelSpec::Arima(ArimaOrder::default()),
            ],
            train_ratio: 0.8,
            backtest: BacktestConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.features.validate()?;
        self.backtest.validate()?;

        if self.models.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "at least one model must be configured".to_string(),
            ));
        }
        for spec in &self.models {
            spec.validate()?;
        }

        if self.train_ratio <= 0.0 || self.train_ratio >= 1.0 {
            return Err(ForecastError::InvalidParameter(format!(
                "train_ratio must be in (0, 1), got {}",
                self.train_ratio
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_document_yields_defaults() {
        let config = PipelineConfig::from_toml_str("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.backtest.min_train_days, 252);
        assert_eq!(config.models.len(), 2);
    }

    #[test]
    fn first_complete_row_uses_longest_window() {
        let features = FeatureConfig::default();
        // close_MA_60 needs 59 prior rows
        assert_eq!(features.first_complete_row(), 59);

        let features = FeatureConfig {
            lags: vec![10],
            ma_windows: vec![3],
            volatility_windows: vec![],
            momentum_periods: vec![],
            range_windows: vec![],
        };
        assert_eq!(features.first_complete_row(), 10);
    }

    #[test]
    fn parses_models_and_sections() {
        let text = r#"
            train_ratio = 0.75

            [features]
            lags = [1]
            ma_windows = [3]

            [[models]]
            kind = "arima"
            p = 2
            d = 1
            q = 0

            [backtest]
            window_days = 30
            min_train_days = 100
        "#;
        let config = PipelineConfig::from_toml_str(text).unwrap();

        assert_eq!(config.train_ratio, 0.75);
        assert_eq!(config.features.lags, vec![1]);
        assert_eq!(config.features.volatility_windows, vec![7, 14, 30]);
        assert_eq!(
            config.models,
            vec![ModelSpec::Arima(ArimaOrder { p: 2, d: 1, q: 0 })]
        );
        assert_eq!(config.backtest.window_days, 30);
        assert_eq!(config.backtest.evaluation_ratio, 0.2);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            PipelineConfig::from_toml_str("train_ratio = 1.5"),
            Err(ForecastError::InvalidParameter(_))
        ));
        assert!(matches!(
            PipelineConfig::from_toml_str("models = []"),
            Err(ForecastError::InvalidParameter(_))
        ));
        assert!(matches!(
            PipelineConfig::from_toml_str("[features]\nvolatility_windows = [1]"),
            Err(ForecastError::InvalidParameter(_))
        ));
        assert!(matches!(
            PipelineConfig::from_toml_str("train_ratio = \"high\""),
            Err(ForecastError::Config(_))
        ));
    }
}
