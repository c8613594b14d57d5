//! Walk-forward replay of the forecast over a trailing window
//!
//! Every step trains a fresh model on the data available at the close of the
//! simulated day and predicts the following trading day, whose real close is
//! already known. Steps that cannot run are recorded and skipped.

use crate::config::BacktestConfig;
use crate::data::PriceSeries;
use crate::error::{ForecastError, Result};
use crate::models::arima::ArimaModel;
use crate::models::ForecastModel;
use crate::prediction::Prediction;
use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// A simulated day that produced no record
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedStep {
    pub date: NaiveDate,
    pub reason: String,
}

/// Output of a backtest run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BacktestReport {
    /// One annotated record per completed step, in date order
    pub records: Vec<Prediction>,
    pub skipped: Vec<SkippedStep>,
}

impl BacktestReport {
    /// Aggregate accuracy, `None` when no step completed
    pub fn summary(&self) -> Option<BacktestSummary> {
        BacktestSummary::from_records(&self.records)
    }
}

/// Aggregate accuracy of annotated predictions. Shares are percentages and
/// the `within_*` bands are strict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BacktestSummary {
    pub count: usize,
    pub mean_abs_error: f64,
    pub mean_abs_pct_error: f64,
    pub mean_model_mape: f64,
    pub within_1_pct: f64,
    pub within_2_pct: f64,
    /// Share of predictions whose trend matched the realised trend
    pub trend_accuracy: f64,
}

impl BacktestSummary {
    /// Summarise the records that carry a real price
    pub fn from_records(records: &[Prediction]) -> Option<Self> {
        let annotated: Vec<&Prediction> = records
            .iter()
            .filter(|p| p.error_abs.is_some() && p.error_pct.is_some())
            .collect();
        if annotated.is_empty() {
            return None;
        }

        let n = annotated.len() as f64;
        let mean = |f: &dyn Fn(&Prediction) -> f64| {
            annotated.iter().map(|&p| f(p)).sum::<f64>() / n
        };
        let share = |f: &dyn Fn(&Prediction) -> bool| {
            annotated.iter().filter(|&&p| f(p)).count() as f64 / n * 100.0
        };
        let abs_pct = |p: &Prediction| p.error_pct.map_or(0.0, f64::abs);

        Some(Self {
            count: annotated.len(),
            mean_abs_error: mean(&|p| p.error_abs.map_or(0.0, f64::abs)),
            mean_abs_pct_error: mean(&abs_pct),
            mean_model_mape: mean(&|p| p.model_mape),
            within_1_pct: share(&|p| abs_pct(p) < 1.0),
            within_2_pct: share(&|p| abs_pct(p) < 2.0),
            trend_accuracy: share(&|p| p.realised_trend() == Some(p.trend)),
        })
    }
}

/// Replays the ARIMA fit and forecast day by day
#[derive(Debug, Clone, Default)]
pub struct BacktestEngine {
    config: BacktestConfig,
}

impl BacktestEngine {
    pub fn new(config: BacktestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Run over the trailing `window_days` calendar days of `series`
    pub fn run(&self, series: &PriceSeries) -> Result<BacktestReport> {
        let bars = series.bars();
        let last = series.last().ok_or_else(|| {
            ForecastError::EmptyInput("cannot backtest an empty series".to_string())
        })?;

        // windows reaching before the calendar's range cover the whole series
        let start = last
            .date
            .checked_sub_signed(Duration::days(i64::from(self.config.window_days)))
            .unwrap_or(bars[0].date);
        let first_in_window = bars.partition_point(|b| b.date < start);
        let closes = series.closes();

        info!(
            start = %start,
            end = %last.date,
            days = bars.len() - first_in_window,
            min_train_days = self.config.min_train_days,
            "starting backtest"
        );

        let mut report = BacktestReport::default();
        for i in first_in_window..bars.len().saturating_sub(1) {
            let today = &bars[i];
            let tomorrow = &bars[i + 1];
            let training = &closes[..=i];

            match self.step(training, today.date, tomorrow.date, tomorrow.close) {
                Ok(record) => {
                    debug!(
                        date = %today.date,
                        predicted = record.predicted_price,
                        real = tomorrow.close,
                        "backtest step"
                    );
                    report.records.push(record);
                }
                Err(err) if err.is_recoverable() => {
                    warn!(date = %today.date, reason = %err, "skipping backtest step");
                    report.skipped.push(SkippedStep {
                        date: today.date,
                        reason: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }

        match report.summary() {
            Some(s) => info!(
                records = s.count,
                skipped = report.skipped.len(),
                mean_abs_pct_error = s.mean_abs_pct_error,
                trend_accuracy = s.trend_accuracy,
                "backtest finished"
            ),
            None => info!(skipped = report.skipped.len(), "backtest produced no records"),
        }

        Ok(report)
    }

    fn step(
        &self,
        training: &[f64],
        today: NaiveDate,
        target: NaiveDate,
        real_close: f64,
    ) -> Result<Prediction> {
        if training.len() < self.config.min_train_days {
            return Err(ForecastError::InsufficientHistory {
                context: format!("backtest step {}", today),
                required: self.config.min_train_days,
                available: training.len(),
            });
        }

        let mut model = ArimaModel::new(self.config.order)?;
        model.fit(training)?;
        // forecasts from the fit above without solving again
        let predicted = model.predict_next()?;
        let mape = self.step_mape(training)?;

        let current = training[training.len() - 1];
        let mut record = Prediction::new(
            today.and_time(NaiveTime::MIN),
            target,
            current,
            predicted,
            model.name(),
            mape,
        )?;
        record.annotate(real_close);
        Ok(record)
    }

    /// MAPE of a walk-forward run over the last part of the training slice
    fn step_mape(&self, training: &[f64]) -> Result<f64> {
        let test_size = (training.len() as f64 * self.config.evaluation_ratio) as usize;
        if test_size == 0 {
            return Err(ForecastError::InsufficientHistory {
                context: "per-step evaluation".to_string(),
                required: (1.0 / self.config.evaluation_ratio).ceil() as usize,
                available: training.len(),
            });
        }

        let (fit_part, test_part) = training.split_at(training.len() - test_size);
        let mut model = ArimaModel::new(self.config.order)?;
        model.fit(fit_part)?;
        Ok(model.evaluate(test_part)?.metrics.mape)
    }
}
