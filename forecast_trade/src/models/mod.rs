//! Forecasting models for daily close prices
//!
//! Every model owns its own history buffer. `fit` seeds it from a training
//! slice, `predict_next` forecasts the step after the last observed value and
//! `observe` appends a revealed value. [`ForecastModel::evaluate`] chains the
//! last two into a walk-forward validation.

use crate::error::{ForecastError, Result};
use crate::metrics::ModelMetrics;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

pub mod arima;
pub mod hybrid;
pub mod moving_average;

use arima::{ArimaModel, ArimaOrder};
use hybrid::HybridModel;
use moving_average::MovingAverageModel;

/// Outcome of a walk-forward evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// One-step-ahead predictions, aligned with `actuals`
    pub predictions: Vec<f64>,
    /// Revealed test values
    pub actuals: Vec<f64>,
    pub metrics: ModelMetrics,
}

/// One-step-ahead forecast model
pub trait ForecastModel: Debug {
    /// Display name, e.g. `arima(5,1,0)`
    fn name(&self) -> String;

    /// Replace the history with `training` and fit on it
    fn fit(&mut self, training: &[f64]) -> Result<()>;

    /// Forecast the value following the current history
    fn predict_next(&self) -> Result<f64>;

    /// Append a revealed value to the history
    fn observe(&mut self, value: f64);

    /// Values seen so far
    fn history(&self) -> &[f64];

    /// Walk-forward validation over `test`.
    ///
    /// The prediction for `test[i]` is made before `test[i]` is observed.
    fn evaluate(&mut self, test: &[f64]) -> Result<Evaluation> {
        if test.is_empty() {
            return Err(ForecastError::EmptyInput(format!(
                "{} has no test values to evaluate on",
                self.name()
            )));
        }

        let mut predictions = Vec::with_capacity(test.len());
        for &actual in test {
            predictions.push(self.predict_next()?);
            self.observe(actual);
        }

        let metrics = ModelMetrics::compute(test, &predictions)?;
        Ok(Evaluation {
            predictions,
            actuals: test.to_vec(),
            metrics,
        })
    }
}

/// Configured model variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    /// Trailing mean of `window` closes
    MovingAverage { window: usize },
    /// ARIMA(p, d, q)
    Arima(ArimaOrder),
    /// Weighted average of member forecasts, equal weights by default
    Hybrid {
        members: Vec<ModelSpec>,
        #[serde(default)]
        weights: Option<Vec<f64>>,
    },
}

impl ModelSpec {
    /// Check the parameters without building the model
    pub fn validate(&self) -> Result<()> {
        match self {
            ModelSpec::MovingAverage { window } => {
                if *window == 0 {
                    return Err(ForecastError::InvalidParameter(
                        "Moving average window must be positive".to_string(),
                    ));
                }
                Ok(())
            }
            ModelSpec::Arima(order) => order.validate(),
            ModelSpec::Hybrid { members, weights } => {
                if members.is_empty() {
                    return Err(ForecastError::InvalidParameter(
                        "Hybrid model needs at least one member".to_string(),
                    ));
                }
                if let Some(weights) = weights {
                    hybrid::check_weights(weights, members.len())?;
                }
                members.iter().try_for_each(ModelSpec::validate)
            }
        }
    }

    /// Name the built model will report
    pub fn name(&self) -> String {
        match self {
            ModelSpec::MovingAverage { window } => format!("moving_average({})", window),
            ModelSpec::Arima(order) => order.to_string(),
            ModelSpec::Hybrid { members, .. } => {
                let names: Vec<String> = members.iter().map(ModelSpec::name).collect();
                format!("hybrid[{}]", names.join("+"))
            }
        }
    }

    /// Build an unfitted model
    pub fn build(&self) -> Result<Box<dyn ForecastModel>> {
        self.validate()?;
        let model: Box<dyn ForecastModel> = match self {
            ModelSpec::MovingAverage { window } => Box::new(MovingAverageModel::new(*window)?),
            ModelSpec::Arima(order) => Box::new(ArimaModel::new(*order)?),
            ModelSpec::Hybrid { members, weights } => {
                let built = members
                    .iter()
                    .map(ModelSpec::build)
                    .collect::<Result<Vec<_>>>()?;
                Box::new(HybridModel::new(built, weights.clone())?)
            }
        };
        Ok(model)
    }
}
