//! ARIMA models for time series forecasting
//!
//! The series is differenced `d` times, an AR(p) is fitted to the
//! differences by least squares, and the one-step forecast of the next
//! difference is integrated back onto the price scale. Only pure
//! autoregressive orders are supported, `q` must be zero.
//!
//! The AR part carries an intercept only when `d == 0`; on differenced
//! series the model has no drift term.

use crate::error::{ForecastError, Result};
use crate::models::ForecastModel;
use serde::{Deserialize, Serialize};
use std::fmt;
use trade_math::autoregression::{self, ArFit};
use trade_math::MathError;

/// ARIMA order `(p, d, q)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArimaOrder {
    /// AR order
    pub p: usize,
    /// Differencing order
    pub d: usize,
    /// MA order
    pub q: usize,
}

impl Default for ArimaOrder {
    fn default() -> Self {
        Self { p: 5, d: 1, q: 0 }
    }
}

impl fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "arima({},{},{})", self.p, self.d, self.q)
    }
}

impl ArimaOrder {
    pub fn validate(&self) -> Result<()> {
        if self.q > 0 {
            return Err(ForecastError::InvalidParameter(format!(
                "MA order q = {} is not supported, only q = 0",
                self.q
            )));
        }
        if self.p == 0 && self.d == 0 {
            return Err(ForecastError::InvalidParameter(
                "ARIMA order needs p > 0 or d > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Shortest history the model can be fitted on
    pub fn min_history(&self) -> usize {
        self.d + autoregression::min_observations(self.p)
    }

    /// Whether the AR part estimates a constant term
    pub fn has_intercept(&self) -> bool {
        self.d == 0
    }
}

/// ARIMA(p, d, 0) model refitted on its history for every prediction
#[derive(Debug, Clone)]
pub struct ArimaModel {
    order: ArimaOrder,
    history: Vec<f64>,
    /// Fit made by the last call to `fit`
    fitted: Option<ArFit>,
    /// History length `fitted` was estimated on
    fitted_len: usize,
}

impl ArimaModel {
    /// Create a new ARIMA model
    pub fn new(order: ArimaOrder) -> Result<Self> {
        order.validate()?;
        Ok(Self {
            order,
            history: Vec::new(),
            fitted: None,
            fitted_len: 0,
        })
    }

    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    /// Coefficients from the last explicit `fit`
    pub fn fitted(&self) -> Option<&ArFit> {
        self.fitted.as_ref()
    }

    fn check_history(&self, available: usize) -> Result<()> {
        let required = self.order.min_history();
        if available < required {
            return Err(ForecastError::InsufficientHistory {
                context: self.name(),
                required,
                available,
            });
        }
        Ok(())
    }

    fn fit_on(&self, series: &[f64]) -> Result<ArFit> {
        self.check_history(series.len())?;
        let differenced = autoregression::difference(series, self.order.d);
        let fit = if self.order.has_intercept() {
            autoregression::fit_ar(&differenced, self.order.p)
        } else {
            autoregression::fit_ar_through_origin(&differenced, self.order.p)
        };
        fit.map_err(|e| self.fit_error(e))
    }

    fn forecast_from(&self, fit: &ArFit, series: &[f64]) -> Result<f64> {
        let differenced = autoregression::difference(series, self.order.d);
        let next_diff = fit
            .predict_next(&differenced)
            .map_err(|e| self.fit_error(e))?;
        let value = autoregression::integrate_next(series, self.order.d, next_diff)
            .map_err(|e| self.fit_error(e))?;

        if !value.is_finite() {
            return Err(ForecastError::fit_failure(
                self.name(),
                "forecast is not finite",
            ));
        }
        Ok(value)
    }

    fn fit_error(&self, err: MathError) -> ForecastError {
        ForecastError::fit_failure(self.name(), err)
    }
}

impl ForecastModel for ArimaModel {
    fn name(&self) -> String {
        self.order.to_string()
    }

    fn fit(&mut self, training: &[f64]) -> Result<()> {
        let fit = self.fit_on(training)?;
        self.history = training.to_vec();
        self.fitted = Some(fit);
        self.fitted_len = training.len();
        Ok(())
    }

    fn predict_next(&self) -> Result<f64> {
        // history only grows through `observe`, so equal length means unchanged
        match &self.fitted {
            Some(fit) if self.fitted_len == self.history.len() => {
                self.forecast_from(fit, &self.history)
            }
            _ => {
                let fit = self.fit_on(&self.history)?;
                self.forecast_from(&fit, &self.history)
            }
        }
    }

    fn observe(&mut self, value: f64) {
        self.history.push(value);
    }

    fn history(&self) -> &[f64] {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_linear_trend_next_step() {
        let training: Vec<f64> = (0..100).map(|i| 100.0 + i as f64).collect();
        let mut model = ArimaModel::new(ArimaOrder::default()).unwrap();
        model.fit(&training).unwrap();

        assert_abs_diff_eq!(model.predict_next().unwrap(), 200.0, epsilon = 1e-4);

        model.observe(200.0);
        assert_abs_diff_eq!(model.predict_next().unwrap(), 201.0, epsilon = 1e-4);
        assert_eq!(model.history().len(), 101);
    }

    #[test]
    fn test_refits_on_current_history() {
        let training: Vec<f64> = (0..40).map(|i| 10.0 + (i as f64 * 0.4).cos()).collect();
        let mut model = ArimaModel::new(ArimaOrder { p: 2, d: 1, q: 0 }).unwrap();
        model.fit(&training).unwrap();
        let initial = model.fitted().cloned().unwrap();

        model.observe(14.0);
        let after = model.predict_next().unwrap();

        let mut fresh = ArimaModel::new(ArimaOrder { p: 2, d: 1, q: 0 }).unwrap();
        let mut extended = training.clone();
        extended.push(14.0);
        fresh.fit(&extended).unwrap();

        assert_abs_diff_eq!(after, fresh.predict_next().unwrap(), epsilon = 1e-9);
        assert_eq!(model.fitted(), Some(&initial));
    }

    #[test]
    fn test_differenced_fit_has_no_drift() {
        // oscillation around a rising level: an intercept would pick up the rise
        let training: Vec<f64> = (0..120)
            .map(|i| 80.0 + 0.05 * i as f64 + (i as f64 * 0.9).sin())
            .collect();
        let mut model = ArimaModel::new(ArimaOrder::default()).unwrap();
        model.fit(&training).unwrap();

        let fit = model.fitted().unwrap();
        assert_eq!(fit.intercept, 0.0);
        assert_eq!(fit.order(), 5);

        let mut levels = ArimaModel::new(ArimaOrder { p: 2, d: 0, q: 0 }).unwrap();
        levels.fit(&training).unwrap();
        assert!(levels.order().has_intercept());
        assert!(levels.fitted().unwrap().intercept != 0.0);
    }

    #[test]
    fn test_random_walk_order() {
        let mut model = ArimaModel::new(ArimaOrder { p: 0, d: 1, q: 0 }).unwrap();
        model.fit(&[10.0, 12.0, 11.0, 13.5]).unwrap();
        assert_eq!(model.predict_next().unwrap(), 13.5);
    }

    #[test]
    fn test_predicts_from_stored_fit() {
        let training: Vec<f64> = (0..60).map(|i| 50.0 + (i as f64 * 0.3).sin()).collect();
        let mut model = ArimaModel::new(ArimaOrder { p: 3, d: 1, q: 0 }).unwrap();
        model.fit(&training).unwrap();

        let fit = model.fitted().cloned().unwrap();
        let differenced = autoregression::difference(&training, 1);
        let expected = training[59] + fit.predict_next(&differenced).unwrap();
        assert_eq!(model.predict_next().unwrap(), expected);
    }

    #[test]
    fn test_insufficient_history() {
        let mut model = ArimaModel::new(ArimaOrder::default()).unwrap();
        let err = model.fit(&[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(
            err,
            ForecastError::InsufficientHistory {
                required: 13,
                available: 3,
                ..
            }
        ));
        assert!(model.predict_next().is_err());
    }

    #[test]
    fn test_non_finite_history_is_fit_failure() {
        let mut training: Vec<f64> = (0..30).map(|i| i as f64).collect();
        training[12] = f64::INFINITY;

        let mut model = ArimaModel::new(ArimaOrder { p: 1, d: 1, q: 0 }).unwrap();
        let err = model.fit(&training).unwrap_err();
        assert!(matches!(err, ForecastError::FitFailure { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_order_validation() {
        assert!(ArimaModel::new(ArimaOrder { p: 5, d: 1, q: 2 }).is_err());
        assert!(ArimaModel::new(ArimaOrder { p: 0, d: 0, q: 0 }).is_err());
        assert!(ArimaModel::new(ArimaOrder { p: 0, d: 1, q: 0 }).is_ok());
        assert_eq!(ArimaOrder::default().to_string(), "arima(5,1,0)");
    }
}
