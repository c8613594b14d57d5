//! Moving average model for time series forecasting

use crate::error::{ForecastError, Result};
use crate::models::ForecastModel;
use trade_math::moving_averages::trailing_mean;

/// Predicts the mean of the trailing `window` values.
///
/// Under walk-forward evaluation the first test points are predicted from
/// the tail of the training values, so every test point gets a prediction.
#[derive(Debug, Clone)]
pub struct MovingAverageModel {
    /// Window size
    window: usize,
    /// Observed values
    history: Vec<f64>,
}

impl MovingAverageModel {
    /// Create a new moving average model
    pub fn new(window: usize) -> Result<Self> {
        if window == 0 {
            return Err(ForecastError::InvalidParameter(
                "Window size must be positive".to_string(),
            ));
        }

        Ok(Self {
            window,
            history: Vec::new(),
        })
    }

    /// Window size
    pub fn window(&self) -> usize {
        self.window
    }
}

impl ForecastModel for MovingAverageModel {
    fn name(&self) -> String {
        format!("moving_average({})", self.window)
    }

    fn fit(&mut self, training: &[f64]) -> Result<()> {
        if training.len() < self.window {
            return Err(ForecastError::InsufficientHistory {
                context: self.name(),
                required: self.window,
                available: training.len(),
            });
        }

        self.history = training.to_vec();
        Ok(())
    }

    fn predict_next(&self) -> Result<f64> {
        if self.history.len() < self.window {
            return Err(ForecastError::InsufficientHistory {
                context: self.name(),
                required: self.window,
                available: self.history.len(),
            });
        }

        Ok(trailing_mean(&self.history, self.window)?)
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
    use approx::assert_relative_eq;

    #[test]
    fn test_predicts_trailing_mean() {
        let mut model = MovingAverageModel::new(3).unwrap();
        model.fit(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();

        assert_relative_eq!(model.predict_next().unwrap(), 4.0);

        model.observe(9.0);
        assert_relative_eq!(model.predict_next().unwrap(), 6.0);
    }

    #[test]
    fn test_evaluate_linear_lag() {
        let training: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let test: Vec<f64> = (20..25).map(|i| 100.0 + i as f64).collect();

        let mut model = MovingAverageModel::new(7).unwrap();
        model.fit(&training).unwrap();
        let eval = model.evaluate(&test).unwrap();

        // mean of the previous 7 values of a +1 trend lags by 4
        for (p, a) in eval.predictions.iter().zip(&eval.actuals) {
            assert_relative_eq!(a - p, 4.0, epsilon = 1e-9);
        }
        assert_relative_eq!(eval.metrics.mae, 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_evaluation_predicts_every_test_point() {
        let mut model = MovingAverageModel::new(3).unwrap();
        model.fit(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let eval = model.evaluate(&[6.0, 7.0]).unwrap();

        // [3, 4, 5] then [4, 5, 6]
        assert_eq!(eval.predictions, vec![4.0, 5.0]);
        assert_eq!(eval.actuals, vec![6.0, 7.0]);
        assert_eq!(model.history().len(), 7);
    }

    #[test]
    fn test_short_training_rejected() {
        let mut model = MovingAverageModel::new(7).unwrap();
        assert!(matches!(
            model.fit(&[1.0, 2.0]),
            Err(ForecastError::InsufficientHistory { required: 7, .. })
        ));
        assert!(model.predict_next().is_err());
        assert!(MovingAverageModel::new(0).is_err());
    }
}
