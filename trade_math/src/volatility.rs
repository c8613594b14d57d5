//! Volatility calculations
//!
//! Rolling sample standard deviation of a price series. The estimator uses
//! the `n - 1` denominator, matching the usual rolling `std()` of a price
//! table.

use crate::{MathError, Result};
use statrs::statistics::Statistics;
use std::collections::VecDeque;

/// Streaming sample standard deviation over a fixed window
#[derive(Debug, Clone)]
pub struct StandardDeviation {
    period: usize,
    values: VecDeque<f64>,
}

impl StandardDeviation {
    /// Create a new StandardDeviation with the specified period
    pub fn new(period: usize) -> Result<Self> {
        if period < 2 {
            return Err(MathError::InvalidInput(
                "Period must be at least 2 for a sample standard deviation".to_string(),
            ));
        }

        Ok(Self {
            period,
            values: VecDeque::with_capacity(period),
        })
    }

    /// Update the StandardDeviation with a new value
    pub fn update(&mut self, value: f64) {
        self.values.push_back(value);

        // Keep values at period length
        if self.values.len() > self.period {
            self.values.pop_front();
        }
    }

    /// Get the current standard deviation
    pub fn value(&self) -> Result<f64> {
        if self.values.len() < self.period {
            return Err(MathError::InsufficientData(format!(
                "Not enough data for standard deviation calculation. Need {} values, have {}.",
                self.period,
                self.values.len()
            )));
        }

        let std_dev = self.values.iter().std_dev();
        if !std_dev.is_finite() {
            return Err(MathError::CalculationError(
                "Standard deviation is not finite".to_string(),
            ));
        }

        Ok(std_dev)
    }

    /// Get the current period
    pub fn period(&self) -> usize {
        self.period
    }

    /// Reset the StandardDeviation, clearing all values
    pub fn reset(&mut self) {
        self.values.clear();
    }
}

/// Trailing sample standard deviation for every position of `values`.
///
/// Entry `i` covers `values[i + 1 - window..=i]`; positions without a full
/// window are `None`.
pub fn rolling_std(values: &[f64], window: usize) -> Result<Vec<Option<f64>>> {
    let mut std_dev = StandardDeviation::new(window)?;
    let mut out = Vec::with_capacity(values.len());

    for &value in values {
        std_dev.update(value);
        out.push(std_dev.value().ok());
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_standard_deviation_calculation() {
        let mut std_dev = StandardDeviation::new(3).unwrap();

        std_dev.update(10.0);
        std_dev.update(20.0);
        assert!(std_dev.value().is_err());
        std_dev.update(30.0);

        // sqrt(((10-20)^2 + 0 + (30-20)^2) / 2) = 10
        assert_relative_eq!(std_dev.value().unwrap(), 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_window_slides() {
        let mut std_dev = StandardDeviation::new(2).unwrap();
        std_dev.update(1.0);
        std_dev.update(100.0);
        std_dev.update(3.0);
        std_dev.update(3.0);

        assert_relative_eq!(std_dev.value().unwrap(), 0.0);
    }

    #[test]
    fn test_rolling_std_alignment() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let out = rolling_std(&values, 8).unwrap();

        assert!(out[..7].iter().all(Option::is_none));
        // Sample std dev of the classic example set
        assert_relative_eq!(out[7].unwrap(), 2.138089935299395, epsilon = 1e-12);
    }

    #[test]
    fn test_period_too_small() {
        assert!(StandardDeviation::new(1).is_err());
        assert!(rolling_std(&[1.0, 2.0], 0).is_err());
    }
}
