//! Moving average calculations
//!
//! Contains a streaming Simple Moving Average (SMA) and the batch helpers
//! built on top of it:
//! - [`rolling_mean`] for a full series, aligned to the input
//! - [`trailing_mean`] for the last window of a series

use crate::{MathError, Result};
use std::collections::VecDeque;

/// Simple Moving Average (SMA) implementation
#[derive(Debug, Clone)]
pub struct SimpleMovingAverage {
    period: usize,
    values: VecDeque<f64>,
    sum: f64,
}

impl SimpleMovingAverage {
    /// Create a new Simple Moving Average with the specified period
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(MathError::InvalidInput(
                "Period must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            period,
            values: VecDeque::with_capacity(period),
            sum: 0.0,
        })
    }

    /// Update the SMA with a new value
    pub fn update(&mut self, value: f64) {
        self.values.push_back(value);
        self.sum += value;

        // Remove oldest value if we have more than period values
        if self.values.len() > self.period {
            if let Some(old_value) = self.values.pop_front() {
                self.sum -= old_value;
            }
        }
    }

    /// Whether a full window has been seen
    pub fn is_ready(&self) -> bool {
        self.values.len() == self.period
    }

    /// Get the current SMA value
    pub fn value(&self) -> Result<f64> {
        if !self.is_ready() {
            return Err(MathError::InsufficientData(format!(
                "Not enough data for SMA calculation. Need {} values, have {}.",
                self.period,
                self.values.len()
            )));
        }

        Ok(self.sum / self.period as f64)
    }

    /// Get the current period
    pub fn period(&self) -> usize {
        self.period
    }

    /// Reset the SMA, clearing all values
    pub fn reset(&mut self) {
        self.values.clear();
        self.sum = 0.0;
    }
}

/// Trailing mean for every position of `values`.
///
/// The output is aligned with the input: entry `i` is the mean of
/// `values[i + 1 - window..=i]`, or `None` while fewer than `window`
/// values are available.
pub fn rolling_mean(values: &[f64], window: usize) -> Result<Vec<Option<f64>>> {
    let mut sma = SimpleMovingAverage::new(window)?;
    let mut out = Vec::with_capacity(values.len());

    for &value in values {
        sma.update(value);
        out.push(sma.value().ok());
    }

    Ok(out)
}

/// Mean of the last `window` values of a series
pub fn trailing_mean(values: &[f64], window: usize) -> Result<f64> {
    if window == 0 {
        return Err(MathError::InvalidInput(
            "Period must be greater than zero".to_string(),
        ));
    }
    if values.len() < window {
        return Err(MathError::InsufficientData(format!(
            "Need {} values for a trailing mean, have {}.",
            window,
            values.len()
        )));
    }

    let tail = &values[values.len() - window..];
    Ok(tail.iter().sum::<f64>() / window as f64)
}
