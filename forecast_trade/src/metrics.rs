//! Metrics for evaluating forecast performance

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Held-out error metrics of a model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Mean absolute error
    pub mae: f64,
    /// Root mean squared error
    pub rmse: f64,
    /// Mean absolute percentage error, in percent
    pub mape: f64,
    /// Coefficient of determination
    pub r2: f64,
    /// Points with a non-zero true value, the ones MAPE averages over
    pub mape_points: usize,
}

impl ModelMetrics {
    /// Compute all metrics for aligned true and predicted values
    pub fn compute(actual: &[f64], predicted: &[f64]) -> Result<Self> {
        check_aligned(actual, predicted)?;
        let (mape, mape_points) = mape(actual, predicted)?;

        Ok(Self {
            mae: mae(actual, predicted)?,
            rmse: rmse(actual, predicted)?,
            mape,
            r2: r_squared(actual, predicted)?,
            mape_points,
        })
    }

    /// Copy with every metric rounded to `decimals` places
    pub fn rounded(&self, decimals: i32) -> Self {
        let factor = 10f64.powi(decimals);
        let round = |v: f64| (v * factor).round() / factor;
        Self {
            mae: round(self.mae),
            rmse: round(self.rmse),
            mape: round(self.mape),
            r2: round(self.r2),
            mape_points: self.mape_points,
        }
    }
}

fn check_aligned(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.len() != predicted.len() {
        return Err(ForecastError::InvalidParameter(format!(
            "Actual ({}) and predicted ({}) lengths differ",
            actual.len(),
            predicted.len()
        )));
    }
    if actual.is_empty() {
        return Err(ForecastError::EmptyInput(
            "No points to compute metrics on".to_string(),
        ));
    }
    Ok(())
}

/// Mean absolute error
pub fn mae(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_aligned(actual, predicted)?;
    let total: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum();
    Ok(total / actual.len() as f64)
}

/// Root mean squared error
pub fn rmse(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_aligned(actual, predicted)?;
    let total: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    Ok((total / actual.len() as f64).sqrt())
}

/// Mean absolute percentage error over the points whose true value is non-zero.
///
/// Returns the MAPE and the number of points it was averaged over. Fails with
/// [`ForecastError::DivisionGuard`] when every true value is zero.
pub fn mape(actual: &[f64], predicted: &[f64]) -> Result<(f64, usize)> {
    check_aligned(actual, predicted)?;

    let ratios: Vec<f64> = actual
        .iter()
        .zip(predicted)
        .filter(|(a, _)| **a != 0.0)
        .map(|(a, p)| ((a - p) / a).abs())
        .collect();

    if ratios.is_empty() {
        return Err(ForecastError::DivisionGuard(
            "MAPE undefined: every true value is zero".to_string(),
        ));
    }

    let points = ratios.len();
    Ok((ratios.iter().sum::<f64>() / points as f64 * 100.0, points))
}

/// Coefficient of determination against the mean of the true values.
///
/// A constant true series scores 1.0 when fitted exactly, 0.0 otherwise.
pub fn r_squared(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_aligned(actual, predicted)?;

    let mean = actual.iter().mean();
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Ok(1.0 - ss_res / ss_tot)
}
