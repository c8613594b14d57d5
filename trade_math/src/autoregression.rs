//! Autoregressive fitting for time series prediction
//!
//! Contains the pieces an ARIMA(p, d, 0) forecaster is built from:
//! - differencing and one-step integration
//! - AR(p) estimated by least squares, with or without an intercept

use crate::{MathError, Result};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Ridge applied to the lag coefficients, relative to their mean diagonal.
///
/// Keeps the normal equations solvable when the regressors are collinear
/// (a perfectly linear price path differences to a constant series).
const RELATIVE_RIDGE: f64 = 1e-8;

/// Difference a series `d` times
pub fn difference(values: &[f64], d: usize) -> Vec<f64> {
    let mut result = values.to_vec();
    for _ in 0..d {
        if result.len() < 2 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Turn a forecast of the `d`-th difference back into the original scale.
///
/// `history` is the undifferenced series the forecast continues.
pub fn integrate_next(history: &[f64], d: usize, next_difference: f64) -> Result<f64> {
    if history.len() < d {
        return Err(MathError::InsufficientData(format!(
            "Need at least {} observations to undo differencing of order {}",
            d, d
        )));
    }

    // x[t+1] = D^d x[t+1] + sum over k < d of D^k x[t]
    let mut value = next_difference;
    for k in (0..d).rev() {
        let level = difference(history, k);
        match level.last() {
            Some(last) => value += last,
            None => {
                return Err(MathError::InsufficientData(format!(
                    "Differenced series of order {} is empty",
                    k
                )))
            }
        }
    }

    Ok(value)
}

/// Fitted AR(p) model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArFit {
    /// Constant term, zero for fits through the origin
    pub intercept: f64,
    /// Lag coefficients, `coefficients[i]` multiplies the value `i + 1` steps back
    pub coefficients: Vec<f64>,
    /// Mean squared in-sample residual
    pub residual_variance: f64,
    /// Number of regression rows used
    pub observations: usize,
}

impl ArFit {
    /// AR order of the fit
    pub fn order(&self) -> usize {
        self.coefficients.len()
    }

    /// One-step-ahead prediction continuing `series`
    pub fn predict_next(&self, series: &[f64]) -> Result<f64> {
        let p = self.order();
        if series.len() < p {
            return Err(MathError::InsufficientData(format!(
                "AR({}) prediction needs {} lagged values, have {}",
                p,
                p,
                series.len()
            )));
        }

        let prediction = self
            .coefficients
            .iter()
            .enumerate()
            .fold(self.intercept, |acc, (i, coef)| {
                acc + coef * series[series.len() - 1 - i]
            });

        Ok(prediction)
    }
}

/// Minimum series length needed to fit AR(p)
pub fn min_observations(p: usize) -> usize {
    // more regression rows than parameters
    2 * p + 2
}

/// Fit AR(p) with intercept by least squares
pub fn fit_ar(series: &[f64], p: usize) -> Result<ArFit> {
    fit_least_squares(series, p, true)
}

/// Fit AR(p) without a constant term.
///
/// Used on differenced series, where a constant would act as a drift.
/// With `p == 0` the fit predicts zero.
pub fn fit_ar_through_origin(series: &[f64], p: usize) -> Result<ArFit> {
    fit_least_squares(series, p, false)
}

fn fit_least_squares(series: &[f64], p: usize, intercept: bool) -> Result<ArFit> {
    if series.len() < min_observations(p) {
        return Err(MathError::InsufficientData(format!(
            "AR({}) needs at least {} observations, have {}",
            p,
            min_observations(p),
            series.len()
        )));
    }
    if series.iter().any(|v| !v.is_finite()) {
        return Err(MathError::InvalidInput(
            "Series contains non-finite values".to_string(),
        ));
    }

    let rows = series.len() - p;
    let first_lag = usize::from(intercept);
    let cols = p + first_lag;

    if cols == 0 {
        return Ok(ArFit {
            intercept: 0.0,
            coefficients: Vec::new(),
            residual_variance: series.iter().map(|v| v * v).sum::<f64>() / rows as f64,
            observations: rows,
        });
    }

    // Regressors [1, y(t-1), ..., y(t-p)], the leading 1 only with an intercept
    let mut x_data = Vec::with_capacity(rows * cols);
    for t in p..series.len() {
        if intercept {
            x_data.push(1.0);
        }
        for i in 1..=p {
            x_data.push(series[t - i]);
        }
    }

    let x = DMatrix::from_row_slice(rows, cols, &x_data);
    let y = DVector::from_column_slice(&series[p..]);

    let mut xtx = x.transpose() * &x;
    let xty = x.transpose() * &y;

    if p > 0 {
        let lag_diag = (first_lag..cols).map(|i| xtx[(i, i)]).sum::<f64>() / p as f64;
        let ridge = RELATIVE_RIDGE * lag_diag.max(1.0);
        for i in first_lag..cols {
            xtx[(i, i)] += ridge;
        }
    }

    let beta = match xtx.clone().cholesky() {
        Some(chol) => chol.solve(&xty),
        None => xtx.lu().solve(&xty).ok_or_else(|| {
            MathError::Singular(format!("AR({}) normal equations are singular", p))
        })?,
    };

    if beta.iter().any(|b| !b.is_finite()) {
        return Err(MathError::CalculationError(format!(
            "AR({}) coefficients are not finite",
            p
        )));
    }

    let fitted = &x * &beta;
    let residual_variance = (&y - fitted).iter().map(|r| r * r).sum::<f64>() / rows as f64;

    Ok(ArFit {
        intercept: if intercept { beta[0] } else { 0.0 },
        coefficients: beta.iter().skip(first_lag).copied().collect(),
        residual_variance,
        observations: rows,
    })
}
