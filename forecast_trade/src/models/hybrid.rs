//! Weighted ensemble of other models

use crate::error::{ForecastError, Result};
use crate::models::ForecastModel;

pub(crate) fn check_weights(weights: &[f64], members: usize) -> Result<()> {
    if weights.len() != members {
        return Err(ForecastError::InvalidParameter(format!(
            "Hybrid model has {} members but {} weights",
            members,
            weights.len()
        )));
    }
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(ForecastError::InvalidParameter(
            "Hybrid weights must be finite and non-negative".to_string(),
        ));
    }
    if weights.iter().sum::<f64>() <= 0.0 {
        return Err(ForecastError::InvalidParameter(
            "Hybrid weights must sum to a positive value".to_string(),
        ));
    }
    Ok(())
}

/// Predicts the weighted average of its members' next-step forecasts
#[derive(Debug)]
pub struct HybridModel {
    members: Vec<Box<dyn ForecastModel>>,
    /// Normalised to sum to one
    weights: Vec<f64>,
    history: Vec<f64>,
}

impl HybridModel {
    /// Combine `members`, equally weighted when `weights` is `None`
    pub fn new(members: Vec<Box<dyn ForecastModel>>, weights: Option<Vec<f64>>) -> Result<Self> {
        if members.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "Hybrid model needs at least one member".to_string(),
            ));
        }

        let weights = weights.unwrap_or_else(|| vec![1.0; members.len()]);
        check_weights(&weights, members.len())?;
        let total: f64 = weights.iter().sum();

        Ok(Self {
            weights: weights.iter().map(|w| w / total).collect(),
            members,
            history: Vec::new(),
        })
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}

impl ForecastModel for HybridModel {
    fn name(&self) -> String {
        let names: Vec<String> = self.members.iter().map(|m| m.name()).collect();
        format!("hybrid[{}]", names.join("+"))
    }

    fn fit(&mut self, training: &[f64]) -> Result<()> {
        for member in &mut self.members {
            member.fit(training)?;
        }
        self.history = training.to_vec();
        Ok(())
    }

    fn predict_next(&self) -> Result<f64> {
        let mut prediction = 0.0;
        for (member, weight) in self.members.iter().zip(&self.weights) {
            prediction += weight * member.predict_next()?;
        }
        Ok(prediction)
    }

    fn observe(&mut self, value: f64) {
        for member in &mut self.members {
            member.observe(value);
        }
        self.history.push(value);
    }

    fn history(&self) -> &[f64] {
        &self.history
    }
}
