//! Model ranking on a chronological train/test split

use crate::error::{ForecastError, Result};
use crate::features::FeatureTable;
use crate::metrics::ModelMetrics;
use crate::models::{ForecastModel, ModelSpec};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Decimal places of the persisted comparison table
const TABLE_DECIMALS: i32 = 4;

/// A candidate that evaluated successfully
#[derive(Debug)]
pub struct RankedModel {
    pub spec: ModelSpec,
    pub name: String,
    pub metrics: ModelMetrics,
    /// Evaluated instance, its history covers the training and test values
    pub model: Box<dyn ForecastModel>,
}

/// A candidate excluded from the ranking
#[derive(Debug, Clone, PartialEq)]
pub struct ModelFailure {
    pub name: String,
    pub reason: String,
}

/// One row of the model comparison table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub model: String,
    pub mae: f64,
    pub rmse: f64,
    pub mape: f64,
    pub r2: f64,
}

/// Candidates sorted by ascending MAPE
#[derive(Debug)]
pub struct ModelRanking {
    pub entries: Vec<RankedModel>,
    pub failures: Vec<ModelFailure>,
}

impl ModelRanking {
    /// Lowest-MAPE model
    pub fn winner(&self) -> Option<&RankedModel> {
        self.entries.first()
    }

    /// Take ownership of the lowest-MAPE model
    pub fn into_winner(self) -> Option<RankedModel> {
        self.entries.into_iter().next()
    }

    /// `(name, metrics)` pairs in rank order
    pub fn metrics(&self) -> Vec<(String, ModelMetrics)> {
        self.entries
            .iter()
            .map(|e| (e.name.clone(), e.metrics))
            .collect()
    }

    /// Comparison table rows, rounded for reporting
    pub fn table(&self) -> Vec<ComparisonRow> {
        self.entries
            .iter()
            .map(|e| {
                let m = e.metrics.rounded(TABLE_DECIMALS);
                ComparisonRow {
                    model: e.name.clone(),
                    mae: m.mae,
                    rmse: m.rmse,
                    mape: m.mape,
                    r2: m.r2,
                }
            })
            .collect()
    }

    /// Write the comparison table as CSV
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_path(path.as_ref())?;
        for row in self.table() {
            writer.serialize(row)?;
        }
        writer.flush()?;
        info!(path = %path.as_ref().display(), "saved model comparison");
        Ok(())
    }

    /// Render the comparison table as JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.table())?)
    }
}

/// Fits every configured model and ranks them by MAPE
#[derive(Debug, Clone)]
pub struct ModelSelector {
    specs: Vec<ModelSpec>,
    train_ratio: f64,
}

impl ModelSelector {
    /// `specs` order breaks MAPE ties
    pub fn new(specs: Vec<ModelSpec>, train_ratio: f64) -> Result<Self> {
        if specs.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "No models to select from".to_string(),
            ));
        }
        if train_ratio <= 0.0 || train_ratio >= 1.0 {
            return Err(ForecastError::InvalidParameter(format!(
                "Train ratio must be in (0, 1), got {}",
                train_ratio
            )));
        }
        for spec in &specs {
            spec.validate()?;
        }
        Ok(Self { specs, train_ratio })
    }

    /// Split index for `len` rows; rows before it are training rows
    pub fn split_index(&self, len: usize) -> usize {
        (len as f64 * self.train_ratio) as usize
    }

    /// Rank the candidates on the close prices of `table`
    pub fn rank(&self, table: &FeatureTable) -> Result<ModelRanking> {
        let closes = table.closes();
        self.rank_closes(&closes)
    }

    /// Rank the candidates on a bare close series
    pub fn rank_closes(&self, closes: &[f64]) -> Result<ModelRanking> {
        let split = self.split_index(closes.len());
        if split == 0 || split >= closes.len() {
            return Err(ForecastError::InsufficientHistory {
                context: "train/test split".to_string(),
                required: 2,
                available: closes.len(),
            });
        }
        let (train, test) = closes.split_at(split);
        info!(train = train.len(), test = test.len(), "ranking models");

        let mut entries = Vec::new();
        let mut failures = Vec::new();

        for spec in &self.specs {
            let name = spec.name();
            match Self::evaluate(spec, train, test) {
                Ok((model, metrics)) => {
                    info!(
                        model = %name,
                        mae = metrics.mae,
                        rmse = metrics.rmse,
                        mape = metrics.mape,
                        r2 = metrics.r2,
                        "evaluated model"
                    );
                    entries.push(RankedModel {
                        spec: spec.clone(),
                        name,
                        metrics,
                        model,
                    });
                }
                Err(err) if err.is_recoverable() => {
                    warn!(model = %name, error = %err, "excluding model from ranking");
                    failures.push(ModelFailure {
                        name,
                        reason: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }

        if entries.is_empty() {
            let names: Vec<&str> = failures.iter().map(|f| f.name.as_str()).collect();
            let reasons: Vec<&str> = failures.iter().map(|f| f.reason.as_str()).collect();
            return Err(ForecastError::FitFailure {
                model: names.join(", "),
                message: format!("every candidate failed: {}", reasons.join("; ")),
            });
        }

        // stable: equal MAPE keeps configuration order
        entries.sort_by(|a, b| a.metrics.mape.total_cmp(&b.metrics.mape));

        if let Some(winner) = entries.first() {
            info!(model = %winner.name, mape = winner.metrics.mape, "selected model");
        }

        Ok(ModelRanking { entries, failures })
    }

    fn evaluate(
        spec: &ModelSpec,
        train: &[f64],
        test: &[f64],
    ) -> Result<(Box<dyn ForecastModel>, ModelMetrics)> {
        let mut model = spec.build()?;
        model.fit(train)?;
        let evaluation = model.evaluate(test)?;
        Ok((model, evaluation.metrics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::arima::ArimaOrder;

    fn linear(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    #[test]
    fn test_arima_beats_moving_average_on_trend() {
        let selector = ModelSelector::new(
            vec![
                ModelSpec::MovingAverage { window: 7 },
                ModelSpec::Arima(ArimaOrder::default()),
            ],
            0.8,
        )
        .unwrap();
        let ranking = selector.rank_closes(&linear(120)).unwrap();

        assert_eq!(ranking.entries.len(), 2);
        assert_eq!(ranking.winner().unwrap().name, "arima(5,1,0)");
        assert!(ranking.entries[0].metrics.mape < ranking.entries[1].metrics.mape);
        assert_eq!(ranking.entries[0].model.history().len(), 120);
    }

    #[test]
    fn test_ties_keep_configuration_order() {
        let selector = ModelSelector::new(
            vec![
                ModelSpec::MovingAverage { window: 3 },
                ModelSpec::MovingAverage { window: 1 },
                ModelSpec::MovingAverage { window: 3 },
            ],
            0.5,
        )
        .unwrap();
        let ranking = selector.rank_closes(&[5.0; 20]).unwrap();

        let names: Vec<_> = ranking.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["moving_average(3)", "moving_average(1)", "moving_average(3)"]
        );
    }

    #[test]
    fn test_failed_candidates_are_excluded() {
        let selector = ModelSelector::new(
            vec![
                ModelSpec::MovingAverage { window: 50 },
                ModelSpec::MovingAverage { window: 2 },
            ],
            0.8,
        )
        .unwrap();
        let ranking = selector.rank_closes(&linear(30)).unwrap();

        assert_eq!(ranking.entries.len(), 1);
        assert_eq!(ranking.failures.len(), 1);
        assert_eq!(ranking.failures[0].name, "moving_average(50)");
    }

    #[test]
    fn test_all_candidates_failing_aborts() {
        let selector =
            ModelSelector::new(vec![ModelSpec::MovingAverage { window: 50 }], 0.8).unwrap();
        let err = selector.rank_closes(&linear(30)).unwrap_err();
        assert!(matches!(err, ForecastError::FitFailure { .. }));
    }

    #[test]
    fn test_table_json() {
        let selector =
            ModelSelector::new(vec![ModelSpec::MovingAverage { window: 1 }], 0.5).unwrap();
        let ranking = selector.rank_closes(&linear(10)).unwrap();

        let json = ranking.to_json().unwrap();
        let rows: Vec<ComparisonRow> = serde_json::from_str(&json).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].model, "moving_average(1)");
        assert_eq!(rows[0].mae, 1.0);
    }

    #[test]
    fn test_rejects_bad_configuration() {
        assert!(ModelSelector::new(Vec::new(), 0.8).is_err());
        assert!(ModelSelector::new(vec![ModelSpec::MovingAverage { window: 1 }], 1.0).is_err());
    }
}
