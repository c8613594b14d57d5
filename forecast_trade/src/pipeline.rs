//! Entry points tying the stages together
//!
//! raw bars → [`Preprocessor`] → [`FeatureBuilder`] → [`ModelSelector`] →
//! [`Forecaster`] for the forward forecast, and [`BacktestEngine`] on the
//! cleaned series for the historical replay.

use crate::backtest::{BacktestEngine, BacktestReport};
use crate::config::{BacktestConfig, PipelineConfig};
use crate::data::{DataLoader, PriceSeries, RawBar};
use crate::error::{ForecastError, Result};
use crate::features::{FeatureBuilder, FeatureTable};
use crate::forecaster::{Forecast, Forecaster};
use crate::prediction::{CsvPredictionStore, Prediction, PredictionStore};
use crate::preprocess::{PreprocessOutput, Preprocessor};
use crate::selector::{ModelRanking, ModelSelector, RankedModel};
use chrono::{NaiveDateTime, Utc};
use std::path::Path;
use tracing::info;

/// Rank the configured models on `series`
pub fn rank_models(series: &PriceSeries, config: &PipelineConfig) -> Result<ModelRanking> {
    let table = FeatureBuilder::new(config.features.clone())?.build_series(series)?;
    rank_table(&table, config)
}

/// Forecast the next close of `series` and append it to `store`
pub fn run_forecast(
    series: &PriceSeries,
    config: &PipelineConfig,
    store: &mut dyn PredictionStore,
) -> Result<Prediction> {
    Ok(run_forecast_at(series, config, store, Utc::now().naive_utc())?.prediction)
}

/// [`run_forecast`] with an explicit prediction timestamp
pub fn run_forecast_at(
    series: &PriceSeries,
    config: &PipelineConfig,
    store: &mut dyn PredictionStore,
    timestamp: NaiveDateTime,
) -> Result<Forecast> {
    let table = FeatureBuilder::new(config.features.clone())?.build_series(series)?;
    forecast_from_table(series, &table, config, store, timestamp)
}

/// Backtest with the default ARIMA order and evaluation ratio
pub fn run_backtest(
    series: &PriceSeries,
    window_days: u32,
    min_train_days: usize,
) -> Result<BacktestReport> {
    run_backtest_with(
        series,
        &BacktestConfig {
            window_days,
            min_train_days,
            ..BacktestConfig::default()
        },
    )
}

/// Backtest with explicit settings
pub fn run_backtest_with(series: &PriceSeries, config: &BacktestConfig) -> Result<BacktestReport> {
    BacktestEngine::new(config.clone())?.run(series)
}

fn rank_table(table: &FeatureTable, config: &PipelineConfig) -> Result<ModelRanking> {
    let ranking = ModelSelector::new(config.models.clone(), config.train_ratio)?.rank(table)?;
    if let Some(path) = &config.output.model_comparison_path {
        ranking.write_csv(path)?;
    }
    Ok(ranking)
}

fn forecast_from_table(
    series: &PriceSeries,
    table: &FeatureTable,
    config: &PipelineConfig,
    store: &mut dyn PredictionStore,
    timestamp: NaiveDateTime,
) -> Result<Forecast> {
    let current = series
        .last()
        .ok_or_else(|| ForecastError::EmptyInput("cannot forecast an empty series".to_string()))?;

    let ranking = rank_table(table, config)?;
    let winner = ranking.into_winner().ok_or_else(|| {
        ForecastError::DataError("model ranking produced no winner".to_string())
    })?;
    let latest_row = table.last().map(|row| row.bar.date);
    let winner = reach_latest_close(winner, latest_row == Some(current.date), series)?;

    Forecaster::new(winner.name.clone(), winner.metrics.mape).publish_at(
        winner.model.as_ref(),
        current,
        timestamp,
        store,
    )
}

/// The evaluated winner already ends at the latest close unless the feature
/// builder dropped trailing rows; in that case it is refitted on every close.
fn reach_latest_close(
    winner: RankedModel,
    ends_at_latest: bool,
    series: &PriceSeries,
) -> Result<RankedModel> {
    if ends_at_latest {
        return Ok(winner);
    }

    info!(model = %winner.name, "refitting winner on the full series");
    let mut model = winner.spec.build()?;
    model.fit(&series.closes())?;
    Ok(RankedModel { model, ..winner })
}

/// Pipeline over a preprocessed raw table
#[derive(Debug, Clone)]
pub struct ForecastPipeline {
    config: PipelineConfig,
    input: PreprocessOutput,
}

impl ForecastPipeline {
    /// Clean `raw` and keep it for the later stages
    pub fn from_raw(raw: &[RawBar], config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let input = Preprocessor::new().run(raw)?;
        Ok(Self { config, input })
    }

    /// Load a daily OHLCV CSV and clean it
    pub fn from_csv<P: AsRef<Path>>(path: P, config: PipelineConfig) -> Result<Self> {
        let raw = DataLoader::from_csv(path)?;
        Self::from_raw(&raw, config)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn series(&self) -> &PriceSeries {
        &self.input.series
    }

    pub fn preprocessed(&self) -> &PreprocessOutput {
        &self.input
    }

    /// CSV history store at the configured path, if any
    pub fn history_store(&self) -> Option<CsvPredictionStore> {
        self.config
            .output
            .prediction_history_path
            .as_ref()
            .map(CsvPredictionStore::open)
    }

    /// Feature table of the cleaned series
    pub fn features(&self) -> Result<FeatureTable> {
        FeatureBuilder::new(self.config.features.clone())?.build(&self.input)
    }

    pub fn rank_models(&self) -> Result<ModelRanking> {
        rank_table(&self.features()?, &self.config)
    }

    /// Forecast the next close and append it to `store`
    pub fn forecast(&self, store: &mut dyn PredictionStore) -> Result<Forecast> {
        self.forecast_at(store, Utc::now().naive_utc())
    }

    pub fn forecast_at(
        &self,
        store: &mut dyn PredictionStore,
        timestamp: NaiveDateTime,
    ) -> Result<Forecast> {
        let table = self.features()?;
        forecast_from_table(&self.input.series, &table, &self.config, store, timestamp)
    }

    /// Backtest with the configured settings
    pub fn backtest(&self) -> Result<BacktestReport> {
        run_backtest_with(&self.input.series, &self.config.backtest)
    }

    /// Backtest and merge the records into `store`
    pub fn backtest_into(&self, store: &mut dyn PredictionStore) -> Result<BacktestReport> {
        let report = self.backtest()?;
        store.merge_by_target_date(report.records.clone())?;
        Ok(report)
    }
}
