//! Feature construction from a cleaned price series
//!
//! Every feature is a pure function of the original open/high/low/close
//! columns, so the order in which feature families are added does not
//! matter. Rows without a full window for every requested feature are
//! dropped rather than filled.

use crate::config::FeatureConfig;
use crate::data::{PriceBar, PriceSeries};
use crate::error::{ForecastError, Result};
use crate::preprocess::{CalendarAttributes, DailyStats, PreprocessOutput};
use trade_math::moving_averages::rolling_mean;
use trade_math::volatility::rolling_std;
use tracing::{debug, info};

/// One retained date with its derived feature values
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub bar: PriceBar,
    pub calendar: CalendarAttributes,
    pub daily_stats: DailyStats,
    /// Values in the order of [`FeatureTable::names`]
    pub values: Vec<f64>,
}

/// Model-ready rows, all complete
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    pub names: Vec<String>,
    pub rows: Vec<FeatureRow>,
}

impl FeatureTable {
    /// Number of retained rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no row survived
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a feature in `names`
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Value of feature `name` at row `row`
    pub fn get(&self, row: usize, name: &str) -> Option<f64> {
        let col = self.index_of(name)?;
        self.rows.get(row).map(|r| r.values[col])
    }

    /// Whole column of feature `name`
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let col = self.index_of(name)?;
        Some(self.rows.iter().map(|r| r.values[col]).collect())
    }

    /// Close prices of the retained rows
    pub fn closes(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.bar.close).collect()
    }

    /// Most recent retained row
    pub fn last(&self) -> Option<&FeatureRow> {
        self.rows.last()
    }
}

/// Builds lag, rolling, momentum and range features
#[derive(Debug, Clone, Default)]
pub struct FeatureBuilder {
    config: FeatureConfig,
}

impl FeatureBuilder {
    pub fn new(config: FeatureConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Build features for a bare series, deriving calendar and daily stats
    pub fn build_series(&self, series: &PriceSeries) -> Result<FeatureTable> {
        let calendar: Vec<_> = series
            .bars()
            .iter()
            .map(|b| CalendarAttributes::from_date(b.date))
            .collect();
        let daily_stats: Vec<_> = series.bars().iter().map(DailyStats::from_bar).collect();
        self.build_parts(series, &calendar, &daily_stats)
    }

    /// Build features for a preprocessed series
    pub fn build(&self, input: &PreprocessOutput) -> Result<FeatureTable> {
        self.build_parts(&input.series, &input.calendar, &input.daily_stats)
    }

    fn build_parts(
        &self,
        series: &PriceSeries,
        calendar: &[CalendarAttributes],
        daily_stats: &[DailyStats],
    ) -> Result<FeatureTable> {
        let required = self.config.first_complete_row() + 1;
        if series.len() < required {
            return Err(ForecastError::InsufficientHistory {
                context: "feature windows".to_string(),
                required,
                available: series.len(),
            });
        }

        let bars = series.bars();
        let closes = series.closes();
        let ranges: Vec<f64> = bars.iter().map(|b| b.high - b.low).collect();

        let mut names = Vec::new();
        let mut columns: Vec<Vec<Option<f64>>> = Vec::new();

        for &lag in &self.config.lags {
            names.push(format!("close_lag_{}", lag));
            columns.push(shifted(&closes, lag, |_, past| Some(past)));
        }
        for &w in &self.config.ma_windows {
            names.push(format!("close_MA_{}", w));
            columns.push(rolling_mean(&closes, w)?);
        }
        for &w in &self.config.volatility_windows {
            names.push(format!("close_volatility_{}", w));
            columns.push(rolling_std(&closes, w)?);
        }
        for &p in &self.config.momentum_periods {
            names.push(format!("close_momentum_{}", p));
            columns.push(shifted(&closes, p, |now, past| Some(now - past)));
        }
        for &p in &self.config.momentum_periods {
            names.push(format!("close_roc_{}", p));
            columns.push(shifted(&closes, p, |now, past| {
                (past != 0.0).then(|| (now - past) / past * 100.0)
            }));
        }

        names.push("close_position".to_string());
        let position_col = columns.len();
        columns.push(
            bars.iter()
                .map(|b| {
                    let range = b.high - b.low;
                    (range != 0.0).then(|| (b.close - b.low) / range)
                })
                .collect(),
        );

        for &w in &self.config.range_windows {
            names.push(format!("avg_range_{}", w));
            columns.push(rolling_mean(&ranges, w)?);
        }

        let first = self.config.first_complete_row();
        let mut rows = Vec::with_capacity(bars.len() - first);
        let mut guarded = 0usize;

        for i in first..bars.len() {
            let values: Option<Vec<f64>> = columns.iter().map(|c| c[i]).collect();
            match values {
                Some(values) => rows.push(FeatureRow {
                    bar: bars[i],
                    calendar: calendar[i],
                    daily_stats: daily_stats[i],
                    values,
                }),
                None => {
                    guarded += 1;
                    if columns[position_col][i].is_none() {
                        debug!(date = %bars[i].date, "high equals low, row excluded");
                    } else {
                        debug!(date = %bars[i].date, "zero reference close, row excluded");
                    }
                }
            }
        }

        info!(
            rows = rows.len(),
            warmup_dropped = first,
            division_guarded = guarded,
            features = names.len(),
            "built feature table"
        );

        if rows.is_empty() {
            return Err(ForecastError::EmptyInput(
                "no feature rows survived the division guards".to_string(),
            ));
        }

        Ok(FeatureTable { names, rows })
    }
}

/// Combine each value with the one `offset` rows earlier
fn shifted<F>(values: &[f64], offset: usize, f: F) -> Vec<Option<f64>>
where
    F: Fn(f64, f64) -> Option<f64>,
{
    values
        .iter()
        .enumerate()
        .map(|(i, &now)| {
            if i >= offset {
                f(now, values[i - offset])
            } else {
                None
            }
        })
        .collect()
}
