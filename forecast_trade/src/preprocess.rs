//! Cleaning and calendar enrichment of raw daily price tables

use crate::data::{PriceBar, PriceSeries, RawBar};
use crate::error::{ForecastError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Calendar attributes of a trading day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarAttributes {
    /// Monday = 0 ... Sunday = 6
    pub day_of_week: u32,
    pub month: u32,
    pub quarter: u32,
    pub day_of_month: u32,
    /// ISO 8601 week number
    pub week_of_year: u32,
}

impl CalendarAttributes {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            day_of_week: date.weekday().num_days_from_monday(),
            month: date.month(),
            quarter: (date.month() - 1) / 3 + 1,
            day_of_month: date.day(),
            week_of_year: date.iso_week().week(),
        }
    }
}

/// Per-day summary statistics of a bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyStats {
    /// high - low
    pub intraday_range: f64,
    /// Range as a percentage of the open
    pub intraday_range_pct: f64,
    /// Mean of open, high, low, close
    pub mean_price: f64,
    /// Median of open, high, low, close
    pub median_price: f64,
}

impl DailyStats {
    pub fn from_bar(bar: &PriceBar) -> Self {
        let intraday_range = bar.high - bar.low;

        let mut ohlc = [bar.open, bar.high, bar.low, bar.close];
        ohlc.sort_by(|a, b| a.total_cmp(b));

        Self {
            intraday_range,
            intraday_range_pct: intraday_range / bar.open * 100.0,
            mean_price: ohlc.iter().sum::<f64>() / 4.0,
            median_price: (ohlc[1] + ohlc[2]) / 2.0,
        }
    }
}

/// Cleaned series with its per-row attributes
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessOutput {
    pub series: PriceSeries,
    /// Aligned with `series.bars()`
    pub calendar: Vec<CalendarAttributes>,
    /// Aligned with `series.bars()`
    pub daily_stats: Vec<DailyStats>,
    /// Rows removed for null cells or as identical duplicates
    pub dropped_rows: usize,
}

/// Drops incomplete rows, orders by date and adds calendar attributes.
///
/// Nulls are never imputed: a row with any missing cell is removed.
#[derive(Debug, Clone, Default)]
pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Clean a raw table into a validated series
    pub fn run(&self, raw: &[RawBar]) -> Result<PreprocessOutput> {
        let mut bars: Vec<PriceBar> = raw.iter().filter_map(RawBar::to_price_bar).collect();
        let null_rows = raw.len() - bars.len();
        if null_rows > 0 {
            info!(null_rows, "removed rows with null values");
        }

        if bars.is_empty() {
            return Err(ForecastError::EmptyInput(format!(
                "no complete rows among {} raw rows",
                raw.len()
            )));
        }

        bars.sort_by_key(|b| b.date);
        let before_dedup = bars.len();
        bars = Self::collapse_duplicates(bars)?;
        let duplicate_rows = before_dedup - bars.len();
        if duplicate_rows > 0 {
            debug!(duplicate_rows, "collapsed identical duplicate dates");
        }

        let series = PriceSeries::new(bars)?;
        let calendar = series
            .bars()
            .iter()
            .map(|b| CalendarAttributes::from_date(b.date))
            .collect();
        let daily_stats = series.bars().iter().map(DailyStats::from_bar).collect();

        info!(rows = series.len(), "cleaned price series");

        Ok(PreprocessOutput {
            series,
            calendar,
            daily_stats,
            dropped_rows: null_rows + duplicate_rows,
        })
    }

    /// Clean a raw table and return only the series
    pub fn clean(&self, raw: &[RawBar]) -> Result<PriceSeries> {
        Ok(self.run(raw)?.series)
    }

    fn collapse_duplicates(sorted: Vec<PriceBar>) -> Result<Vec<PriceBar>> {
        let mut out: Vec<PriceBar> = Vec::with_capacity(sorted.len());
        for bar in sorted {
            match out.last() {
                Some(prev) if prev.date == bar.date => {
                    if *prev != bar {
                        return Err(ForecastError::CorruptInput {
                            date: bar.date,
                            reason: "duplicate date with conflicting values".to_string(),
                        });
                    }
                }
                _ => out.push(bar),
            }
        }
        Ok(out)
    }
}
