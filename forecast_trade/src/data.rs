//! Daily OHLCV data handling
//!
//! [`RawBar`] is a row as delivered by the market-data source, with every
//! field optional. [`PriceBar`] and [`PriceSeries`] are the cleaned,
//! validated form produced by the [`Preprocessor`](crate::preprocess::Preprocessor).

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One raw row of a daily price table; `None` marks a null cell
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub date: Option<NaiveDate>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub adjusted_close: Option<f64>,
    pub volume: Option<f64>,
}

impl RawBar {
    /// Build a fully populated raw row
    pub fn complete(
        date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        adjusted_close: f64,
        volume: f64,
    ) -> Self {
        Self {
            date: Some(date),
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
            adjusted_close: Some(adjusted_close),
            volume: Some(volume),
        }
    }

    /// Convert to a [`PriceBar`] if no column is null
    pub fn to_price_bar(&self) -> Option<PriceBar> {
        Some(PriceBar {
            date: self.date?,
            open: self.open?,
            high: self.high?,
            low: self.low?,
            close: self.close?,
            adjusted_close: self.adjusted_close?,
            volume: self.volume?,
        })
    }
}

/// One validated trading day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adjusted_close: f64,
    pub volume: f64,
}

impl PriceBar {
    /// Check the price invariants of a single bar
    pub fn validate(&self) -> Result<()> {
        let prices = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("adjusted_close", self.adjusted_close),
        ];
        for (name, value) in prices {
            if !value.is_finite() || value <= 0.0 {
                return Err(ForecastError::CorruptInput {
                    date: self.date,
                    reason: format!("{} must be a positive number, got {}", name, value),
                });
            }
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(ForecastError::CorruptInput {
                date: self.date,
                reason: format!("volume must be non-negative, got {}", self.volume),
            });
        }
        if self.high < self.low {
            return Err(ForecastError::CorruptInput {
                date: self.date,
                reason: format!("high {} is below low {}", self.high, self.low),
            });
        }
        Ok(())
    }
}

/// Date-ordered series of daily bars with unique dates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Create a series, checking bars are valid and strictly increasing by date
    pub fn new(bars: Vec<PriceBar>) -> Result<Self> {
        for bar in &bars {
            bar.validate()?;
        }
        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(ForecastError::CorruptInput {
                    date: pair[1].date,
                    reason: format!("date is not after the previous row ({})", pair[0].date),
                });
            }
        }
        Ok(Self { bars })
    }

    /// Number of bars
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Whether the series has no bars
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// All bars in date order
    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    /// Close prices in date order
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Dates in order
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    /// Most recent bar
    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    /// Bar for an exact date
    pub fn get(&self, date: NaiveDate) -> Option<&PriceBar> {
        self.bars
            .binary_search_by_key(&date, |b| b.date)
            .ok()
            .map(|i| &self.bars[i])
    }

    /// Bars with a date on or before `date`
    pub fn up_to(&self, date: NaiveDate) -> &[PriceBar] {
        let end = self.bars.partition_point(|b| b.date <= date);
        &self.bars[..end]
    }
}

/// Data loader for raw daily price tables
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load a raw OHLCV table from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<RawBar>> {
        let df = CsvReader::from_path(path.as_ref())?
            .has_header(true)
            .finish()?;

        Self::from_dataframe(&df)
    }

    /// Convert an existing DataFrame into raw rows
    pub fn from_dataframe(df: &DataFrame) -> Result<Vec<RawBar>> {
        let date_column = Self::find_column(df, &["date", "timestamp", "time"])?;
        let dates = Self::date_values(df, &date_column)?;

        let open = Self::float_values(df, &Self::find_column(df, &["open"])?)?;
        let high = Self::float_values(df, &Self::find_column(df, &["high"])?)?;
        let low = Self::float_values(df, &Self::find_column(df, &["low"])?)?;
        let close = Self::float_values(df, &Self::find_column(df, &["close", "price"])?)?;
        let volume = Self::float_values(df, &Self::find_column(df, &["volume", "vol"])?)?;

        // Without an adjusted column the close is already the adjusted price
        let adjusted_close =
            match Self::find_column(df, &["adj close", "adj_close", "adjusted_close"]) {
                Ok(name) => Self::float_values(df, &name)?,
                Err(_) => close.clone(),
            };

        let rows = (0..df.height())
            .map(|i| RawBar {
                date: dates[i],
                open: open[i],
                high: high[i],
                low: low[i],
                close: close[i],
                adjusted_close: adjusted_close[i],
                volume: volume[i],
            })
            .collect();

        Ok(rows)
    }

    /// Find a column by case-insensitive name, exact matches first
    fn find_column(df: &DataFrame, candidates: &[&str]) -> Result<String> {
        let column_names = df.get_column_names();

        for candidate in candidates {
            for name in &column_names {
                if name.to_lowercase() == *candidate {
                    return Ok(name.to_string());
                }
            }
        }

        // Close must not match "Adj Close"
        for candidate in candidates {
            for name in &column_names {
                let lower = name.to_lowercase();
                if lower.contains(candidate) && !lower.starts_with("adj") {
                    return Ok(name.to_string());
                }
            }
        }

        Err(ForecastError::DataError(format!(
            "No column matching {:?} found in data",
            candidates
        )))
    }

    /// Read a numeric column as `f64`, mapping nulls and non-finite values to `None`
    fn float_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
        let series = df.column(name)?.cast(&DataType::Float64)?;
        let values = series
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();
        Ok(values)
    }

    /// Read a date column, accepting date, datetime or text cells
    fn date_values(df: &DataFrame, name: &str) -> Result<Vec<Option<NaiveDate>>> {
        let series = df.column(name)?.cast(&DataType::Utf8)?;
        let values = series
            .utf8()?
            .into_iter()
            .map(|cell| cell.and_then(parse_date))
            .collect();
        Ok(values)
    }
}

/// Parse the calendar day at the start of a date or datetime string
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let day = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            adjusted_close: close,
            volume: 1000.0,
        }
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 5, 17);
        assert_eq!(parse_date("2023-05-17"), expected);
        assert_eq!(parse_date("2023-05-17 00:00:00"), expected);
        assert_eq!(parse_date(" 2023-05-17T00:00:00.000 "), expected);
        assert_eq!(parse_date("17/05/2023"), None);
    }

    #[test]
    fn test_raw_bar_with_null_is_rejected() {
        let mut raw = RawBar::complete(
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            1.0,
            2.0,
            0.5,
            1.5,
            1.5,
            10.0,
        );
        assert!(raw.to_price_bar().is_some());

        raw.volume = None;
        assert!(raw.to_price_bar().is_none());
    }

    #[test]
    fn test_series_requires_increasing_dates() {
        let result = PriceSeries::new(vec![bar(2, 10.0), bar(2, 11.0)]);
        assert!(matches!(result, Err(ForecastError::CorruptInput { .. })));

        let result = PriceSeries::new(vec![bar(3, 10.0), bar(2, 11.0)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_bar_validation() {
        let mut b = bar(2, 10.0);
        b.close = -1.0;
        assert!(b.validate().is_err());

        let mut b = bar(2, 10.0);
        b.high = 5.0;
        assert!(b.validate().is_err());

        let mut b = bar(2, 10.0);
        b.volume = -3.0;
        assert!(b.validate().is_err());
    }

    #[test]
    fn test_series_lookup() {
        let series = PriceSeries::new(vec![bar(2, 10.0), bar(3, 11.0), bar(5, 12.0)]).unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series.closes(), vec![10.0, 11.0, 12.0]);
        assert_eq!(
            series.get(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()).map(|b| b.close),
            Some(11.0)
        );
        assert!(series.get(NaiveDate::from_ymd_opt(2024, 1, 4).unwrap()).is_none());
        assert_eq!(
            series.up_to(NaiveDate::from_ymd_opt(2024, 1, 4).unwrap()).len(),
            2
        );
    }

    #[test]
    fn test_from_dataframe_keeps_nulls() {
        let df = polars::df!(
            "Date" => &["2024-01-02", "2024-01-03", "2024-01-04"],
            "Open" => &[Some(10.0), Some(11.0), Some(12.0)],
            "High" => &[Some(11.0), Some(12.0), Some(13.0)],
            "Low" => &[Some(9.0), Some(10.0), Some(11.0)],
            "Close" => &[Some(10.5), None, Some(12.5)],
            "Adj Close" => &[Some(10.4), Some(11.4), Some(12.4)],
            "Volume" => &[Some(100i64), Some(200), Some(300)]
        )
        .unwrap();

        let rows = DataLoader::from_dataframe(&df).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].close, Some(10.5));
        assert_eq!(rows[0].adjusted_close, Some(10.4));
        assert_eq!(rows[1].close, None);
        assert_eq!(rows[2].volume, Some(300.0));
        assert_eq!(rows[2].date, NaiveDate::from_ymd_opt(2024, 1, 4));
    }

    #[test]
    fn test_missing_column_is_data_error() {
        let df = polars::df!(
            "Date" => &["2024-01-02"],
            "Close" => &[1.0]
        )
        .unwrap();

        assert!(matches!(
            DataLoader::from_dataframe(&df),
            Err(ForecastError::DataError(_))
        ));
    }
}
