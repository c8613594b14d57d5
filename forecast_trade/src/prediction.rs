//! Prediction records and the append-only prediction history

use crate::data::PriceSeries;
use crate::error::{ForecastError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Dead-band, in percent, inside which a move counts as stable
pub const TREND_DEAD_BAND_PCT: f64 = 0.1;

/// Direction of a predicted or realised move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl Trend {
    /// Classify a percentage change with a symmetric ±0.1% dead-band
    pub fn from_change_pct(change_pct: f64) -> Self {
        if change_pct > TREND_DEAD_BAND_PCT {
            Trend::Up
        } else if change_pct < -TREND_DEAD_BAND_PCT {
            Trend::Down
        } else {
            Trend::Stable
        }
    }
}

/// One forecast event, forward or backtest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Assigned by the store
    pub id: Option<u64>,
    pub prediction_timestamp: NaiveDateTime,
    pub target_date: NaiveDate,
    pub current_price: f64,
    pub predicted_price: f64,
    pub change_abs: f64,
    pub change_pct: f64,
    pub trend: Trend,
    pub model_name: String,
    pub model_mape: f64,
    pub real_price: Option<f64>,
    pub error_abs: Option<f64>,
    pub error_pct: Option<f64>,
}

impl Prediction {
    /// Build a record, deriving the change and trend from the two prices
    pub fn new(
        prediction_timestamp: NaiveDateTime,
        target_date: NaiveDate,
        current_price: f64,
        predicted_price: f64,
        model_name: impl Into<String>,
        model_mape: f64,
    ) -> Result<Self> {
        if current_price == 0.0 {
            return Err(ForecastError::DivisionGuard(format!(
                "current price is zero for target {}",
                target_date
            )));
        }

        let change_abs = predicted_price - current_price;
        let change_pct = change_abs / current_price * 100.0;

        Ok(Self {
            id: None,
            prediction_timestamp,
            target_date,
            current_price,
            predicted_price,
            change_abs,
            change_pct,
            trend: Trend::from_change_pct(change_pct),
            model_name: model_name.into(),
            model_mape,
            real_price: None,
            error_abs: None,
            error_pct: None,
        })
    }

    /// Record the realised close and the error against it.
    ///
    /// `error_pct` stays empty when the realised close is zero.
    pub fn annotate(&mut self, real_price: f64) {
        let error_abs = self.predicted_price - real_price;
        self.real_price = Some(real_price);
        self.error_abs = Some(error_abs);
        self.error_pct = (real_price != 0.0).then(|| error_abs / real_price * 100.0);
    }

    /// Trend that actually happened, once the real price is known
    pub fn realised_trend(&self) -> Option<Trend> {
        let real = self.real_price?;
        Some(Trend::from_change_pct(
            (real - self.current_price) / self.current_price * 100.0,
        ))
    }
}

/// Combine `incoming` into `existing`, one record per target date.
///
/// A later write replaces an earlier one for the same target date and takes
/// over its id, so merging the same records twice changes nothing. The
/// result is sorted by target date.
pub fn merge_by_target_date(
    existing: Vec<Prediction>,
    incoming: Vec<Prediction>,
) -> Vec<Prediction> {
    let mut next_id = existing
        .iter()
        .chain(&incoming)
        .filter_map(|p| p.id)
        .max()
        .map_or(1, |id| id + 1);

    let mut merged: Vec<Prediction> = Vec::with_capacity(existing.len() + incoming.len());
    for record in existing.into_iter().chain(incoming) {
        match merged.iter_mut().find(|p| p.target_date == record.target_date) {
            Some(slot) => {
                let id = record.id.or(slot.id);
                *slot = record;
                slot.id = id;
            }
            None => merged.push(record),
        }
    }

    for record in merged.iter_mut().filter(|p| p.id.is_none()) {
        record.id = Some(next_id);
        next_id += 1;
    }

    merged.sort_by_key(|p| p.target_date);
    merged
}

/// Storage for the prediction history
pub trait PredictionStore {
    /// Append a record, returning its id
    fn append(&mut self, prediction: Prediction) -> Result<u64>;

    /// Every stored record in stored order
    fn all(&self) -> Result<Vec<Prediction>>;

    /// Set the realised close of record `id`; repeating the call is harmless
    fn update_real_price(&mut self, id: u64, real_price: f64) -> Result<Prediction>;

    /// Merge backtest output, see [`merge_by_target_date`]
    fn merge_by_target_date(&mut self, records: Vec<Prediction>) -> Result<()>;

    /// Records whose target date lies in `[start, end]`
    fn query_by_date_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Prediction>> {
        Ok(self
            .all()?
            .into_iter()
            .filter(|p| p.target_date >= start && p.target_date <= end)
            .collect())
    }

    /// Records still waiting for their real close
    fn pending_real_price(&self) -> Result<Vec<Prediction>> {
        Ok(self
            .all()?
            .into_iter()
            .filter(|p| p.real_price.is_none())
            .collect())
    }

    /// Fill the real close of every pending record whose target date is in
    /// `series`. Returns the number of records updated.
    fn annotate_from_series(&mut self, series: &PriceSeries) -> Result<usize> {
        let mut updated = 0;
        for pending in self.pending_real_price()? {
            let (Some(id), Some(bar)) = (pending.id, series.get(pending.target_date)) else {
                continue;
            };
            self.update_real_price(id, bar.close)?;
            updated += 1;
        }
        if updated > 0 {
            info!(updated, "annotated predictions with real prices");
        }
        Ok(updated)
    }
}

fn annotate_in(records: &mut [Prediction], id: u64, real_price: f64) -> Result<Prediction> {
    let record = records
        .iter_mut()
        .find(|p| p.id == Some(id))
        .ok_or_else(|| ForecastError::DataError(format!("no prediction with id {}", id)))?;
    record.annotate(real_price);
    Ok(record.clone())
}

fn next_id(records: &[Prediction]) -> u64 {
    records.iter().filter_map(|p| p.id).max().map_or(1, |id| id + 1)
}

/// Prediction history kept in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryPredictionStore {
    records: Vec<Prediction>,
}

impl InMemoryPredictionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl PredictionStore for InMemoryPredictionStore {
    fn append(&mut self, mut prediction: Prediction) -> Result<u64> {
        let id = next_id(&self.records);
        prediction.id = Some(id);
        self.records.push(prediction);
        Ok(id)
    }

    fn all(&self) -> Result<Vec<Prediction>> {
        Ok(self.records.clone())
    }

    fn update_real_price(&mut self, id: u64, real_price: f64) -> Result<Prediction> {
        annotate_in(&mut self.records, id, real_price)
    }

    fn merge_by_target_date(&mut self, records: Vec<Prediction>) -> Result<()> {
        let existing = std::mem::take(&mut self.records);
        self.records = merge_by_target_date(existing, records);
        Ok(())
    }
}

/// Prediction history in a CSV file.
///
/// Appends add one line; annotation and merging rewrite the file.
#[derive(Debug, Clone)]
pub struct CsvPredictionStore {
    path: PathBuf,
}

impl CsvPredictionStore {
    /// Use the CSV file at `path`, created on first append
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn has_records(&self) -> bool {
        std::fs::metadata(&self.path)
            .map(|m| m.len() > 0)
            .unwrap_or(false)
    }

    fn rewrite(&self, records: &[Prediction]) -> Result<()> {
        let mut writer = csv::Writer::from_path(&self.path)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        debug!(path = %self.path.display(), rows = records.len(), "rewrote prediction history");
        Ok(())
    }
}

impl PredictionStore for CsvPredictionStore {
    fn append(&mut self, mut prediction: Prediction) -> Result<u64> {
        let id = next_id(&self.all()?);
        prediction.id = Some(id);

        let write_header = !self.has_records();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(file);
        writer.serialize(&prediction)?;
        writer.flush()?;

        Ok(id)
    }

    fn all(&self) -> Result<Vec<Prediction>> {
        if !self.has_records() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let records = reader
            .deserialize()
            .collect::<std::result::Result<Vec<Prediction>, _>>()?;
        Ok(records)
    }

    fn update_real_price(&mut self, id: u64, real_price: f64) -> Result<Prediction> {
        let mut records = self.all()?;
        let updated = annotate_in(&mut records, id, real_price)?;
        self.rewrite(&records)?;
        Ok(updated)
    }

    fn merge_by_target_date(&mut self, records: Vec<Prediction>) -> Result<()> {
        let merged = merge_by_target_date(self.all()?, records);
        self.rewrite(&merged)
    }
}
