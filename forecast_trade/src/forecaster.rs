//! Forward next-day forecast with trend and confidence labels

use crate::data::PriceBar;
use crate::error::{ForecastError, Result};
use crate::models::ForecastModel;
use crate::prediction::{Prediction, PredictionStore};
use chrono::{Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// How far the winning model can be trusted, from its MAPE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// `High` below 1%, `Medium` below 2%, `Low` otherwise
    pub fn from_mape(mape: f64) -> Self {
        if mape < 1.0 {
            Confidence::High
        } else if mape < 2.0 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

/// Size of the expected move, for the human-readable report.
///
/// Coarser than [`crate::prediction::Trend`]: moves under 0.5% read as
/// stable and moves beyond 2% as strong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outlook {
    Stable,
    ModerateUp,
    ModerateDown,
    StrongUp,
    StrongDown,
}

impl Outlook {
    pub fn from_change_pct(change_pct: f64) -> Self {
        if change_pct.abs() < 0.5 {
            Outlook::Stable
        } else if change_pct > 2.0 {
            Outlook::StrongUp
        } else if change_pct > 0.0 {
            Outlook::ModerateUp
        } else if change_pct < -2.0 {
            Outlook::StrongDown
        } else {
            Outlook::ModerateDown
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Outlook::Stable => "Price expected to stay stable, with little movement.",
            Outlook::ModerateUp => "Moderate rise expected, short-term trend is positive.",
            Outlook::ModerateDown => "Moderate fall expected, short-term trend is negative.",
            Outlook::StrongUp => "Strong rise expected.",
            Outlook::StrongDown => "Strong fall expected.",
        }
    }
}

/// A forward prediction with its confidence label
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub prediction: Prediction,
    pub confidence: Confidence,
}

impl Forecast {
    /// Band of the expected percentage change
    pub fn interpretation(&self) -> Outlook {
        Outlook::from_change_pct(self.prediction.change_pct)
    }

    /// Plain-text summary of the forecast
    pub fn report(&self) -> String {
        let p = &self.prediction;
        format!(
            "Forecast for {target}\n\
             Model:            {model} (MAPE {mape:.2}%, {confidence:?} confidence)\n\
             Current price:    {current:.2}\n\
             Predicted price:  {predicted:.2}\n\
             Expected change:  {change:+.2} ({change_pct:+.2}%)\n\
             Trend:            {trend:?}\n\
             {outlook}\n",
            target = p.target_date,
            model = p.model_name,
            mape = p.model_mape,
            confidence = self.confidence,
            current = p.current_price,
            predicted = p.predicted_price,
            change = p.change_abs,
            change_pct = p.change_pct,
            trend = p.trend,
            outlook = self.interpretation().description(),
        )
    }
}

/// Produces the prediction for the day after the latest close
#[derive(Debug, Clone)]
pub struct Forecaster {
    model_name: String,
    model_mape: f64,
}

impl Forecaster {
    pub fn new(model_name: impl Into<String>, model_mape: f64) -> Self {
        Self {
            model_name: model_name.into(),
            model_mape,
        }
    }

    /// Forecast the next close, stamped with the current time
    pub fn forecast(&self, model: &dyn ForecastModel, current: &PriceBar) -> Result<Forecast> {
        self.forecast_at(model, current, Utc::now().naive_utc())
    }

    /// Forecast the next close with an explicit prediction timestamp.
    ///
    /// The model's history must end with `current.close`.
    pub fn forecast_at(
        &self,
        model: &dyn ForecastModel,
        current: &PriceBar,
        timestamp: NaiveDateTime,
    ) -> Result<Forecast> {
        if model.history().last() != Some(&current.close) {
            return Err(ForecastError::DataError(format!(
                "{} history does not end at the close of {}",
                model.name(),
                current.date
            )));
        }

        let predicted = model.predict_next()?;
        let prediction = Prediction::new(
            timestamp,
            current.date + Duration::days(1),
            current.close,
            predicted,
            self.model_name.clone(),
            self.model_mape,
        )?;

        Ok(Forecast {
            prediction,
            confidence: Confidence::from_mape(self.model_mape),
        })
    }

    /// Forecast and append the record to `store`
    pub fn publish_at(
        &self,
        model: &dyn ForecastModel,
        current: &PriceBar,
        timestamp: NaiveDateTime,
        store: &mut dyn PredictionStore,
    ) -> Result<Forecast> {
        let mut forecast = self.forecast_at(model, current, timestamp)?;
        let id = store.append(forecast.prediction.clone())?;
        forecast.prediction.id = Some(id);

        let p = &forecast.prediction;
        info!(
            id,
            target_date = %p.target_date,
            current = p.current_price,
            predicted = p.predicted_price,
            change_pct = p.change_pct,
            trend = ?p.trend,
            confidence = ?forecast.confidence,
            model = %p.model_name,
            "stored forecast"
        );
        Ok(forecast)
    }
}
