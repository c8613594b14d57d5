//! Forecast and backtest a synthetic daily series.
//!
//! Run with `cargo run -p forecast_trade --example basic_forecast`.

use chrono::{Duration, NaiveDate};
use forecast_trade::{
    ForecastError, ForecastPipeline, InMemoryPredictionStore, PipelineConfig, PredictionStore, RawBar,
};

fn main() -> forecast_trade::Result<()> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2)
        .ok_or_else(|| ForecastError::InvalidParameter("bad start date".to_string()))?;
    let raw: Vec<RawBar> = (0..400)
        .map(|i| {
            let t = i as f64;
            let close = 75.0 + 0.05 * t + 2.0 * (t / 9.0).sin();
            RawBar::complete(
                start + Duration::days(i),
                close - 0.3,
                close + 0.8,
                close - 0.9,
                close,
                close,
                10_000.0,
            )
        })
        .collect();

    let pipeline = ForecastPipeline::from_raw(&raw, PipelineConfig::default())?;

    for entry in &pipeline.rank_models()?.entries {
        println!(
            "{:<20} MAPE {:>7.4}  MAE {:>7.4}  R2 {:>7.4}",
            entry.name, entry.metrics.mape, entry.metrics.mae, entry.metrics.r2
        );
    }

    let mut store = InMemoryPredictionStore::new();
    let forecast = pipeline.forecast(&mut store)?;
    println!("\n{}", forecast.report());

    let report = pipeline.backtest_into(&mut store)?;
    if let Some(summary) = report.summary() {
        println!(
            "\nbacktest: {} days, MAPE {:.3}%, within 1% {:.1}%, trend accuracy {:.1}%",
            summary.count, summary.mean_abs_pct_error, summary.within_1_pct, summary.trend_accuracy
        );
    }
    println!("history holds {} predictions", store.all()?.len());

    Ok(())
}
