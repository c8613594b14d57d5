#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use forecast_trade::{PriceBar, PriceSeries, RawBar};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
}

/// Daily bars whose close rises by $1/day from $100
pub fn linear_bars(n: usize) -> Vec<PriceBar> {
    (0..n)
        .map(|i| {
            let close = 100.0 + i as f64;
            PriceBar {
                date: start_date() + Duration::days(i as i64),
                open: close - 0.5,
                high: close + 1.0,
                low: close - 1.0,
                close,
                adjusted_close: close,
                volume: 1_000.0,
            }
        })
        .collect()
}

pub fn linear_series(n: usize) -> PriceSeries {
    PriceSeries::new(linear_bars(n)).unwrap()
}

/// Seeded random walk with drift around $80
pub fn noisy_series(n: usize, seed: u64) -> PriceSeries {
    let mut rng = StdRng::seed_from_u64(seed);
    let returns = Normal::new(0.0005_f64, 0.01).unwrap();
    let wicks = Normal::new(0.0_f64, 0.004).unwrap();

    let mut close: f64 = 80.0;
    let bars = (0..n)
        .map(|i| {
            let open = close;
            close *= 1.0 + returns.sample(&mut rng);
            let high = open.max(close) * (1.0 + wicks.sample(&mut rng).abs() + 0.001);
            let low = open.min(close) * (1.0 - wicks.sample(&mut rng).abs() - 0.001);
            PriceBar {
                date: start_date() + Duration::days(i as i64),
                open,
                high,
                low,
                close,
                adjusted_close: close,
                volume: 5_000.0 + i as f64,
            }
        })
        .collect();
    PriceSeries::new(bars).unwrap()
}

pub fn to_raw(bars: &[PriceBar]) -> Vec<RawBar> {
    bars.iter()
        .map(|b| RawBar::complete(b.date, b.open, b.high, b.low, b.close, b.adjusted_close, b.volume))
        .collect()
}
