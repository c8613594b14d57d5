mod common;

use common::noisy_series;
use forecast_trade::config::BacktestConfig;
use forecast_trade::models::arima::ArimaOrder;
use forecast_trade::prediction::merge_by_target_date;
use forecast_trade::{run_backtest_with, Trend};

fn config() -> BacktestConfig {
    BacktestConfig {
        window_days: 20,
        min_train_days: 252,
        order: ArimaOrder::default(),
        evaluation_ratio: 0.2,
    }
}

#[test]
fn test_noisy_backtest_records() {
    let series = noisy_series(320, 42);
    let report = run_backtest_with(&series, &config()).unwrap();

    assert_eq!(report.records.len() + report.skipped.len(), 20);
    assert!(!report.records.is_empty());

    for record in &report.records {
        let today = record.prediction_timestamp.date();
        let current = series.get(today).unwrap();
        let next = series.get(record.target_date).unwrap();
        assert!(record.target_date > today);
        assert_eq!(record.current_price, current.close);

        let real = record.real_price.unwrap();
        assert_eq!(real, next.close);
        assert_eq!(record.error_abs, Some(record.predicted_price - real));
        assert!(record.model_mape.is_finite() && record.model_mape > 0.0);

        let expected = Trend::from_change_pct(record.change_pct);
        assert_eq!(record.trend, expected);
    }

    let summary = report.summary().unwrap();
    assert_eq!(summary.count, report.records.len());
    assert!(summary.within_1_pct <= summary.within_2_pct);
    assert!((0.0..=100.0).contains(&summary.trend_accuracy));
}

#[test]
fn test_backtest_is_deterministic() {
    let series = noisy_series(300, 9);
    let first = run_backtest_with(&series, &config()).unwrap();
    let second = run_backtest_with(&series, &config()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_merging_backtest_twice_changes_nothing() {
    let series = noisy_series(300, 1);
    let report = run_backtest_with(&series, &config()).unwrap();

    let once = merge_by_target_date(Vec::new(), report.records.clone());
    let twice = merge_by_target_date(once.clone(), report.records);
    assert_eq!(once, twice);
    assert!(once.windows(2).all(|w| w[0].target_date < w[1].target_date));
}
