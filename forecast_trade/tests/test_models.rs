mod common;

use common::{linear_series, noisy_series};
use forecast_trade::models::arima::ArimaOrder;
use forecast_trade::{rank_models, ForecastError, ModelSpec, PipelineConfig};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_config_file_with_hybrid() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
train_ratio = 0.8

[[models]]
kind = "moving_average"
window = 7

[[models]]
kind = "hybrid"
weights = [1.0, 3.0]

[[models.members]]
kind = "moving_average"
window = 7

[[models.members]]
kind = "arima"
p = 5
d = 1
q = 0
"#
    )
    .unwrap();

    let config = PipelineConfig::from_file(file.path()).unwrap();
    assert_eq!(config.models.len(), 2);
    assert_eq!(
        config.models[1],
        ModelSpec::Hybrid {
            members: vec![
                ModelSpec::MovingAverage { window: 7 },
                ModelSpec::Arima(ArimaOrder::default()),
            ],
            weights: Some(vec![1.0, 3.0]),
        }
    );

    // on a linear trend the hybrid inherits a quarter of the MA lag
    let ranking = rank_models(&linear_series(300), &config).unwrap();
    assert_eq!(
        ranking.winner().unwrap().name,
        "hybrid[moving_average(7)+arima(5,1,0)]"
    );
    let hybrid_mape = ranking.entries[0].metrics.mape;
    let ma_mape = ranking.entries[1].metrics.mape;
    assert!((hybrid_mape - ma_mape / 4.0).abs() < 1e-3);
}

#[test]
fn test_noisy_ranking_is_sorted() {
    let ranking = rank_models(&noisy_series(260, 21), &PipelineConfig::default()).unwrap();

    assert_eq!(ranking.entries.len(), 2);
    assert!(ranking.entries[0].metrics.mape <= ranking.entries[1].metrics.mape);
    for (_, metrics) in ranking.metrics() {
        assert!(metrics.mape > 0.0 && metrics.mape < 10.0);
        assert!(metrics.rmse >= metrics.mae);
    }
}

#[test]
fn test_insufficient_rows_for_features() {
    let err = rank_models(&linear_series(40), &PipelineConfig::default()).unwrap_err();
    assert!(matches!(err, ForecastError::InsufficientHistory { .. }));
}

#[test]
fn test_invalid_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[[models]]\nkind = \"arima\"\np = 5\nd = 1\nq = 1\n").unwrap();

    let err = PipelineConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err, ForecastError::InvalidParameter(_)));
}
