use forecast_trade::{DataLoader, ForecastError, Preprocessor};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_load_and_clean_csv() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "date,open,high,low,close,volume").unwrap();
    writeln!(file, "2024-01-03,10.5,11.0,10.0,10.8,100").unwrap();
    writeln!(file, "2024-01-02,10.1,10.6,9.9,10.4,120").unwrap();
    writeln!(file, "2024-01-04,10.8,,10.5,10.9,90").unwrap();

    let raw = DataLoader::from_csv(file.path()).unwrap();
    assert_eq!(raw.len(), 3);
    assert_eq!(raw[2].high, None);
    // adjusted close falls back to the close
    assert_eq!(raw[0].adjusted_close, Some(10.8));

    let output = Preprocessor::new().run(&raw).unwrap();
    assert_eq!(output.series.closes(), vec![10.4, 10.8]);
    assert_eq!(output.dropped_rows, 1);
    assert_eq!(output.calendar[0].day_of_week, 1);
}

#[test]
fn test_missing_column() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "date,open,high,low,volume").unwrap();
    writeln!(file, "2024-01-03,10.5,11.0,10.0,100").unwrap();

    let err = DataLoader::from_csv(file.path()).unwrap_err();
    assert!(matches!(err, ForecastError::DataError(_)));
}

#[test]
fn test_conflicting_duplicates_abort() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "date,open,high,low,close,volume").unwrap();
    writeln!(file, "2024-01-03,10.5,11.0,10.0,10.8,100").unwrap();
    writeln!(file, "2024-01-03,10.5,11.0,10.0,10.9,100").unwrap();

    let raw = DataLoader::from_csv(file.path()).unwrap();
    let err = Preprocessor::new().run(&raw).unwrap_err();
    assert!(matches!(err, ForecastError::CorruptInput { .. }));
    assert!(err.to_string().contains("2024-01-03"));
}
