//! Integration tests: round-trip every pipeline table through Parquet.

use std::path::Path;

use hindcast_io::{
    AdminCode, AdminLink, ClimatologyRecord, Compression, CorrectedForecast, ForecastRecord,
    Granularity, GridPoint, IoError, Location, MemberBias, ProbabilityRecord, QuantileSet,
    ReanalysisOutcome, WriterConfig, read_climatology, read_corrected, read_forecast,
    read_member_bias, read_probabilities, read_reanalysis_outcomes, read_reference_grid,
    write_climatology, write_corrected, write_forecast, write_member_bias, write_probabilities,
    write_reanalysis_outcomes, write_reference_grid,
};
use tempfile::tempdir;

fn pixel(lat: f64, lon: f64) -> Location {
    Location::Pixel(GridPoint::new(lat, lon))
}

fn admin(code: &str) -> Location {
    Location::Admin(AdminCode::new(code))
}

fn forecasts(location: Location) -> Vec<ForecastRecord> {
    (0..3)
        .map(|i| ForecastRecord {
            location: location.clone(),
            number: i,
            year: 2000 + i as i32,
            month: 3,
            lead_time: 1,
            tp_mm_day: 1.5 * f64::from(i),
        })
        .collect()
}

#[test]
fn reference_grid_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("reference_grid.parquet");
    let p = GridPoint::new(12.5, 15.0);
    let links = vec![
        AdminLink {
            point: p,
            adm_pcode: AdminCode::new("TD01"),
        },
        AdminLink {
            point: p,
            adm_pcode: AdminCode::new("TD02"),
        },
    ];
    write_reference_grid(&path, &links, &WriterConfig::default()).unwrap();
    let back = read_reference_grid(&path).unwrap();
    assert_eq!(back, links);
    assert_eq!(back[0].point.latitude(), 12.5);
}

#[test]
fn forecast_roundtrip_pixel_and_admin() {
    let dir = tempdir().unwrap();
    for (granularity, records) in [
        (Granularity::Pixel, forecasts(pixel(1.0, 2.0))),
        (Granularity::Admin, forecasts(admin("TD01"))),
    ] {
        let path = dir.path().join(format!("forecast_{granularity}.parquet"));
        write_forecast(&path, granularity, &records, &WriterConfig::default()).unwrap();
        let back = read_forecast(&path, granularity).unwrap();
        assert_eq!(back, records);
    }
}

#[test]
fn every_compression_roundtrips() {
    let dir = tempdir().unwrap();
    let records = forecasts(admin("TD01"));
    for (i, compression) in [
        Compression::None,
        Compression::Snappy,
        Compression::Gzip,
        Compression::Zstd,
    ]
    .into_iter()
    .enumerate()
    {
        let path = dir.path().join(format!("forecast_{i}.parquet"));
        let config = WriterConfig::default()
            .with_compression(compression)
            .with_row_group_size(2);
        write_forecast(&path, Granularity::Admin, &records, &config).unwrap();
        assert_eq!(read_forecast(&path, Granularity::Admin).unwrap(), records);
    }
}

#[test]
fn granularity_mismatch_on_read() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("forecast_pixel.parquet");
    write_forecast(
        &path,
        Granularity::Pixel,
        &forecasts(pixel(1.0, 2.0)),
        &WriterConfig::default(),
    )
    .unwrap();
    let err = read_forecast(&path, Granularity::Admin).unwrap_err();
    assert!(matches!(err, IoError::GranularityMismatch { .. }));
}

#[test]
fn granularity_mismatch_on_write() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("forecast_admin.parquet");
    let err = write_forecast(
        &path,
        Granularity::Admin,
        &forecasts(pixel(1.0, 2.0)),
        &WriterConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, IoError::GranularityMismatch { .. }));
}

#[test]
fn climatology_and_outcomes_roundtrip() {
    let dir = tempdir().unwrap();
    let quantiles = QuantileSet::standard();

    let climatology = vec![ClimatologyRecord {
        location: pixel(1.0, 2.0),
        month: 7,
        mean: 3.0,
        thresholds: vec![2.5, 2.0, 1.8, 1.5],
    }];
    let path = dir.path().join("climatology_pixel.parquet");
    write_climatology(&path, Granularity::Pixel, &climatology, &quantiles, &WriterConfig::default())
        .unwrap();
    assert_eq!(
        read_climatology(&path, Granularity::Pixel, &quantiles).unwrap(),
        climatology
    );

    let outcomes = vec![ReanalysisOutcome {
        location: pixel(1.0, 2.0),
        year: 2001,
        month: 7,
        tp_mm_day: 1.9,
        climatology_mean: 3.0,
        thresholds: vec![2.5, 2.0, 1.8, 1.5],
        below: vec![1.0, 1.0, 0.0, 0.0],
    }];
    let path = dir.path().join("era5_pixel.parquet");
    let writer = WriterConfig::default();
    write_reanalysis_outcomes(&path, Granularity::Pixel, &outcomes, &quantiles, &writer).unwrap();
    assert_eq!(
        read_reanalysis_outcomes(&path, Granularity::Pixel, &quantiles).unwrap(),
        outcomes
    );
}

#[test]
fn missing_quantile_column_is_reported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("climatology_admin.parquet");
    let climatology = vec![ClimatologyRecord {
        location: admin("TD01"),
        month: 1,
        mean: 0.5,
        thresholds: vec![0.4],
    }];
    let median_only = QuantileSet::new(vec![0.5]).unwrap();
    let writer = WriterConfig::default();
    write_climatology(&path, Granularity::Admin, &climatology, &median_only, &writer).unwrap();

    let err = read_climatology(&path, Granularity::Admin, &QuantileSet::standard()).unwrap_err();
    match err {
        IoError::MissingColumn { column, .. } => assert_eq!(column, "climatology_q33"),
        other => panic!("expected MissingColumn, got {other:?}"),
    }
}

#[test]
fn threshold_vector_must_match_quantiles() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("climatology_admin.parquet");
    let climatology = vec![ClimatologyRecord {
        location: admin("TD01"),
        month: 1,
        mean: 0.5,
        thresholds: vec![0.4],
    }];
    let err = write_climatology(
        &path,
        Granularity::Admin,
        &climatology,
        &QuantileSet::standard(),
        &WriterConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, IoError::DimensionMismatch { .. }));
}

#[test]
fn corrected_roundtrip_keeps_nulls() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("forecast_corrected_admin.parquet");
    let records = vec![
        CorrectedForecast {
            location: admin("TD01"),
            number: 0,
            year: 2000,
            month: 3,
            lead_time: 1,
            tp_mm_day_raw: 1.0,
            tp_mm_day_bias_corrected: 0.0,
            tp_mm_day_era5_calibrated: Some(0.5),
        },
        CorrectedForecast {
            location: admin("TD02"),
            number: 0,
            year: 2000,
            month: 3,
            lead_time: 1,
            tp_mm_day_raw: 2.0,
            tp_mm_day_bias_corrected: 2.0,
            tp_mm_day_era5_calibrated: None,
        },
    ];
    write_corrected(&path, Granularity::Admin, &records, &WriterConfig::default()).unwrap();
    assert_eq!(read_corrected(&path, Granularity::Admin).unwrap(), records);
}

#[test]
fn probabilities_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("probability_raw_pixel.parquet");
    let quantiles = QuantileSet::new(vec![0.5, 0.1]).unwrap();
    let records = vec![ProbabilityRecord {
        location: pixel(3.0, 4.0),
        year: 2010,
        month: 8,
        lead_time: 2,
        tp_mm_day: 4.2,
        thresholds: vec![4.0, 1.0],
        probabilities: vec![0.4, 0.0],
        bias: Some(-0.3),
        mae: Some(0.3),
    }];
    write_probabilities(&path, Granularity::Pixel, &records, &quantiles, &WriterConfig::default())
        .unwrap();
    assert_eq!(
        read_probabilities(&path, Granularity::Pixel, &quantiles).unwrap(),
        records
    );
}

#[test]
fn member_bias_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("member_bias_admin.parquet");
    let records = vec![MemberBias {
        location: admin("TD01"),
        number: 7,
        month: 11,
        lead_time: 3,
        mean_raw: 2.0,
        era5_mean: 2.5,
        bias: -0.5,
    }];
    write_member_bias(&path, Granularity::Admin, &records, &WriterConfig::default()).unwrap();
    assert_eq!(read_member_bias(&path, Granularity::Admin).unwrap(), records);
}

#[test]
fn empty_table_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("forecast_admin.parquet");
    write_forecast(&path, Granularity::Admin, &[], &WriterConfig::default()).unwrap();
    assert!(read_forecast(&path, Granularity::Admin).unwrap().is_empty());
}

#[test]
fn read_missing_file() {
    let err = read_forecast(Path::new("/nonexistent/forecast_pixel.parquet"), Granularity::Pixel)
        .unwrap_err();
    assert!(matches!(err, IoError::FileNotFound { .. }));
}
