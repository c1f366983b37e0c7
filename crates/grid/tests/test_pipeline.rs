//! Reference grid, regridding and aggregation working together.

use approx::assert_relative_eq;
use chrono::NaiveDate;
use hindcast_grid::{
    ReferenceGrid, ReferenceGridConfig, RegridMethod, TargetGrid, aggregate_reanalysis,
    build_reference_grid, regrid, regrid_reanalysis, unique_points,
};
use hindcast_io::{
    AdminBoundary, AdminCode, AdminLink, ForecastRecord, Granularity, GridPoint, GridRecord,
    Location, Polygon, ReanalysisRecord, reanalysis_records,
};

fn region(code: &str, lon0: f64, lon1: f64) -> AdminBoundary {
    AdminBoundary {
        code: AdminCode::new(code),
        polygons: vec![Polygon::new(
            vec![(lon0, 0.0), (lon1, 0.0), (lon1, 2.0), (lon0, 2.0), (lon0, 0.0)],
            vec![],
        )],
    }
}

fn forecast_points() -> Vec<GridPoint> {
    let forecast: Vec<ForecastRecord> = [0.5, 1.5]
        .iter()
        .flat_map(|&lat| [0.5, 1.5, 2.5, 3.5].map(move |lon| (lat, lon)))
        .map(|(lat, lon)| ForecastRecord {
            location: Location::Pixel(GridPoint::new(lat, lon)),
            number: 0,
            year: 2000,
            month: 1,
            lead_time: 1,
            tp_mm_day: 1.0,
        })
        .collect();
    unique_points(forecast.iter().map(|r| &r.location))
}

fn era5(lat: f64, lon: f64, value_m: f64) -> GridRecord {
    GridRecord {
        latitude: lat,
        longitude: lon,
        number: None,
        time: NaiveDate::from_ymd_opt(2000, 3, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap(),
        step_days: None,
        value: value_m,
    }
}

#[test]
fn reanalysis_reaches_both_granularities() {
    let points = forecast_points();
    assert_eq!(points.len(), 8);

    let boundaries = vec![region("A", 0.0, 2.0), region("B", 2.0, 4.0)];
    let grid = build_reference_grid(&points, &boundaries, &ReferenceGridConfig::default()).unwrap();
    assert_eq!(grid.n_pixels(), 8);

    // Quarter-degree offsets snap onto the forecast cell centres.
    let source: Vec<GridRecord> = points
        .iter()
        .map(|p| era5(p.latitude() + 0.1, p.longitude() - 0.1, 0.002))
        .chain([era5(30.0, 30.0, 1.0)])
        .collect();
    let target = TargetGrid::from_points(&points).unwrap();
    let snapped = regrid(&source, &target, RegridMethod::Nearest).unwrap();
    assert_eq!(snapped.len(), 8);

    let records = reanalysis_records(&snapped);
    let out = aggregate_reanalysis(&records, &grid).unwrap();
    assert_eq!(out.get(Granularity::Pixel).len(), 8);

    let admin = out.get(Granularity::Admin);
    let codes: Vec<_> = admin
        .iter()
        .map(|r| match &r.location {
            Location::Admin(c) => c.as_str().to_string(),
            Location::Pixel(_) => unreachable!(),
        })
        .collect();
    assert_eq!(codes, vec!["A", "B"]);
    for r in admin {
        assert_relative_eq!(r.tp_mm_day, 2.0, epsilon = 1e-9);
        assert_eq!((r.year, r.month), (2000, 3));
    }
}

#[test]
fn conservative_regrid_feeds_the_same_join() {
    let points = forecast_points();
    let boundaries = vec![region("A", 0.0, 4.0)];
    let grid = build_reference_grid(&points, &boundaries, &ReferenceGridConfig::default()).unwrap();

    let mut source = Vec::new();
    for i in 0..8 {
        for j in 0..16 {
            source.push(era5(0.125 + 0.25 * i as f64, 0.125 + 0.25 * j as f64, 0.003));
        }
    }
    let target = TargetGrid::from_points(&points).unwrap();
    let cells = regrid(&source, &target, RegridMethod::Conservative).unwrap();
    assert_eq!(cells.len(), 8);

    let out = aggregate_reanalysis(&reanalysis_records(&cells), &grid).unwrap();
    assert_eq!(out.admin.len(), 1);
    assert_relative_eq!(out.admin[0].tp_mm_day, 3.0, epsilon = 1e-9);
}

/// Forecast axes lat 10..=14, lon 20..=22 at one degree.
fn forecast_axes() -> TargetGrid {
    TargetGrid::new(&[10.0, 11.0, 12.0, 13.0, 14.0], &[20.0, 21.0, 22.0]).unwrap()
}

fn linked(points: &[(f64, f64)]) -> ReferenceGrid {
    ReferenceGrid::from_links(
        points
            .iter()
            .map(|&(lat, lon)| AdminLink {
                point: GridPoint::new(lat, lon),
                adm_pcode: AdminCode::new("A"),
            })
            .collect(),
    )
}

fn pixel_at(rows: &[ReanalysisRecord], lat: f64, lon: f64) -> Option<f64> {
    rows.iter()
        .find(|r| match &r.location {
            Location::Pixel(p) => p.latitude() == lat && p.longitude() == lon,
            Location::Admin(_) => false,
        })
        .map(|r| r.tp_mm_day)
}

#[test]
fn values_near_unlinked_rows_are_dropped_not_moved() {
    // Row 11 has no admin link.
    let grid = linked(&[(10.0, 21.0), (12.0, 21.0), (13.0, 21.0)]);
    let source = vec![
        era5(10.0, 21.0, 0.004),
        era5(11.2, 21.0, 0.009),
        era5(12.1, 21.0, 0.001),
        era5(13.0, 21.0, 0.004),
    ];

    let out = regrid_reanalysis(&source, &forecast_axes(), &grid, RegridMethod::Nearest).unwrap();
    let pixel = out.get(Granularity::Pixel);
    assert_eq!(pixel.len(), 3);
    assert_relative_eq!(pixel_at(pixel, 12.0, 21.0).unwrap(), 1.0, epsilon = 1e-9);
    assert!(pixel_at(pixel, 11.0, 21.0).is_none());

    let admin = out.get(Granularity::Admin);
    assert_eq!(admin.len(), 1);
    assert_relative_eq!(admin[0].tp_mm_day, 3.0, epsilon = 1e-9);
}

#[test]
fn single_linked_pixel_regrids_against_the_forecast_axes() {
    let grid = linked(&[(11.0, 21.0)]);
    let source = vec![era5(11.05, 20.95, 0.002), era5(12.3, 21.0, 0.05)];

    assert!(TargetGrid::from_points(&grid.pixels()).is_err());

    let out = regrid_reanalysis(&source, &forecast_axes(), &grid, RegridMethod::Nearest).unwrap();
    let pixel = out.get(Granularity::Pixel);
    assert_eq!(pixel.len(), 1);
    assert_relative_eq!(pixel_at(pixel, 11.0, 21.0).unwrap(), 2.0, epsilon = 1e-9);
    assert_eq!(out.get(Granularity::Admin).len(), 1);
}

#[test]
fn single_row_region_keeps_every_linked_column() {
    let grid = linked(&[(12.0, 20.0), (12.0, 21.0), (12.0, 22.0)]);
    let source: Vec<GridRecord> = [20.0, 21.0, 22.0]
        .iter()
        .map(|&lon| era5(11.9, lon + 0.1, 0.001 * lon))
        .chain([era5(13.0, 21.0, 1.0)])
        .collect();

    let out = regrid_reanalysis(&source, &forecast_axes(), &grid, RegridMethod::Nearest).unwrap();
    let pixel = out.get(Granularity::Pixel);
    assert_eq!(pixel.len(), 3);
    for lon in [20.0, 21.0, 22.0] {
        assert_relative_eq!(pixel_at(pixel, 12.0, lon).unwrap(), lon, epsilon = 1e-9);
    }
    let admin = out.get(Granularity::Admin);
    assert_relative_eq!(admin[0].tp_mm_day, 21.0, epsilon = 1e-9);
}
