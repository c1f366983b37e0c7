//! Integration tests for the NetCDF grid loader.
//!
//! Fixtures are built programmatically: a small SEAS5-like ensemble file
//! `tprate[number, time, step, latitude, longitude]` and an ERA5-like file
//! `tp[time, latitude, longitude]`.

use std::path::{Path, PathBuf};

use approx::assert_relative_eq;
use hindcast_io::{
    BoundingBox, IoError, LoaderConfig, ensemble_members, forecast_records, grid_axes, load_grid,
    reanalysis_records,
};
use tempfile::tempdir;

/// 2000-01-01 in hours since 1900-01-01.
const JAN_2000_HOURS: f64 = 876_576.0;

// ---------------------------------------------------------------------------
// Helper: programmatic NetCDF fixture builder
// ---------------------------------------------------------------------------

struct ForecastFixture {
    members: Vec<f64>,
    steps_days: Vec<f64>,
    lats: Vec<f64>,
    lons: Vec<f64>,
    /// Flat `[number, time, step, lat, lon]` data (one init time).
    values: Vec<f64>,
    fill_value: Option<f64>,
}

impl ForecastFixture {
    fn new() -> Self {
        let members = vec![0.0, 1.0];
        let steps_days = vec![31.0, 60.0];
        let lats = vec![13.0, 12.0];
        let lons = vec![14.0, 15.0, 16.0];
        let n = members.len() * steps_days.len() * lats.len() * lons.len();
        let values = (0..n).map(|i| (i + 1) as f64 * 1.0e-8).collect();
        Self {
            members,
            steps_days,
            lats,
            lons,
            values,
            fill_value: None,
        }
    }

    fn index(&self, member: usize, step: usize, lat: usize, lon: usize) -> usize {
        ((member * self.steps_days.len() + step) * self.lats.len() + lat) * self.lons.len() + lon
    }

    fn with_value(mut self, member: usize, step: usize, lat: usize, lon: usize, v: f64) -> Self {
        let i = self.index(member, step, lat, lon);
        self.values[i] = v;
        self
    }

    fn with_fill_value(mut self, fv: f64) -> Self {
        self.fill_value = Some(fv);
        self
    }

    fn write(&self, dir: &Path) -> PathBuf {
        let path = dir.join("seas5.nc");
        let mut file = netcdf::create(&path).expect("failed to create NetCDF file");

        file.add_dimension("number", self.members.len()).expect("add dim number");
        file.add_dimension("time", 1).expect("add dim time");
        file.add_dimension("step", self.steps_days.len()).expect("add dim step");
        file.add_dimension("latitude", self.lats.len()).expect("add dim latitude");
        file.add_dimension("longitude", self.lons.len()).expect("add dim longitude");

        {
            let mut var = file.add_variable::<f64>("number", &["number"]).expect("add number");
            var.put_values(&self.members, ..).expect("put number");
        }
        {
            let mut var = file.add_variable::<f64>("time", &["time"]).expect("add time");
            var.put_values(&[JAN_2000_HOURS], ..).expect("put time");
            var.put_attribute("units", "hours since 1900-01-01 00:00:00")
                .expect("add time units");
        }
        {
            let mut var = file.add_variable::<f64>("step", &["step"]).expect("add step");
            var.put_values(&self.steps_days, ..).expect("put step");
            var.put_attribute("units", "days").expect("add step units");
        }
        {
            let mut var = file
                .add_variable::<f64>("latitude", &["latitude"])
                .expect("add latitude");
            var.put_values(&self.lats, ..).expect("put latitude");
        }
        {
            let mut var = file
                .add_variable::<f64>("longitude", &["longitude"])
                .expect("add longitude");
            var.put_values(&self.lons, ..).expect("put longitude");
        }
        {
            let mut var = file
                .add_variable::<f64>(
                    "tprate",
                    &["number", "time", "step", "latitude", "longitude"],
                )
                .expect("add tprate");
            if let Some(fv) = self.fill_value {
                var.put_attribute("_FillValue", fv).expect("add _FillValue");
            }
            var.put_values(&self.values, ..).expect("put tprate");
        }

        path
    }
}

/// ERA5-like file with dimensions in `(longitude, latitude, time)` order to
/// check the loader does not depend on dimension order.
fn write_reanalysis_fixture(dir: &Path, extra_dim: Option<(&str, usize)>) -> PathBuf {
    let path = dir.join("era5.nc");
    let mut file = netcdf::create(&path).expect("failed to create NetCDF file");
    let lons = [14.0, 15.0];
    let lats = [12.0];
    let times = [0.0, 31.0];

    file.add_dimension("lon", lons.len()).expect("add dim lon");
    file.add_dimension("lat", lats.len()).expect("add dim lat");
    file.add_dimension("valid_time", times.len()).expect("add dim time");
    {
        let mut var = file.add_variable::<f64>("lon", &["lon"]).expect("add lon");
        var.put_values(&lons, ..).expect("put lon");
    }
    {
        let mut var = file.add_variable::<f64>("lat", &["lat"]).expect("add lat");
        var.put_values(&lats, ..).expect("put lat");
    }
    {
        let mut var = file
            .add_variable::<f64>("valid_time", &["valid_time"])
            .expect("add time");
        var.put_values(&times, ..).expect("put time");
        var.put_attribute("units", "days since 1999-12-01").expect("add units");
    }

    let mut dims = vec!["lon", "lat", "valid_time"];
    let mut n = lons.len() * lats.len() * times.len();
    if let Some((name, len)) = extra_dim {
        file.add_dimension(name, len).expect("add extra dim");
        dims.push(name);
        n *= len;
    }
    {
        let mut var = file.add_variable::<f64>("tp", &dims).expect("add tp");
        let values: Vec<f64> = (0..n).map(|i| (i + 1) as f64 * 0.001).collect();
        var.put_values(&values, ..).expect("put tp");
    }
    path
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn lists_ensemble_members() {
    let dir = tempdir().unwrap();
    let path = ForecastFixture::new().write(dir.path());
    let members = ensemble_members(&path, &LoaderConfig::default()).unwrap();
    assert_eq!(members, vec![0, 1]);
}

#[test]
fn loads_a_single_member() {
    let dir = tempdir().unwrap();
    let fixture = ForecastFixture::new();
    let path = fixture.write(dir.path());

    let records = load_grid(&path, &LoaderConfig::default(), None, Some(1)).unwrap();
    assert_eq!(records.len(), 2 * 2 * 3);
    assert!(records.iter().all(|r| r.number == Some(1)));

    let first = &records[0];
    assert_eq!(first.latitude, 13.0);
    assert_eq!(first.longitude, 14.0);
    assert_eq!(first.step_days, Some(31.0));
    assert_relative_eq!(first.value, fixture.values[fixture.index(1, 0, 0, 0)]);
}

#[test]
fn loads_all_members_without_filter() {
    let dir = tempdir().unwrap();
    let path = ForecastFixture::new().write(dir.path());
    let records = load_grid(&path, &LoaderConfig::default(), None, None).unwrap();
    assert_eq!(records.len(), 2 * 2 * 2 * 3);
}

#[test]
fn grid_axes_are_the_full_coordinate_vectors() {
    let dir = tempdir().unwrap();
    let path = ForecastFixture::new().write(dir.path());
    let (lats, lons) = grid_axes(&path, &LoaderConfig::default()).unwrap();
    assert_eq!(lats, vec![13.0, 12.0]);
    assert_eq!(lons, vec![14.0, 15.0, 16.0]);
}

#[test]
fn missing_member_is_an_error() {
    let dir = tempdir().unwrap();
    let path = ForecastFixture::new().write(dir.path());
    let err = load_grid(&path, &LoaderConfig::default(), None, Some(7)).unwrap_err();
    assert!(
        matches!(err, IoError::MissingMember { number: 7, .. }),
        "expected MissingMember, got {err:?}"
    );
}

#[test]
fn fill_and_nan_values_are_dropped() {
    let dir = tempdir().unwrap();
    let path = ForecastFixture::new()
        .with_fill_value(-9999.0)
        .with_value(0, 0, 0, 0, -9999.0)
        .with_value(0, 1, 1, 2, f64::NAN)
        .write(dir.path());

    let records = load_grid(&path, &LoaderConfig::default(), None, Some(0)).unwrap();
    assert_eq!(records.len(), 12 - 2);
    assert!(records.iter().all(|r| r.value.is_finite() && r.value > 0.0));
}

#[test]
fn bbox_keeps_points_strictly_inside_buffer() {
    let dir = tempdir().unwrap();
    let path = ForecastFixture::new().write(dir.path());
    // Buffered box is (13, 11)..(16, 14) exclusive: longitude 16 is on the
    // edge and dropped.
    let bbox = BoundingBox::new(14.0, 12.0, 15.0, 13.0);
    let records = load_grid(&path, &LoaderConfig::default(), Some(&bbox), Some(0)).unwrap();
    assert!(records.iter().all(|r| r.longitude < 16.0));
    assert_eq!(records.len(), 2 * 2 * 2);
}

#[test]
fn forecast_conversion_from_loaded_grid() {
    let dir = tempdir().unwrap();
    let path = ForecastFixture::new().write(dir.path());
    let grid = load_grid(&path, &LoaderConfig::default(), None, Some(0)).unwrap();
    let records = forecast_records(&grid).unwrap();

    // Step 31 days from 2000-01-01 is valid 2000-02-01: January, lead 1.
    let lead1: Vec<_> = records.iter().filter(|r| r.lead_time == 1).collect();
    assert_eq!(lead1.len(), 6);
    assert!(lead1.iter().all(|r| (r.year, r.month) == (2000, 1)));

    // Step 60 days is valid 2000-03-01: February, lead 2.
    let lead2: Vec<_> = records.iter().filter(|r| r.lead_time == 2).collect();
    assert!(lead2.iter().all(|r| (r.year, r.month) == (2000, 2)));

    assert_relative_eq!(records[0].tp_mm_day, 1.0e-8 * 86_400_000.0, epsilon = 1e-12);
}

#[test]
fn reanalysis_dimension_order_does_not_matter() {
    let dir = tempdir().unwrap();
    let path = write_reanalysis_fixture(dir.path(), None);
    let config = LoaderConfig::default().with_variable("tp");
    let grid = load_grid(&path, &config, None, None).unwrap();
    assert_eq!(grid.len(), 4);
    assert!(grid.iter().all(|r| r.number.is_none() && r.step_days.is_none()));

    let records = reanalysis_records(&grid);
    let months: Vec<_> = records.iter().map(|r| (r.year, r.month)).collect();
    // Layout is [lon, lat, time]; time varies fastest.
    assert_eq!(months, vec![(1999, 12), (2000, 1), (1999, 12), (2000, 1)]);
    assert_relative_eq!(records[0].tp_mm_day, 1.0, epsilon = 1e-12);
}

#[test]
fn length_one_unknown_dimension_is_ignored() {
    let dir = tempdir().unwrap();
    let path = write_reanalysis_fixture(dir.path(), Some(("surface", 1)));
    let config = LoaderConfig::default().with_variable("tp");
    assert_eq!(load_grid(&path, &config, None, None).unwrap().len(), 4);
}

#[test]
fn unknown_dimension_is_an_error() {
    let dir = tempdir().unwrap();
    let path = write_reanalysis_fixture(dir.path(), Some(("expver", 2)));
    let config = LoaderConfig::default().with_variable("tp");
    let err = load_grid(&path, &config, None, None).unwrap_err();
    assert!(
        matches!(
            err,
            IoError::UnsupportedDimension { ref dimension, len: 2, .. } if dimension == "expver"
        ),
        "expected UnsupportedDimension, got {err:?}"
    );
}

#[test]
fn missing_variable_is_an_error() {
    let dir = tempdir().unwrap();
    let path = write_reanalysis_fixture(dir.path(), None);
    let err = load_grid(&path, &LoaderConfig::default(), None, None).unwrap_err();
    assert!(matches!(err, IoError::MissingVariable { .. }));
}

#[test]
fn missing_file_is_reported() {
    let err = load_grid(
        Path::new("/nonexistent/seas5.nc"),
        &LoaderConfig::default(),
        None,
        None,
    )
    .unwrap_err();
    assert!(matches!(err, IoError::FileNotFound { .. }));
}
