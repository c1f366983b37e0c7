//! Gridded dataset loader: NetCDF variable to a flat table of [`GridRecord`]s.

use std::path::Path;

use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::error::IoError;
use crate::netcdf_read::{self, ValueEncoding};
use crate::records::GridRecord;

// ---------------------------------------------------------------------------
// BoundingBox
// ---------------------------------------------------------------------------

/// Geographic extent in degrees (EPSG:4326).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lon_min: f64,
    pub lat_min: f64,
    pub lon_max: f64,
    pub lat_max: f64,
}

impl BoundingBox {
    pub fn new(lon_min: f64, lat_min: f64, lon_max: f64, lat_max: f64) -> Self {
        Self {
            lon_min,
            lat_min,
            lon_max,
            lat_max,
        }
    }

    /// Smallest box containing both `self` and `other`.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            lon_min: self.lon_min.min(other.lon_min),
            lat_min: self.lat_min.min(other.lat_min),
            lon_max: self.lon_max.max(other.lon_max),
            lat_max: self.lat_max.max(other.lat_max),
        }
    }

    /// Whether the point lies strictly inside the box grown by `buffer` on
    /// every side.
    pub fn contains_buffered(&self, latitude: f64, longitude: f64, buffer: f64) -> bool {
        longitude > self.lon_min - buffer
            && longitude < self.lon_max + buffer
            && latitude > self.lat_min - buffer
            && latitude < self.lat_max + buffer
    }

    /// Whether two boxes overlap; touching edges count.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.lon_min <= other.lon_max
            && other.lon_min <= self.lon_max
            && self.lat_min <= other.lat_max
            && other.lat_min <= self.lat_max
    }
}

// ---------------------------------------------------------------------------
// LoaderConfig
// ---------------------------------------------------------------------------

/// Configuration for loading a gridded variable from NetCDF.
///
/// Dimension names are matched against the data variable's own dimensions,
/// in any order. The [`Default`] names suit NetCDF files converted from
/// SEAS5 / ERA5 GRIB with cfgrib.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Data variable to read (`tprate` for SEAS5, `tp` for ERA5).
    variable: String,
    lat_aliases: Vec<String>,
    lon_aliases: Vec<String>,
    time_aliases: Vec<String>,
    step_aliases: Vec<String>,
    member_aliases: Vec<String>,
    /// Degrees added around the bounding box before filtering.
    bbox_buffer: f64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            variable: "tprate".into(),
            lat_aliases: vec!["latitude".into(), "lat".into(), "y".into()],
            lon_aliases: vec!["longitude".into(), "lon".into(), "x".into()],
            time_aliases: vec![
                "time".into(),
                "valid_time".into(),
                "forecast_reference_time".into(),
            ],
            step_aliases: vec!["step".into(), "forecast_period".into()],
            member_aliases: vec!["number".into(), "realization".into()],
            bbox_buffer: 1.0,
        }
    }
}

impl LoaderConfig {
    /// Set the data variable name.
    pub fn with_variable(mut self, name: impl Into<String>) -> Self {
        self.variable = name.into();
        self
    }

    /// Set the latitude dimension aliases.
    pub fn with_lat_aliases(mut self, aliases: Vec<String>) -> Self {
        self.lat_aliases = aliases;
        self
    }

    /// Set the longitude dimension aliases.
    pub fn with_lon_aliases(mut self, aliases: Vec<String>) -> Self {
        self.lon_aliases = aliases;
        self
    }

    /// Set the time dimension aliases.
    pub fn with_time_aliases(mut self, aliases: Vec<String>) -> Self {
        self.time_aliases = aliases;
        self
    }

    /// Set the forecast step dimension aliases.
    pub fn with_step_aliases(mut self, aliases: Vec<String>) -> Self {
        self.step_aliases = aliases;
        self
    }

    /// Set the ensemble member dimension aliases.
    pub fn with_member_aliases(mut self, aliases: Vec<String>) -> Self {
        self.member_aliases = aliases;
        self
    }

    /// Set the bounding box buffer in degrees.
    pub fn with_bbox_buffer(mut self, buffer: f64) -> Self {
        self.bbox_buffer = buffer;
        self
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn bbox_buffer(&self) -> f64 {
        self.bbox_buffer
    }

    /// Validate that the configuration is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Validation`] listing every problem found.
    pub fn validate(&self) -> Result<(), IoError> {
        let mut errors = Vec::new();
        if self.variable.trim().is_empty() {
            errors.push("variable name must not be empty".to_string());
        }
        for (label, aliases) in [
            ("latitude", &self.lat_aliases),
            ("longitude", &self.lon_aliases),
            ("time", &self.time_aliases),
        ] {
            if aliases.is_empty() {
                errors.push(format!("{label} aliases must not be empty"));
            }
        }
        if !(self.bbox_buffer.is_finite() && self.bbox_buffer >= 0.0) {
            errors.push(format!(
                "bbox_buffer must be finite and >= 0, got {}",
                self.bbox_buffer
            ));
        }
        if !errors.is_empty() {
            return Err(IoError::Validation {
                count: errors.len(),
                details: errors.join("; "),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Dimension layout
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Latitude,
    Longitude,
    Time,
    Step,
    Member,
    /// Length-1 dimension with no meaning for the table (e.g. `surface`).
    Singleton,
}

#[derive(Debug)]
struct Dim {
    axis: Axis,
    name: String,
    len: usize,
}

fn classify(config: &LoaderConfig, name: &str, len: usize) -> Result<Axis, IoError> {
    let is = |aliases: &[String]| aliases.iter().any(|a| a == name);
    if is(&config.lat_aliases) {
        Ok(Axis::Latitude)
    } else if is(&config.lon_aliases) {
        Ok(Axis::Longitude)
    } else if is(&config.time_aliases) {
        Ok(Axis::Time)
    } else if is(&config.step_aliases) {
        Ok(Axis::Step)
    } else if is(&config.member_aliases) {
        Ok(Axis::Member)
    } else if len == 1 {
        Ok(Axis::Singleton)
    } else {
        Err(IoError::UnsupportedDimension {
            variable: config.variable.clone(),
            dimension: name.to_string(),
            len,
        })
    }
}

fn dim_of(dims: &[Dim], axis: Axis) -> Option<&Dim> {
    dims.iter().find(|d| d.axis == axis)
}

fn read_member_numbers(file: &netcdf::File, dim: &Dim, path: &Path) -> Result<Vec<u32>, IoError> {
    // A member dimension without a coordinate variable is numbered 0..n.
    if file.variable(&dim.name).is_none() {
        return Ok((0..dim.len as u32).collect());
    }
    netcdf_read::read_1d_f64(file, &[&dim.name], path)?
        .into_iter()
        .map(|v| {
            if v.is_finite() && v >= 0.0 && v.fract() == 0.0 {
                Ok(v as u32)
            } else {
                Err(IoError::Validation {
                    count: 1,
                    details: format!("ensemble member value {v} is not a non-negative integer"),
                })
            }
        })
        .collect()
}

fn read_layout(
    file: &netcdf::File,
    config: &LoaderConfig,
    path: &Path,
) -> Result<Vec<Dim>, IoError> {
    let var = netcdf_read::variable(file, &config.variable, path)?;
    let mut dims = Vec::new();
    for d in var.dimensions() {
        let name = d.name().to_string();
        let len = d.len();
        let axis = classify(config, &name, len)?;
        if axis != Axis::Singleton && dims.iter().any(|x: &Dim| x.axis == axis) {
            return Err(IoError::Validation {
                count: 1,
                details: format!(
                    "variable '{}' has two {axis:?} dimensions (second is '{name}')",
                    config.variable
                ),
            });
        }
        dims.push(Dim { axis, name, len });
    }
    for (axis, label) in [
        (Axis::Latitude, "latitude"),
        (Axis::Longitude, "longitude"),
        (Axis::Time, "time"),
    ] {
        if dim_of(&dims, axis).is_none() {
            return Err(IoError::MissingVariable {
                name: format!("{label} dimension of '{}'", config.variable),
                path: path.to_path_buf(),
            });
        }
    }
    debug!(
        variable = %config.variable,
        dims = ?dims.iter().map(|d| (d.name.as_str(), d.len)).collect::<Vec<_>>(),
        "resolved dimensions"
    );
    Ok(dims)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// List the ensemble member numbers present in a file.
///
/// Returns an empty list when the data variable has no member dimension.
///
/// # Errors
///
/// Returns [`IoError`] if the file or variable cannot be read.
pub fn ensemble_members(path: &Path, config: &LoaderConfig) -> Result<Vec<u32>, IoError> {
    config.validate()?;
    let file = netcdf_read::open_file(path)?;
    let dims = read_layout(&file, config, path)?;
    match dim_of(&dims, Axis::Member) {
        Some(dim) => read_member_numbers(&file, dim, path),
        None => Ok(Vec::new()),
    }
}

/// Latitude and longitude coordinates of the data variable's grid, in file
/// order. Only the coordinate variables are read.
///
/// # Errors
///
/// Returns [`IoError`] if the file, the variable or a coordinate cannot be
/// read.
pub fn grid_axes(path: &Path, config: &LoaderConfig) -> Result<(Vec<f64>, Vec<f64>), IoError> {
    config.validate()?;
    let file = netcdf_read::open_file(path)?;
    let dims = read_layout(&file, config, path)?;
    let coord = |axis: Axis| -> Result<Vec<f64>, IoError> {
        match dim_of(&dims, axis) {
            Some(dim) => netcdf_read::read_1d_f64(&file, &[&dim.name], path),
            None => Ok(Vec::new()),
        }
    };
    Ok((coord(Axis::Latitude)?, coord(Axis::Longitude)?))
}

/// Load a gridded variable into a flat table of [`GridRecord`]s.
///
/// * `bbox`: keep only points strictly inside the box grown by the
///   configured buffer.
/// * `member`: read only this ensemble member (a hyperslab of the member
///   dimension). Ignored for files without a member dimension.
///
/// Values that are NaN or equal to `_FillValue` / `missing_value` are dropped.
/// Packed values are unpacked with `scale_factor` / `add_offset`.
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`] for a missing file,
/// [`IoError::UnsupportedDimension`] for a dimension the loader cannot map,
/// [`IoError::MissingMember`] if `member` is not in the file, and
/// [`IoError::InvalidTime`] for undecodable time or step axes.
pub fn load_grid(
    path: &Path,
    config: &LoaderConfig,
    bbox: Option<&BoundingBox>,
    member: Option<u32>,
) -> Result<Vec<GridRecord>, IoError> {
    config.validate()?;
    let file = netcdf_read::open_file(path)?;
    let dims = read_layout(&file, config, path)?;

    // -- Coordinates --------------------------------------------------------

    let coord = |axis: Axis| -> Result<Vec<f64>, IoError> {
        match dim_of(&dims, axis) {
            Some(dim) => netcdf_read::read_1d_f64(&file, &[&dim.name], path),
            None => Ok(Vec::new()),
        }
    };
    let lats = coord(Axis::Latitude)?;
    let lons = coord(Axis::Longitude)?;

    let times: Vec<NaiveDateTime> = match dim_of(&dims, Axis::Time) {
        Some(dim) => {
            let offsets = netcdf_read::read_1d_f64(&file, &[&dim.name], path)?;
            let units = netcdf_read::read_units(&file, &dim.name, path)?;
            let (unit_seconds, epoch) = netcdf_read::parse_time_units(&units)?;
            netcdf_read::offsets_to_datetimes(epoch, unit_seconds, &offsets)?
        }
        None => Vec::new(),
    };

    let steps_days: Option<Vec<f64>> = match dim_of(&dims, Axis::Step) {
        Some(dim) => {
            let raw = netcdf_read::read_1d_f64(&file, &[&dim.name], path)?;
            let units = netcdf_read::read_units(&file, &dim.name, path)?;
            let unit_seconds = netcdf_read::parse_duration_units(&units)?;
            Some(raw.iter().map(|v| v * unit_seconds / 86_400.0).collect())
        }
        None => None,
    };

    let members: Option<Vec<u32>> = match dim_of(&dims, Axis::Member) {
        Some(dim) => Some(read_member_numbers(&file, dim, path)?),
        None => None,
    };

    for dim in &dims {
        let got = match dim.axis {
            Axis::Latitude => lats.len(),
            Axis::Longitude => lons.len(),
            Axis::Time => times.len(),
            Axis::Step => steps_days.as_ref().map_or(0, Vec::len),
            Axis::Member => members.as_ref().map_or(0, Vec::len),
            Axis::Singleton => 1,
        };
        if got != dim.len {
            return Err(IoError::DimensionMismatch {
                name: dim.name.clone(),
                expected: dim.len,
                got,
            });
        }
    }

    // -- Hyperslab ----------------------------------------------------------

    let member_index = match (&members, member) {
        (Some(numbers), Some(wanted)) => Some(
            numbers
                .iter()
                .position(|&n| n == wanted)
                .ok_or_else(|| IoError::MissingMember {
                    number: wanted,
                    path: path.to_path_buf(),
                })?,
        ),
        _ => None,
    };

    let mut start = Vec::with_capacity(dims.len());
    let mut count = Vec::with_capacity(dims.len());
    for dim in &dims {
        match (dim.axis, member_index) {
            (Axis::Member, Some(idx)) => {
                start.push(idx);
                count.push(1);
            }
            _ => {
                start.push(0);
                count.push(dim.len);
            }
        }
    }

    let var = netcdf_read::variable(&file, &config.variable, path)?;
    let encoding = ValueEncoding::of(&var);
    let data = netcdf_read::read_slab_f64(&var, &start, &count)?;

    // -- Flatten ------------------------------------------------------------

    let mut strides = vec![1usize; count.len()];
    for i in (0..count.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * count[i + 1];
    }

    let mut records = Vec::new();
    let mut masked = 0usize;
    let mut outside = 0usize;
    for (flat, &raw) in data.iter().enumerate() {
        let mut lat = 0.0;
        let mut lon = 0.0;
        let mut time = None;
        let mut step_days = None;
        let mut number = None;
        for (k, dim) in dims.iter().enumerate() {
            let idx = start[k] + (flat / strides[k]) % count[k];
            match dim.axis {
                Axis::Latitude => lat = lats[idx],
                Axis::Longitude => lon = lons[idx],
                Axis::Time => time = Some(times[idx]),
                Axis::Step => step_days = steps_days.as_ref().map(|s| s[idx]),
                Axis::Member => number = members.as_ref().map(|m| m[idx]),
                Axis::Singleton => {}
            }
        }

        if let Some(b) = bbox
            && !b.contains_buffered(lat, lon, config.bbox_buffer)
        {
            outside += 1;
            continue;
        }
        let Some(value) = encoding.decode(raw) else {
            masked += 1;
            continue;
        };
        let Some(time) = time else { continue };
        records.push(GridRecord {
            latitude: lat,
            longitude: lon,
            number,
            time,
            step_days,
            value,
        });
    }

    info!(
        path = %path.display(),
        variable = %config.variable,
        member = ?member,
        records = records.len(),
        masked,
        outside_bbox = outside,
        "loaded grid"
    );

    Ok(records)
}
