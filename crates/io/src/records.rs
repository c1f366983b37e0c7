//! Record types shared by every stage of the pipeline.
//!
//! Tables are plain `Vec`s of these records. Every table is keyed by a
//! [`Location`], whose [`Granularity`] is passed explicitly through the
//! pipeline rather than inferred from which columns happen to exist.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::NaiveDateTime;
use sha2::{Digest, Sha256};

use crate::error::IoError;

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

/// Stable pixel identifier (`pixel_geom_id`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PixelId(i64);

impl PixelId {
    /// Derive the identifier of the pixel at (`latitude`, `longitude`).
    ///
    /// The coordinates are stringified as `"{lat:?}-{lon:?}"` (negative zero
    /// normalised) and hashed with SHA-256; the first eight digest bytes form
    /// a big-endian `i64`. The result is identical across runs and platforms.
    pub fn from_coordinates(latitude: f64, longitude: f64) -> Self {
        let key = format!("{:?}-{:?}", latitude + 0.0, longitude + 0.0);
        let digest = Sha256::digest(key.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        Self(i64::from_be_bytes(bytes))
    }

    /// Wrap a raw identifier read back from a table.
    pub fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// The raw identifier value.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for PixelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A forecast-resolution grid point.
///
/// Equality, ordering and hashing use the identifier only, which is a pure
/// function of the coordinates.
#[derive(Debug, Clone, Copy)]
pub struct GridPoint {
    id: PixelId,
    latitude: f64,
    longitude: f64,
}

impl GridPoint {
    /// Create a grid point, deriving its identifier from the coordinates.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            id: PixelId::from_coordinates(latitude, longitude),
            latitude,
            longitude,
        }
    }

    /// Rebuild a grid point from a persisted identifier and coordinates.
    pub fn from_parts(id: PixelId, latitude: f64, longitude: f64) -> Self {
        Self {
            id,
            latitude,
            longitude,
        }
    }

    pub fn id(&self) -> PixelId {
        self.id
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl PartialEq for GridPoint {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for GridPoint {}

impl PartialOrd for GridPoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GridPoint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Hash for GridPoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Administrative region code (`adm_pcode`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AdminCode(String);

impl AdminCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AdminCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Aggregation level of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Granularity {
    /// One row per forecast grid pixel.
    Pixel,
    /// One row per administrative region.
    Admin,
}

impl Granularity {
    /// Both granularities, pixel first.
    pub const ALL: [Granularity; 2] = [Granularity::Pixel, Granularity::Admin];

    /// Short name used in artifact file names and log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::Pixel => "pixel",
            Granularity::Admin => "admin",
        }
    }

    /// Check that every location belongs to this granularity.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::GranularityMismatch`] on the first foreign location.
    pub fn check<'a>(
        self,
        mut locations: impl Iterator<Item = &'a Location>,
    ) -> Result<(), IoError> {
        match locations.find(|l| l.granularity() != self) {
            Some(l) => Err(IoError::GranularityMismatch {
                expected: self,
                found: l.granularity(),
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key of every pipeline table: a pixel or an administrative region.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Location {
    Pixel(GridPoint),
    Admin(AdminCode),
}

impl Location {
    pub fn granularity(&self) -> Granularity {
        match self {
            Location::Pixel(_) => Granularity::Pixel,
            Location::Admin(_) => Granularity::Admin,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Pixel(p) => write!(f, "pixel {} ({}, {})", p.id, p.latitude, p.longitude),
            Location::Admin(code) => write!(f, "admin {code}"),
        }
    }
}

/// One row of the reference grid: a pixel linked to one admin region.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AdminLink {
    pub point: GridPoint,
    pub adm_pcode: AdminCode,
}

// ---------------------------------------------------------------------------
// Quantiles
// ---------------------------------------------------------------------------

/// Standard climatology quantile fractions and their column labels.
const STANDARD_QUANTILES: [(f64, &str); 4] = [
    (1.0 / 2.0, "q50"),
    (1.0 / 3.0, "q33"),
    (1.0 / 4.0, "q25"),
    (1.0 / 5.0, "q20"),
];

/// Column label for a quantile fraction.
///
/// The standard fractions 1/2, 1/3, 1/4 and 1/5 map to `q50`, `q33`, `q25`
/// and `q20`; any other fraction uses two decimals, e.g. `0.1` → `q_0_10`.
pub fn quantile_label(fraction: f64) -> String {
    for (p, label) in STANDARD_QUANTILES {
        if (fraction - p).abs() < 1e-9 {
            return label.to_string();
        }
    }
    format!("q_{fraction:.2}").replace('.', "_")
}

/// Ordered set of quantile fractions used for climatology thresholds and
/// probabilities. Per-record threshold and probability vectors are parallel
/// to [`QuantileSet::fractions`].
#[derive(Debug, Clone, PartialEq)]
pub struct QuantileSet {
    fractions: Vec<f64>,
}

impl QuantileSet {
    /// Create a set from explicit fractions.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Validation`] if the list is empty, a fraction lies
    /// outside `(0, 1)`, or two fractions share a column label.
    pub fn new(fractions: Vec<f64>) -> Result<Self, IoError> {
        let mut errors = Vec::new();
        if fractions.is_empty() {
            errors.push("at least one quantile fraction is required".to_string());
        }
        for &p in &fractions {
            if !(p > 0.0 && p < 1.0) {
                errors.push(format!("quantile fraction {p} must lie in (0, 1)"));
            }
        }
        let labels: Vec<String> = fractions.iter().map(|&p| quantile_label(p)).collect();
        for (i, label) in labels.iter().enumerate() {
            if labels[..i].contains(label) {
                errors.push(format!("duplicate quantile label '{label}'"));
            }
        }
        if !errors.is_empty() {
            return Err(IoError::Validation {
                count: errors.len(),
                details: errors.join("; "),
            });
        }
        Ok(Self { fractions })
    }

    /// The fractions 1/2, 1/3, 1/4 and 1/5.
    pub fn standard() -> Self {
        Self {
            fractions: STANDARD_QUANTILES.iter().map(|(p, _)| *p).collect(),
        }
    }

    pub fn fractions(&self) -> &[f64] {
        &self.fractions
    }

    pub fn len(&self) -> usize {
        self.fractions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fractions.is_empty()
    }

    /// Column labels, parallel to [`QuantileSet::fractions`].
    pub fn labels(&self) -> Vec<String> {
        self.fractions.iter().map(|&p| quantile_label(p)).collect()
    }
}

impl Default for QuantileSet {
    fn default() -> Self {
        Self::standard()
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One value of a gridded dataset as returned by the loader, in native units.
#[derive(Debug, Clone, PartialEq)]
pub struct GridRecord {
    pub latitude: f64,
    pub longitude: f64,
    /// Ensemble member, if the dataset has a member dimension.
    pub number: Option<u32>,
    /// Forecast initialisation time, or the observation time.
    pub time: NaiveDateTime,
    /// Forecast step in days, if the dataset has a step dimension.
    pub step_days: Option<f64>,
    pub value: f64,
}

/// One ensemble member's precipitation for one location, valid month and
/// lead time.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRecord {
    pub location: Location,
    pub number: u32,
    pub year: i32,
    pub month: u8,
    pub lead_time: u8,
    pub tp_mm_day: f64,
}

/// Reanalysis precipitation for one location and month (lead time 0).
#[derive(Debug, Clone, PartialEq)]
pub struct ReanalysisRecord {
    pub location: Location,
    pub year: i32,
    pub month: u8,
    pub tp_mm_day: f64,
}

/// Climatological statistics for one location and calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct ClimatologyRecord {
    pub location: Location,
    pub month: u8,
    pub mean: f64,
    /// Thresholds parallel to the table's [`QuantileSet`].
    pub thresholds: Vec<f64>,
}

/// A reanalysis value with its climatology and binary below-quantile flags.
#[derive(Debug, Clone, PartialEq)]
pub struct ReanalysisOutcome {
    pub location: Location,
    pub year: i32,
    pub month: u8,
    pub tp_mm_day: f64,
    pub climatology_mean: f64,
    pub thresholds: Vec<f64>,
    /// 1.0 when `tp_mm_day <= threshold`, else 0.0; parallel to `thresholds`.
    pub below: Vec<f64>,
}

impl ReanalysisOutcome {
    /// The plain reanalysis value of this outcome.
    pub fn to_record(&self) -> ReanalysisRecord {
        ReanalysisRecord {
            location: self.location.clone(),
            year: self.year,
            month: self.month,
            tp_mm_day: self.tp_mm_day,
        }
    }
}

/// Which forecast series feeds a downstream computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ForecastVariant {
    Raw,
    BiasCorrected,
    Era5Calibrated,
}

impl ForecastVariant {
    pub const ALL: [ForecastVariant; 3] = [
        ForecastVariant::Raw,
        ForecastVariant::BiasCorrected,
        ForecastVariant::Era5Calibrated,
    ];

    /// Column holding this series in the corrected forecast table.
    pub fn column(self) -> &'static str {
        match self {
            ForecastVariant::Raw => "tp_mm_day_raw",
            ForecastVariant::BiasCorrected => "tp_mm_day_bias_corrected",
            ForecastVariant::Era5Calibrated => "tp_mm_day_era5_calibrated",
        }
    }

    /// Short name used in artifact file names.
    pub fn as_str(self) -> &'static str {
        match self {
            ForecastVariant::Raw => "raw",
            ForecastVariant::BiasCorrected => "bias_corrected",
            ForecastVariant::Era5Calibrated => "era5_calibrated",
        }
    }
}

impl fmt::Display for ForecastVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A forecast value alongside its two corrected series.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectedForecast {
    pub location: Location,
    pub number: u32,
    pub year: i32,
    pub month: u8,
    pub lead_time: u8,
    pub tp_mm_day_raw: f64,
    pub tp_mm_day_bias_corrected: f64,
    /// `None` when no reanalysis climatology exists for the location/month.
    pub tp_mm_day_era5_calibrated: Option<f64>,
}

impl CorrectedForecast {
    /// Value of the requested series, if present.
    pub fn value(&self, variant: ForecastVariant) -> Option<f64> {
        match variant {
            ForecastVariant::Raw => Some(self.tp_mm_day_raw),
            ForecastVariant::BiasCorrected => Some(self.tp_mm_day_bias_corrected),
            ForecastVariant::Era5Calibrated => self.tp_mm_day_era5_calibrated,
        }
    }

    /// A plain forecast record carrying the requested series, if present.
    pub fn to_record(&self, variant: ForecastVariant) -> Option<ForecastRecord> {
        self.value(variant).map(|tp_mm_day| ForecastRecord {
            location: self.location.clone(),
            number: self.number,
            year: self.year,
            month: self.month,
            lead_time: self.lead_time,
            tp_mm_day,
        })
    }
}

/// Mean offset of one member's forecast climate from the reanalysis
/// climatology, per location, calendar month and lead time.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberBias {
    pub location: Location,
    pub number: u32,
    pub month: u8,
    pub lead_time: u8,
    pub mean_raw: f64,
    pub era5_mean: f64,
    /// `mean_raw - era5_mean`.
    pub bias: f64,
}

/// Ensemble statistics for one location, valid month and lead time.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityRecord {
    pub location: Location,
    pub year: i32,
    pub month: u8,
    pub lead_time: u8,
    /// Ensemble mean.
    pub tp_mm_day: f64,
    /// Climatology thresholds, parallel to the table's [`QuantileSet`].
    pub thresholds: Vec<f64>,
    /// Share of members at or below each threshold.
    pub probabilities: Vec<f64>,
    /// Ensemble mean minus the reanalysis value, when one exists.
    pub bias: Option<f64>,
    pub mae: Option<f64>,
}
