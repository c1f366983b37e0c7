//! Join pixel records against the reference grid and aggregate them to both
//! granularities.

use std::collections::BTreeMap;

use hindcast_io::{
    AdminCode, ForecastRecord, Granularity, GridRecord, Location, ReanalysisRecord,
    reanalysis_records,
};
use tracing::{info, warn};

use crate::error::GridError;
use crate::reference::ReferenceGrid;
use crate::regrid::{RegridMethod, TargetGrid, regrid};

/// Records of one dataset at pixel and admin granularity.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregated<T> {
    pub pixel: Vec<T>,
    pub admin: Vec<T>,
}

impl<T> Aggregated<T> {
    pub fn get(&self, granularity: Granularity) -> &[T] {
        match granularity {
            Granularity::Pixel => &self.pixel,
            Granularity::Admin => &self.admin,
        }
    }
}

/// Group values by key, then average each group.
fn mean_by<K: Ord>(rows: impl Iterator<Item = (K, f64)>) -> Vec<(K, f64)> {
    let mut groups: BTreeMap<K, Vec<f64>> = BTreeMap::new();
    for (k, v) in rows {
        groups.entry(k).or_default().push(v);
    }
    groups
        .into_iter()
        .filter_map(|(k, v)| hindcast_stats::mean(&v).map(|m| (k, m)))
        .collect()
}

fn log_join(dataset: &'static str, before: usize, after: usize) {
    info!(dataset, before, after, "joined with reference grid");
    if after < before {
        warn!(
            dataset,
            dropped = before - after,
            "rows without a linked pixel were dropped"
        );
    }
}

/// Pixel rows kept by the inner join, each with its linked admin codes.
fn linked<'a, R>(
    records: &'a [R],
    grid: &'a ReferenceGrid,
    location: impl Fn(&R) -> &Location,
) -> Result<Vec<(&'a R, &'a [AdminCode])>, GridError> {
    Granularity::Pixel.check(records.iter().map(&location))?;
    Ok(records
        .iter()
        .filter_map(|r| match location(r) {
            Location::Pixel(p) if grid.contains(p.id()) => Some((r, grid.codes_for(p.id()))),
            _ => None,
        })
        .collect())
}

/// Aggregate pixel forecast records onto the reference grid.
///
/// Pixel rows are averaged per (pixel, member, year, month, lead time);
/// admin rows per (code, member, year, month, lead time). A pixel linked to
/// two codes feeds both admin rows.
///
/// # Errors
///
/// Returns [`GridError::Io`] wrapping a granularity mismatch if any record
/// is not pixel-located.
pub fn aggregate_forecast(
    records: &[ForecastRecord],
    grid: &ReferenceGrid,
) -> Result<Aggregated<ForecastRecord>, GridError> {
    let rows = linked(records, grid, |r| &r.location)?;
    log_join("forecast", records.len(), rows.len());

    let key = |location: Location, r: &ForecastRecord| {
        (location, r.number, r.year, r.month, r.lead_time)
    };
    let build = |((location, number, year, month, lead_time), tp_mm_day)| ForecastRecord {
        location,
        number,
        year,
        month,
        lead_time,
        tp_mm_day,
    };

    let pixel = mean_by(rows.iter().map(|(r, _)| (key(r.location.clone(), r), r.tp_mm_day)))
        .into_iter()
        .map(build)
        .collect();
    let admin = mean_by(rows.iter().flat_map(|(r, codes)| {
        codes
            .iter()
            .map(move |c| (key(Location::Admin(c.clone()), r), r.tp_mm_day))
    }))
    .into_iter()
    .map(build)
    .collect();

    Ok(Aggregated { pixel, admin })
}

/// Aggregate pixel reanalysis records onto the reference grid.
///
/// # Errors
///
/// Same as [`aggregate_forecast`].
pub fn aggregate_reanalysis(
    records: &[ReanalysisRecord],
    grid: &ReferenceGrid,
) -> Result<Aggregated<ReanalysisRecord>, GridError> {
    let rows = linked(records, grid, |r| &r.location)?;
    log_join("reanalysis", records.len(), rows.len());

    let build = |((location, year, month), tp_mm_day)| ReanalysisRecord {
        location,
        year,
        month,
        tp_mm_day,
    };

    let pixel = mean_by(
        rows.iter()
            .map(|(r, _)| ((r.location.clone(), r.year, r.month), r.tp_mm_day)),
    )
    .into_iter()
    .map(build)
    .collect();
    let admin = mean_by(rows.iter().flat_map(|(r, codes)| {
        codes
            .iter()
            .map(move |c| ((Location::Admin(c.clone()), r.year, r.month), r.tp_mm_day))
    }))
    .into_iter()
    .map(build)
    .collect();

    Ok(Aggregated { pixel, admin })
}

/// Regrid raw reanalysis onto the forecast grid, then aggregate the linked
/// pixels.
///
/// `forecast_grid` must span every forecast row and column, not only the
/// linked pixels. Source points snap against the full axes, so a value
/// nearest to an unlinked pixel lands there and is dropped by the join.
///
/// # Errors
///
/// Same as [`regrid`] and [`aggregate_forecast`].
pub fn regrid_reanalysis(
    raw: &[GridRecord],
    forecast_grid: &TargetGrid,
    grid: &ReferenceGrid,
    method: RegridMethod,
) -> Result<Aggregated<ReanalysisRecord>, GridError> {
    let regridded = regrid(raw, forecast_grid, method)?;
    aggregate_reanalysis(&reanalysis_records(&regridded), grid)
}

/// Sort forecast rows by (location, member, year, month, lead time), so that
/// tables appended member by member come out in a fixed order.
pub fn sort_forecast(records: &mut [ForecastRecord]) {
    records.sort_by(|a, b| {
        (&a.location, a.number, a.year, a.month, a.lead_time)
            .cmp(&(&b.location, b.number, b.year, b.month, b.lead_time))
    });
}
