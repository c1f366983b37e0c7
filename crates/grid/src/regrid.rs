//! Regridding loader output onto the forecast grid.
//!
//! Two methods:
//!
//! - **Nearest**: each source coordinate snaps to the nearest target
//!   coordinate per axis; matches farther than half the target spacing are
//!   dropped, then values falling on the same target point are averaged.
//! - **Conservative**: area-weighted average of overlapping source cells,
//!   with cell areas on the sphere (`Δλ · (sin φ₂ − sin φ₁)`).

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use hindcast_io::{GridPoint, GridRecord};
use tracing::{info, warn};

use crate::error::GridError;

/// Regridding method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RegridMethod {
    #[default]
    Nearest,
    Conservative,
}

/// Regular target grid given by its sorted distinct axis coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetGrid {
    lats: Vec<f64>,
    lons: Vec<f64>,
}

fn sorted_unique(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut v: Vec<f64> = values.filter(|x| x.is_finite()).collect();
    v.sort_by(f64::total_cmp);
    v.dedup();
    v
}

impl TargetGrid {
    /// Build from axis coordinates in any order; duplicates are removed.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::DegenerateAxis`] if an axis has fewer than two
    /// distinct values.
    pub fn new(lats: &[f64], lons: &[f64]) -> Result<Self, GridError> {
        let lats = sorted_unique(lats.iter().copied());
        let lons = sorted_unique(lons.iter().copied());
        for (axis, values) in [("latitude", &lats), ("longitude", &lons)] {
            if values.len() < 2 {
                return Err(GridError::DegenerateAxis {
                    axis,
                    len: values.len(),
                });
            }
        }
        Ok(Self { lats, lons })
    }

    /// Target grid spanned by a set of forecast grid points.
    ///
    /// # Errors
    ///
    /// Same as [`TargetGrid::new`].
    pub fn from_points(points: &[GridPoint]) -> Result<Self, GridError> {
        let lats: Vec<f64> = points.iter().map(GridPoint::latitude).collect();
        let lons: Vec<f64> = points.iter().map(GridPoint::longitude).collect();
        Self::new(&lats, &lons)
    }

    pub fn lats(&self) -> &[f64] {
        &self.lats
    }

    pub fn lons(&self) -> &[f64] {
        &self.lons
    }
}

/// Grouping key shared by both methods: member, time, step (as bits).
type Key = (Option<u32>, NaiveDateTime, Option<u64>);

fn group_key(r: &GridRecord) -> Key {
    (r.number, r.time, r.step_days.map(f64::to_bits))
}

fn rebuild(key: &Key, lat: f64, lon: f64, value: f64) -> GridRecord {
    GridRecord {
        latitude: lat,
        longitude: lon,
        number: key.0,
        time: key.1,
        step_days: key.2.map(f64::from_bits),
        value,
    }
}

/// Regrid `records` onto `target`.
///
/// # Errors
///
/// Returns [`GridError::DegenerateAxis`] if the conservative method is given
/// a source axis with fewer than two distinct values.
pub fn regrid(
    records: &[GridRecord],
    target: &TargetGrid,
    method: RegridMethod,
) -> Result<Vec<GridRecord>, GridError> {
    let out = match method {
        RegridMethod::Nearest => regrid_nearest(records, target),
        RegridMethod::Conservative => regrid_conservative(records, target)?,
    };
    info!(
        method = ?method,
        source_rows = records.len(),
        target_rows = out.len(),
        "regridded"
    );
    Ok(out)
}

// ---------------------------------------------------------------------------
// Nearest
// ---------------------------------------------------------------------------

/// Index of the nearest reference value, or `None` beyond `tolerance`.
/// Ties go to the lower coordinate.
fn snap(value: f64, reference: &[f64], tolerance: f64) -> Option<usize> {
    let (idx, dist) = reference
        .iter()
        .enumerate()
        .map(|(i, r)| (i, (r - value).abs()))
        .min_by(|a, b| a.1.total_cmp(&b.1))?;
    (dist <= tolerance).then_some(idx)
}

/// Snap each distinct source coordinate once.
fn snap_axis(values: impl Iterator<Item = f64>, reference: &[f64]) -> BTreeMap<u64, Option<usize>> {
    let tolerance = (reference[1] - reference[0]) / 2.0;
    let mut out = BTreeMap::new();
    for v in values {
        out.entry(v.to_bits())
            .or_insert_with(|| snap(v, reference, tolerance));
    }
    out
}

fn regrid_nearest(records: &[GridRecord], target: &TargetGrid) -> Vec<GridRecord> {
    let lat_snap = snap_axis(records.iter().map(|r| r.latitude), &target.lats);
    let lon_snap = snap_axis(records.iter().map(|r| r.longitude), &target.lons);

    let mut groups: BTreeMap<(Key, usize, usize), Vec<f64>> = BTreeMap::new();
    let mut dropped = 0usize;
    for r in records {
        let lat = lat_snap.get(&r.latitude.to_bits()).copied().flatten();
        let lon = lon_snap.get(&r.longitude.to_bits()).copied().flatten();
        match (lat, lon) {
            (Some(i), Some(j)) => groups.entry((group_key(r), i, j)).or_default().push(r.value),
            _ => dropped += 1,
        }
    }
    if dropped > 0 {
        warn!(dropped, "source values farther than half a grid spacing from any target point");
    }

    groups
        .into_iter()
        .filter_map(|((key, i, j), values)| {
            hindcast_stats::mean(&values).map(|m| rebuild(&key, target.lats[i], target.lons[j], m))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Conservative
// ---------------------------------------------------------------------------

/// Cell edges for sorted axis coordinates: midpoints between neighbours,
/// with the outer edges half a spacing beyond the ends.
fn cell_edges(coords: &[f64]) -> Vec<f64> {
    let n = coords.len();
    let mut edges = Vec::with_capacity(n + 1);
    edges.push(coords[0] - (coords[1] - coords[0]) / 2.0);
    for w in coords.windows(2) {
        edges.push((w[0] + w[1]) / 2.0);
    }
    edges.push(coords[n - 1] + (coords[n - 1] - coords[n - 2]) / 2.0);
    edges
}

/// For each target cell, the overlapping source cells and their overlap
/// measure under `measure(lo, hi)`.
fn overlaps(
    target_edges: &[f64],
    source_edges: &[f64],
    measure: impl Fn(f64, f64) -> f64,
) -> Vec<Vec<(usize, f64)>> {
    (0..target_edges.len() - 1)
        .map(|t| {
            let (t_lo, t_hi) = (target_edges[t], target_edges[t + 1]);
            (0..source_edges.len() - 1)
                .filter_map(|s| {
                    let lo = t_lo.max(source_edges[s]);
                    let hi = t_hi.min(source_edges[s + 1]);
                    (hi > lo).then(|| (s, measure(lo, hi)))
                })
                .filter(|&(_, w)| w > 0.0)
                .collect()
        })
        .collect()
}

fn regrid_conservative(
    records: &[GridRecord],
    target: &TargetGrid,
) -> Result<Vec<GridRecord>, GridError> {
    if records.is_empty() {
        return Ok(Vec::new());
    }
    let src = TargetGrid::new(
        &records.iter().map(|r| r.latitude).collect::<Vec<_>>(),
        &records.iter().map(|r| r.longitude).collect::<Vec<_>>(),
    )?;

    let clamp_lat =
        |e: Vec<f64>| -> Vec<f64> { e.into_iter().map(|v| v.clamp(-90.0, 90.0)).collect() };
    let lat_w = overlaps(
        &clamp_lat(cell_edges(&target.lats)),
        &clamp_lat(cell_edges(&src.lats)),
        |lo, hi| hi.to_radians().sin() - lo.to_radians().sin(),
    );
    let lon_w = overlaps(&cell_edges(&target.lons), &cell_edges(&src.lons), |lo, hi| {
        (hi - lo).to_radians()
    });

    let index = |axis: &[f64], v: f64| axis.binary_search_by(|x| x.total_cmp(&v)).ok();

    // Source values per group, keyed by source cell; duplicates averaged.
    let mut groups: BTreeMap<Key, BTreeMap<(usize, usize), Vec<f64>>> = BTreeMap::new();
    for r in records {
        if let (Some(i), Some(j)) = (index(&src.lats, r.latitude), index(&src.lons, r.longitude)) {
            groups
                .entry(group_key(r))
                .or_default()
                .entry((i, j))
                .or_default()
                .push(r.value);
        }
    }

    let mut out = Vec::new();
    for (key, cells) in groups {
        let cells: BTreeMap<(usize, usize), f64> = cells
            .into_iter()
            .filter_map(|(ij, v)| hindcast_stats::mean(&v).map(|m| (ij, m)))
            .collect();
        for (ti, lat_list) in lat_w.iter().enumerate() {
            for (tj, lon_list) in lon_w.iter().enumerate() {
                let mut weighted = 0.0;
                let mut total = 0.0;
                for &(si, wi) in lat_list {
                    for &(sj, wj) in lon_list {
                        if let Some(v) = cells.get(&(si, sj)) {
                            weighted += wi * wj * v;
                            total += wi * wj;
                        }
                    }
                }
                if total > 0.0 {
                    out.push(rebuild(&key, target.lats[ti], target.lons[tj], weighted / total));
                }
            }
        }
    }
    Ok(out)
}
