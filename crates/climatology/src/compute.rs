//! Per-month climatology and the reanalysis below-quantile outcomes.

use std::collections::BTreeMap;

use hindcast_io::{
    ClimatologyRecord, Granularity, Location, ReanalysisOutcome, ReanalysisRecord,
};
use tracing::{debug, info, warn};

use crate::config::ClimatologyConfig;
use crate::error::ClimatologyError;
use crate::table::ClimatologyTable;

/// Mean and quantile thresholds of the reanalysis per (location, calendar
/// month).
///
/// Only years inside the configured reference period contribute. Non-finite
/// values are skipped; a group without finite values yields no row, and a
/// single-value group returns that value for every statistic.
///
/// # Errors
///
/// Returns [`ClimatologyError::Io`] wrapping a granularity mismatch if any
/// record is not at `granularity`.
pub fn climatology(
    records: &[ReanalysisRecord],
    granularity: Granularity,
    config: &ClimatologyConfig,
) -> Result<ClimatologyTable, ClimatologyError> {
    granularity.check(records.iter().map(|r| &r.location))?;

    let period = config.period();
    let mut groups: BTreeMap<(&Location, u8), Vec<f64>> = BTreeMap::new();
    let mut outside = 0usize;
    for r in records {
        if period.is_some_and(|p| !p.contains(r.year)) {
            outside += 1;
            continue;
        }
        groups.entry((&r.location, r.month)).or_default().push(r.tp_mm_day);
    }
    if outside > 0 {
        debug!(rows = outside, "reanalysis rows outside the reference period");
    }

    let fractions = config.quantiles().fractions();
    let mut rows = Vec::with_capacity(groups.len());
    let mut empty = 0usize;
    for ((location, month), values) in groups {
        let sorted = hindcast_stats::sorted_finite(&values);
        let Some(mean) = hindcast_stats::mean(&sorted) else {
            empty += 1;
            continue;
        };
        let thresholds = fractions
            .iter()
            .filter_map(|&p| hindcast_stats::quantile_linear(&sorted, p))
            .collect();
        rows.push(ClimatologyRecord {
            location: location.clone(),
            month,
            mean,
            thresholds,
        });
    }
    if empty > 0 {
        warn!(groups = empty, "location-months without finite reanalysis values");
    }
    if rows.is_empty() && !records.is_empty() {
        warn!(
            period = ?period.map(|p| p.to_string()),
            "no reanalysis rows fall inside the reference period"
        );
    }
    info!(
        granularity = %granularity,
        rows = rows.len(),
        quantiles = ?config.quantiles().labels(),
        "computed climatology"
    );
    ClimatologyTable::new(rows, config.quantiles().clone())
}

/// Join each reanalysis value with its climatology and flag whether it lies
/// at or below each threshold (1.0) or above it (0.0).
///
/// Rows without a climatology are dropped and counted.
pub fn reanalysis_outcomes(
    records: &[ReanalysisRecord],
    table: &ClimatologyTable,
) -> Vec<ReanalysisOutcome> {
    let mut missing = 0usize;
    let out: Vec<ReanalysisOutcome> = records
        .iter()
        .filter_map(|r| {
            let Some(clim) = table.get(&r.location, r.month) else {
                missing += 1;
                return None;
            };
            Some(ReanalysisOutcome {
                location: r.location.clone(),
                year: r.year,
                month: r.month,
                tp_mm_day: r.tp_mm_day,
                climatology_mean: clim.mean,
                thresholds: clim.thresholds.clone(),
                below: clim
                    .thresholds
                    .iter()
                    .map(|&t| if r.tp_mm_day <= t { 1.0 } else { 0.0 })
                    .collect(),
            })
        })
        .collect();
    if missing > 0 {
        warn!(rows = missing, "reanalysis rows without climatology were dropped");
    }
    info!(rows = out.len(), "computed reanalysis outcomes");
    out
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use hindcast_io::{AdminCode, GridPoint, QuantileSet};

    use super::*;
    use crate::config::ReferencePeriod;

    fn admin(code: &str) -> Location {
        Location::Admin(AdminCode::new(code))
    }

    fn rec(location: &Location, year: i32, month: u8, tp: f64) -> ReanalysisRecord {
        ReanalysisRecord {
            location: location.clone(),
            year,
            month,
            tp_mm_day: tp,
        }
    }

    fn series(location: &Location, month: u8, values: &[f64]) -> Vec<ReanalysisRecord> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| rec(location, 1993 + i as i32, month, v))
            .collect()
    }

    fn default_table(records: &[ReanalysisRecord]) -> Result<ClimatologyTable, ClimatologyError> {
        climatology(records, Granularity::Admin, &ClimatologyConfig::default())
    }

    #[test]
    fn thresholds_are_monotone() {
        let a = admin("A");
        let records = series(&a, 1, &[5.0, 0.2, 3.1, 8.4, 1.7, 2.2, 0.0, 6.6, 4.0, 1.1]);
        let table = default_table(&records).unwrap();
        let row = table.get(&a, 1).unwrap();
        // q50, q33, q25, q20
        let t = &row.thresholds;
        assert!(t[3] <= t[2] && t[2] <= t[1] && t[1] <= t[0]);
    }

    #[test]
    fn linear_interpolation_quantiles() {
        let a = admin("A");
        let records = series(&a, 2, &[1.0, 2.0, 3.0, 4.0]);
        let table = default_table(&records).unwrap();
        let row = table.get(&a, 2).unwrap();
        assert_relative_eq!(row.mean, 2.5);
        assert_relative_eq!(row.thresholds[0], 2.5);
        assert_relative_eq!(row.thresholds[1], 2.0, epsilon = 1e-12);
        assert_relative_eq!(row.thresholds[2], 1.75);
        assert_relative_eq!(row.thresholds[3], 1.6, epsilon = 1e-12);
    }

    #[test]
    fn single_value_group() {
        let a = admin("A");
        let table = default_table(&series(&a, 7, &[3.0])).unwrap();
        let row = table.get(&a, 7).unwrap();
        assert_eq!(row.mean, 3.0);
        assert!(row.thresholds.iter().all(|&t| t == 3.0));
    }

    #[test]
    fn nan_only_group_yields_no_row() {
        let a = admin("A");
        let table = default_table(&series(&a, 7, &[f64::NAN])).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn reference_period_filters_years() {
        let a = admin("A");
        // 1993..=1996
        let records = series(&a, 1, &[1.0, 2.0, 100.0, 200.0]);
        let period = ReferencePeriod::new(1993, 1994).unwrap();
        let config = ClimatologyConfig::default().with_period(period);
        let table = climatology(&records, Granularity::Admin, &config).unwrap();
        assert_relative_eq!(table.get(&a, 1).unwrap().mean, 1.5);
    }

    #[test]
    fn months_and_locations_are_separate() {
        let a = admin("A");
        let b = admin("B");
        let mut records = series(&a, 1, &[1.0, 2.0]);
        records.extend(series(&a, 2, &[10.0]));
        records.extend(series(&b, 1, &[5.0]));
        let table = default_table(&records).unwrap();
        assert_eq!(table.len(), 3);
        assert_relative_eq!(table.get(&b, 1).unwrap().mean, 5.0);
    }

    #[test]
    fn wrong_granularity_is_rejected() {
        let p = Location::Pixel(GridPoint::new(1.0, 1.0));
        let err = default_table(&series(&p, 1, &[1.0])).unwrap_err();
        assert!(matches!(err, ClimatologyError::Io(_)));
    }

    #[test]
    fn outcomes_flag_values_at_or_below_threshold() {
        let a = admin("A");
        let records = series(&a, 3, &[1.0, 2.0, 3.0]);
        let median = QuantileSet::new(vec![0.5]).unwrap();
        let config = ClimatologyConfig::default().with_quantiles(median);
        let table = climatology(&records, Granularity::Admin, &config).unwrap();
        let outcomes = reanalysis_outcomes(&records, &table);
        let below: Vec<f64> = outcomes.iter().map(|o| o.below[0]).collect();
        // Threshold is exactly 2.0: equality counts as below.
        assert_eq!(below, vec![1.0, 1.0, 0.0]);
        assert!(outcomes.iter().all(|o| o.climatology_mean == 2.0));
    }

    #[test]
    fn outcomes_drop_rows_without_climatology() {
        let a = admin("A");
        let table = default_table(&series(&a, 3, &[1.0])).unwrap();
        let outcomes = reanalysis_outcomes(&series(&a, 4, &[1.0]), &table);
        assert!(outcomes.is_empty());
    }
}
