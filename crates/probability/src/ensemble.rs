//! Ensemble below-quantile probabilities.

use std::collections::BTreeMap;

use hindcast_climatology::{ClimatologyTable, MissingClimatology};
use hindcast_io::{
    CorrectedForecast, ForecastRecord, ForecastVariant, Granularity, Location, ProbabilityRecord,
    ReanalysisRecord,
};
use tracing::{info, warn};

use crate::config::ProbabilityConfig;
use crate::error::ProbabilityError;

/// Share of `values` at or below `threshold`.
fn share_at_or_below(values: &[f64], threshold: f64) -> f64 {
    let hits = values.iter().filter(|&&v| v <= threshold).count();
    hits as f64 / values.len() as f64
}

/// Forecast records carrying one series of a corrected table. Rows where the
/// series is missing are skipped.
pub fn select_variant(
    records: &[CorrectedForecast],
    variant: ForecastVariant,
) -> Vec<ForecastRecord> {
    records.iter().filter_map(|r| r.to_record(variant)).collect()
}

/// Ensemble mean and below-quantile probabilities per (location, year,
/// month, lead time).
///
/// A member counts as below a threshold when its value is less than or
/// equal to it. With `reanalysis`, `bias` is the ensemble mean minus the
/// reanalysis value of the same location and month and `mae` its absolute
/// value; both stay `None` where no reanalysis value exists.
///
/// Groups whose location and month have no climatology follow the
/// configured [`MissingClimatology`] policy: dropped, or kept with NaN
/// thresholds and probabilities.
///
/// # Errors
///
/// Returns [`ProbabilityError::Io`] wrapping a granularity mismatch if any
/// forecast or reanalysis record is not at `granularity`.
pub fn probabilities(
    forecast: &[ForecastRecord],
    climatology: &ClimatologyTable,
    reanalysis: Option<&[ReanalysisRecord]>,
    granularity: Granularity,
    config: &ProbabilityConfig,
) -> Result<Vec<ProbabilityRecord>, ProbabilityError> {
    granularity.check(forecast.iter().map(|r| &r.location))?;
    let truth: BTreeMap<(&Location, i32, u8), f64> = match reanalysis {
        Some(records) => {
            granularity.check(records.iter().map(|r| &r.location))?;
            records
                .iter()
                .map(|r| ((&r.location, r.year, r.month), r.tp_mm_day))
                .collect()
        }
        None => BTreeMap::new(),
    };

    let mut groups: BTreeMap<(&Location, i32, u8, u8), Vec<f64>> = BTreeMap::new();
    for r in forecast {
        groups
            .entry((&r.location, r.year, r.month, r.lead_time))
            .or_default()
            .push(r.tp_mm_day);
    }

    let n_quantiles = climatology.quantiles().len();
    let policy = config.missing_climatology();
    let mut missing = 0usize;
    let mut out = Vec::with_capacity(groups.len());
    for ((location, year, month, lead_time), values) in groups {
        let Some(tp_mm_day) = hindcast_stats::mean(&values) else {
            continue;
        };
        let (thresholds, probs) = match climatology.get(location, month) {
            Some(clim) => (
                clim.thresholds.clone(),
                clim.thresholds
                    .iter()
                    .map(|&t| share_at_or_below(&values, t))
                    .collect(),
            ),
            None => {
                missing += 1;
                match policy {
                    MissingClimatology::Drop => continue,
                    MissingClimatology::Flag => {
                        (vec![f64::NAN; n_quantiles], vec![f64::NAN; n_quantiles])
                    }
                }
            }
        };
        let bias = truth.get(&(location, year, month)).map(|t| tp_mm_day - t);
        out.push(ProbabilityRecord {
            location: location.clone(),
            year,
            month,
            lead_time,
            tp_mm_day,
            thresholds,
            probabilities: probs,
            bias,
            mae: bias.map(f64::abs),
        });
    }

    if missing > 0 {
        warn!(
            groups = missing,
            policy = %policy,
            "forecast groups without climatology"
        );
    }
    info!(
        granularity = %granularity,
        forecast_rows = forecast.len(),
        rows = out.len(),
        with_reanalysis = out.iter().filter(|r| r.bias.is_some()).count(),
        "computed ensemble probabilities"
    );
    Ok(out)
}
