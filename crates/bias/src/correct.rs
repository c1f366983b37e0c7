//! Lead-time bias correction and reanalysis calibration.

use std::collections::BTreeMap;

use hindcast_climatology::{ClimatologyTable, MissingClimatology};
use hindcast_io::{CorrectedForecast, ForecastRecord, Granularity, Location, MemberBias};
use tracing::{info, warn};

use crate::config::BiasConfig;
use crate::error::BiasError;
use crate::result::BiasResult;

/// Floor at zero; NaN passes through.
fn floor_at_zero(v: f64) -> f64 {
    if v < 0.0 { 0.0 } else { v }
}

type MemberKey<'a> = (&'a Location, u32, u8, u8);

/// Mean of each group; groups come from `key`.
fn group_means<'a, K: Ord>(
    records: &'a [ForecastRecord],
    key: impl Fn(&'a ForecastRecord) -> K,
) -> BTreeMap<K, f64> {
    let mut groups: BTreeMap<K, Vec<f64>> = BTreeMap::new();
    for r in records {
        groups.entry(key(r)).or_default().push(r.tp_mm_day);
    }
    groups
        .into_iter()
        .filter_map(|(k, v)| hindcast_stats::mean(&v).map(|m| (k, m)))
        .collect()
}

/// Correct a forecast table two ways.
///
/// With `mean_raw` the mean of a member per (location, month, lead time)
/// over all years:
///
/// - lead-time bias correction: `raw - mean_raw + mean_ref`, where
///   `mean_ref` is the forecast mean per (location, month) over all members
///   and lead times;
/// - reanalysis calibration: `raw - mean_raw + era5_mean`, with `era5_mean`
///   from the reanalysis climatology.
///
/// Both series are floored at zero. Rows whose location and month have no
/// reanalysis climatology follow the configured [`MissingClimatology`]
/// policy.
///
/// # Errors
///
/// Returns [`BiasError::EmptyData`] for an empty forecast, or
/// [`BiasError::Io`] wrapping a granularity mismatch.
pub fn correct_forecast(
    forecast: &[ForecastRecord],
    era5: &ClimatologyTable,
    granularity: Granularity,
    config: &BiasConfig,
) -> Result<BiasResult, BiasError> {
    if forecast.is_empty() {
        return Err(BiasError::EmptyData);
    }
    granularity.check(forecast.iter().map(|r| &r.location))?;

    let mean_raw = group_means(forecast, |r| (&r.location, r.number, r.month, r.lead_time));
    let mean_ref = group_means(forecast, |r| (&r.location, r.month));

    let policy = config.missing_climatology();
    let mut dropped = 0usize;
    let mut flagged = 0usize;
    let mut corrected = Vec::with_capacity(forecast.len());
    for r in forecast {
        let member_key: MemberKey<'_> = (&r.location, r.number, r.month, r.lead_time);
        let (Some(&raw_mean), Some(&ref_mean)) = (
            mean_raw.get(&member_key),
            mean_ref.get(&(&r.location, r.month)),
        ) else {
            continue;
        };
        let anomaly = r.tp_mm_day - raw_mean;
        let calibrated = match era5.get(&r.location, r.month) {
            Some(clim) => Some(floor_at_zero(anomaly + clim.mean)),
            None if policy == MissingClimatology::Drop => {
                dropped += 1;
                continue;
            }
            None => {
                flagged += 1;
                None
            }
        };
        corrected.push(CorrectedForecast {
            location: r.location.clone(),
            number: r.number,
            year: r.year,
            month: r.month,
            lead_time: r.lead_time,
            tp_mm_day_raw: r.tp_mm_day,
            tp_mm_day_bias_corrected: floor_at_zero(anomaly + ref_mean),
            tp_mm_day_era5_calibrated: calibrated,
        });
    }
    corrected.sort_by(|a, b| {
        (&a.location, a.number, a.year, a.month, a.lead_time)
            .cmp(&(&b.location, b.number, b.year, b.month, b.lead_time))
    });

    let member_bias: Vec<MemberBias> = mean_raw
        .iter()
        .filter_map(|(&(location, number, month, lead_time), &raw_mean)| {
            era5.get(location, month).map(|clim| MemberBias {
                location: location.clone(),
                number,
                month,
                lead_time,
                mean_raw: raw_mean,
                era5_mean: clim.mean,
                bias: raw_mean - clim.mean,
            })
        })
        .collect();

    if dropped > 0 {
        warn!(rows = dropped, "forecast rows without reanalysis climatology dropped");
    }
    if flagged > 0 {
        warn!(rows = flagged, "forecast rows without reanalysis climatology kept uncalibrated");
    }
    info!(
        granularity = %granularity,
        rows = corrected.len(),
        member_bias_rows = member_bias.len(),
        "corrected forecast"
    );
    Ok(BiasResult::new(corrected, member_bias, dropped, flagged))
}
