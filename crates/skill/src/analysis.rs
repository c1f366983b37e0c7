//! Error and climate summaries of the three forecast series against the
//! reanalysis.

use std::collections::BTreeMap;

use hindcast_io::{CorrectedForecast, ForecastVariant, Granularity, Location, ReanalysisRecord};
use tracing::debug;

use crate::config::SkillConfig;
use crate::error::SkillError;
use crate::output::{LeadTimeError, ProfileEntry};

type EnsembleKey<'a> = (&'a Location, i32, u8, u8);

/// Ensemble mean of one series per (location, year, month, lead time).
fn ensemble_means<'a>(
    corrected: &'a [CorrectedForecast],
    variant: ForecastVariant,
    config: &SkillConfig,
) -> BTreeMap<EnsembleKey<'a>, f64> {
    let mut groups: BTreeMap<EnsembleKey<'a>, Vec<f64>> = BTreeMap::new();
    for r in corrected.iter().filter(|r| config.includes_month(r.month)) {
        if let Some(v) = r.value(variant) {
            groups
                .entry((&r.location, r.year, r.month, r.lead_time))
                .or_default()
                .push(v);
        }
    }
    groups
        .into_iter()
        .filter_map(|(k, v)| hindcast_stats::mean(&v).map(|m| (k, m)))
        .collect()
}

fn check(
    corrected: &[CorrectedForecast],
    reanalysis: &[ReanalysisRecord],
    granularity: Granularity,
) -> Result<(), SkillError> {
    granularity.check(corrected.iter().map(|r| &r.location))?;
    granularity.check(reanalysis.iter().map(|r| &r.location))?;
    Ok(())
}

/// Mean bias and MAE of each series' ensemble mean against the reanalysis,
/// per lead time.
///
/// # Errors
///
/// Returns [`SkillError::Io`] wrapping a granularity mismatch.
pub fn leadtime_dependency(
    corrected: &[CorrectedForecast],
    reanalysis: &[ReanalysisRecord],
    granularity: Granularity,
    config: &SkillConfig,
) -> Result<Vec<LeadTimeError>, SkillError> {
    check(corrected, reanalysis, granularity)?;
    let truth: BTreeMap<(&Location, i32, u8), f64> = reanalysis
        .iter()
        .map(|r| ((&r.location, r.year, r.month), r.tp_mm_day))
        .collect();

    let mut diffs: BTreeMap<(u8, ForecastVariant), Vec<f64>> = BTreeMap::new();
    for variant in ForecastVariant::ALL {
        for ((location, year, month, lead), mean) in ensemble_means(corrected, variant, config) {
            if let Some(t) = truth.get(&(location, year, month)) {
                diffs.entry((lead, variant)).or_default().push(mean - t);
            }
        }
    }

    let out: Vec<LeadTimeError> = diffs
        .into_iter()
        .filter_map(|((lead_time, variant), d)| {
            let bias = hindcast_stats::mean(&d)?;
            let abs: Vec<f64> = d.iter().map(|x| x.abs()).collect();
            let mae = hindcast_stats::mean(&abs)?;
            Some(LeadTimeError {
                lead_time,
                variant: variant.to_string(),
                n: d.len(),
                bias,
                mae,
            })
        })
        .collect();
    debug!(rows = out.len(), "computed lead-time dependency");
    Ok(out)
}

/// Mean of each series per (month, lead time) next to the reanalysis mean of
/// that month.
///
/// # Errors
///
/// Returns [`SkillError::Io`] wrapping a granularity mismatch.
pub fn climatology_profile(
    corrected: &[CorrectedForecast],
    reanalysis: &[ReanalysisRecord],
    granularity: Granularity,
    config: &SkillConfig,
) -> Result<Vec<ProfileEntry>, SkillError> {
    check(corrected, reanalysis, granularity)?;

    let mut by_month: BTreeMap<u8, Vec<f64>> = BTreeMap::new();
    for r in reanalysis.iter().filter(|r| config.includes_month(r.month)) {
        by_month.entry(r.month).or_default().push(r.tp_mm_day);
    }
    let reference: BTreeMap<u8, f64> = by_month
        .into_iter()
        .filter_map(|(m, v)| hindcast_stats::mean(&v).map(|mean| (m, mean)))
        .collect();

    let mut groups: BTreeMap<(u8, u8, ForecastVariant), Vec<f64>> = BTreeMap::new();
    for r in corrected.iter().filter(|r| config.includes_month(r.month)) {
        for variant in ForecastVariant::ALL {
            if let Some(v) = r.value(variant) {
                groups.entry((r.month, r.lead_time, variant)).or_default().push(v);
            }
        }
    }

    let out: Vec<ProfileEntry> = groups
        .into_iter()
        .filter_map(|((month, lead_time, variant), v)| {
            hindcast_stats::mean(&v).map(|tp_mm_day| ProfileEntry {
                month,
                lead_time,
                variant: variant.to_string(),
                tp_mm_day,
                reanalysis_tp_mm_day: reference.get(&month).copied(),
            })
        })
        .collect();
    debug!(rows = out.len(), "computed climatology profile");
    Ok(out)
}
