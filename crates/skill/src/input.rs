//! Pairing forecast probabilities with reanalysis outcomes.

use std::collections::BTreeMap;

use hindcast_io::{Granularity, Location, ProbabilityRecord, QuantileSet, ReanalysisOutcome};
use tracing::{info, warn};

use crate::config::SkillConfig;
use crate::error::SkillError;

/// A forecast row and the reanalysis outcome of the same location and month.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Pair<'a> {
    pub forecast: &'a ProbabilityRecord,
    pub outcome: &'a ReanalysisOutcome,
}

impl Pair<'_> {
    /// Probability and observed class for quantile `k`, if the probability
    /// is defined.
    pub fn sample(&self, k: usize) -> Option<(f64, bool)> {
        let p = *self.forecast.probabilities.get(k)?;
        let o = *self.outcome.below.get(k)?;
        p.is_finite().then_some((p, o >= 0.5))
    }
}

fn check_widths(
    quantiles: &QuantileSet,
    probabilities: &[ProbabilityRecord],
    outcomes: &[ReanalysisOutcome],
) -> Result<(), SkillError> {
    let n = quantiles.len();
    let bad = probabilities
        .iter()
        .filter(|r| r.probabilities.len() != n)
        .count()
        + outcomes.iter().filter(|r| r.below.len() != n).count();
    if bad > 0 {
        return Err(SkillError::Validation {
            count: bad,
            details: format!("rows without exactly {n} quantile values"),
        });
    }
    Ok(())
}

/// Inner join on (location, year, month), after the month filter.
pub(crate) fn pair<'a>(
    probabilities: &'a [ProbabilityRecord],
    outcomes: &'a [ReanalysisOutcome],
    quantiles: &QuantileSet,
    granularity: Granularity,
    config: &SkillConfig,
) -> Result<Vec<Pair<'a>>, SkillError> {
    granularity.check(probabilities.iter().map(|r| &r.location))?;
    granularity.check(outcomes.iter().map(|r| &r.location))?;
    check_widths(quantiles, probabilities, outcomes)?;

    let truth: BTreeMap<(&Location, i32, u8), &ReanalysisOutcome> = outcomes
        .iter()
        .map(|o| ((&o.location, o.year, o.month), o))
        .collect();

    let in_scope: Vec<&ProbabilityRecord> = probabilities
        .iter()
        .filter(|r| config.includes_month(r.month))
        .collect();
    let pairs: Vec<Pair<'a>> = in_scope
        .iter()
        .filter_map(|&forecast| {
            truth
                .get(&(&forecast.location, forecast.year, forecast.month))
                .map(|&outcome| Pair { forecast, outcome })
        })
        .collect();

    info!(
        forecast_rows = in_scope.len(),
        pairs = pairs.len(),
        "paired forecast with reanalysis outcomes"
    );
    if pairs.len() < in_scope.len() {
        warn!(
            dropped = in_scope.len() - pairs.len(),
            "forecast rows without a reanalysis outcome"
        );
    }
    Ok(pairs)
}
