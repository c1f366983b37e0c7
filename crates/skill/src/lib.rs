//! Hindcast skill: score below-quantile forecast probabilities against the
//! reanalysis outcomes.

mod analysis;
mod config;
mod error;
mod input;
mod output;
mod scoring;

use std::collections::{BTreeMap, BTreeSet};

use hindcast_io::{
    ForecastVariant, Granularity, Location, ProbabilityRecord, QuantileSet, ReanalysisOutcome,
};
use tracing::info;

pub use analysis::{climatology_profile, leadtime_dependency};
pub use config::SkillConfig;
pub use error::SkillError;
pub use output::{
    ConfigSummary, LeadTimeError, LocationKey, ProfileEntry, QuantileSkill, RocCurve,
    SkillReport, SpatialAccuracy, ThresholdScore, to_json,
};

use input::Pair;
use scoring::Confusion;

/// Evaluate forecast probabilities of one series against reanalysis
/// outcomes.
///
/// Rows are paired on (location, year, month) after the month filter. Per
/// lead time and quantile the report holds the MAE between probability and
/// outcome, accuracy and F1 at each decision threshold (a forecast predicts
/// "below" when its probability exceeds the threshold), the ROC curve and its
/// AUC. The spatial accuracy map covers the configured lead time and
/// threshold. `leadtime_dependency` and `climatology_profile` are left empty;
/// fill them with [`leadtime_dependency`] and [`climatology_profile`] when a
/// corrected forecast table is at hand.
///
/// # Errors
///
/// Returns [`SkillError::Validation`] for an invalid configuration or rows
/// whose quantile vectors do not match `quantiles`, and [`SkillError::Io`]
/// for a granularity mismatch.
pub fn evaluate_skill(
    probabilities: &[ProbabilityRecord],
    outcomes: &[ReanalysisOutcome],
    quantiles: &QuantileSet,
    variant: ForecastVariant,
    granularity: Granularity,
    config: &SkillConfig,
) -> Result<SkillReport, SkillError> {
    config.validate()?;
    let pairs = input::pair(probabilities, outcomes, quantiles, granularity, config)?;
    let labels = quantiles.labels();

    let lead_times: BTreeSet<u8> = pairs.iter().map(|p| p.forecast.lead_time).collect();
    let mut scores = Vec::with_capacity(lead_times.len() * labels.len());
    for &lead_time in &lead_times {
        let at_lead: Vec<&Pair<'_>> = pairs
            .iter()
            .filter(|p| p.forecast.lead_time == lead_time)
            .collect();
        for (k, label) in labels.iter().enumerate() {
            let (probs, observed): (Vec<f64>, Vec<bool>) =
                at_lead.iter().filter_map(|p| p.sample(k)).unzip();
            scores.push(score_quantile(lead_time, label, &probs, &observed, config));
        }
    }

    let spatial_accuracy = spatial_accuracy(&pairs, &labels, config);
    info!(
        granularity = %granularity,
        variant = %variant,
        pairs = pairs.len(),
        lead_times = lead_times.len(),
        "evaluated forecast skill"
    );

    Ok(SkillReport {
        config: ConfigSummary {
            granularity: granularity.to_string(),
            variant: variant.to_string(),
            quantiles: labels,
            decision_thresholds: config.decision_thresholds().to_vec(),
            months: config.months().map(<[u8]>::to_vec),
            spatial_lead_time: config.spatial_lead_time(),
            spatial_threshold: config.spatial_threshold(),
        },
        n_pairs: pairs.len(),
        scores,
        spatial_accuracy,
        leadtime_dependency: Vec::new(),
        climatology_profile: Vec::new(),
    })
}

fn score_quantile(
    lead_time: u8,
    label: &str,
    probs: &[f64],
    observed: &[bool],
    config: &SkillConfig,
) -> QuantileSkill {
    let truth: Vec<f64> = observed.iter().map(|&o| if o { 1.0 } else { 0.0 }).collect();
    let thresholds = config
        .decision_thresholds()
        .iter()
        .map(|&threshold| {
            let c = Confusion::at(probs, observed, threshold);
            ThresholdScore {
                threshold,
                accuracy: c.accuracy(),
                f1: c.f1(),
            }
        })
        .collect();
    let roc = scoring::roc_curve(probs, observed);
    let auc = roc.as_ref().map(scoring::auc);
    QuantileSkill {
        lead_time,
        quantile: label.to_string(),
        n: probs.len(),
        mae: hindcast_stats::mean_absolute_error(&truth, probs),
        thresholds,
        roc: roc.map(|r| RocCurve {
            thresholds: r.thresholds,
            fpr: r.fpr,
            tpr: r.tpr,
        }),
        auc,
    }
}

/// Per location and quantile, the share of rows at the configured lead time
/// whose call `probability > threshold` matches the outcome.
fn spatial_accuracy(
    pairs: &[Pair<'_>],
    labels: &[String],
    config: &SkillConfig,
) -> Vec<SpatialAccuracy> {
    let threshold = config.spatial_threshold();
    let mut hits: BTreeMap<(&Location, usize), (usize, usize)> = BTreeMap::new();
    for p in pairs
        .iter()
        .filter(|p| p.forecast.lead_time == config.spatial_lead_time())
    {
        for k in 0..labels.len() {
            if let Some((prob, observed)) = p.sample(k) {
                let entry = hits.entry((&p.forecast.location, k)).or_default();
                entry.0 += usize::from((prob > threshold) == observed);
                entry.1 += 1;
            }
        }
    }
    hits.into_iter()
        .map(|((location, k), (correct, n))| SpatialAccuracy {
            location: LocationKey::from(location),
            quantile: labels[k].clone(),
            n,
            accuracy: correct as f64 / n as f64,
        })
        .collect()
}
