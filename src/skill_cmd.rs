//! Skill stage: score each series' probabilities against the reanalysis
//! outcomes and write one JSON report per series and granularity.

use anyhow::{Context, Result};
use tracing::{info, info_span, warn};

use hindcast_io::{ReanalysisRecord, read_probabilities};
use hindcast_skill::{climatology_profile, evaluate_skill, leadtime_dependency, to_json};

use crate::convert::Settings;
use crate::tables;

pub fn run(settings: &Settings) -> Result<()> {
    let _cmd = info_span!("skill").entered();

    for &g in &settings.granularities {
        let _g = info_span!("granularity", granularity = %g).entered();
        let outcomes = tables::outcomes(settings, g)?;
        let corrected = tables::corrected(settings, g)?;
        let truth: Vec<ReanalysisRecord> = outcomes.iter().map(|o| o.to_record()).collect();

        let by_lead = leadtime_dependency(&corrected, &truth, g, &settings.skill)
            .context("failed to compute lead-time dependency")?;
        let profile = climatology_profile(&corrected, &truth, g, &settings.skill)
            .context("failed to compute climatology profile")?;

        for &variant in &settings.variants {
            let path = settings.artifacts.probability(variant, g);
            let probs = read_probabilities(&path, g, &settings.quantiles).with_context(|| {
                format!("failed to read {} (run `hindcast probability` first)", path.display())
            })?;

            let mut report = evaluate_skill(
                &probs,
                &outcomes,
                &settings.quantiles,
                variant,
                g,
                &settings.skill,
            )
            .with_context(|| format!("failed to score {variant} forecast"))?;
            if report.n_pairs == 0 {
                warn!(%variant, "no forecast rows matched a reanalysis outcome");
            }
            report.leadtime_dependency = by_lead.clone();
            report.climatology_profile = profile.clone();

            let out = settings.artifacts.skill(variant, g);
            let json = to_json(&report).context("failed to serialize skill report")?;
            std::fs::write(&out, json)
                .with_context(|| format!("failed to write {}", out.display()))?;
            info!(%variant, pairs = report.n_pairs, path = %out.display(), "skill report written");
        }
    }
    Ok(())
}
