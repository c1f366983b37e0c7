//! Probability stage: ensemble means and below-quantile probabilities for
//! each configured forecast series.

use anyhow::{Context, Result};
use tracing::{info, info_span};

use hindcast_io::{ReanalysisRecord, write_probabilities};
use hindcast_probability::{probabilities, select_variant};

use crate::convert::Settings;
use crate::tables;

pub fn run(settings: &Settings) -> Result<()> {
    let _cmd = info_span!("probability").entered();

    for &g in &settings.granularities {
        let _g = info_span!("granularity", granularity = %g).entered();
        let corrected = tables::corrected(settings, g)?;
        let climatology = tables::climatology_table(settings, g)?;
        let truth: Vec<ReanalysisRecord> = tables::outcomes(settings, g)?
            .iter()
            .map(|o| o.to_record())
            .collect();

        for &variant in &settings.variants {
            let forecast = select_variant(&corrected, variant);
            let records = probabilities(
                &forecast,
                &climatology,
                Some(truth.as_slice()),
                g,
                &settings.probability,
            )
            .with_context(|| format!("failed to compute {variant} probabilities"))?;

            let out = settings.artifacts.probability(variant, g);
            write_probabilities(&out, g, &records, &settings.quantiles, &settings.writer)
                .with_context(|| format!("failed to write {}", out.display()))?;
            info!(
                %variant,
                members = forecast.len(),
                rows = records.len(),
                "probabilities written"
            );
        }
    }
    Ok(())
}
