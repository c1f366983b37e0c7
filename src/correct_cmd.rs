//! Correct stage: bias-correct the aggregated forecast against the
//! reanalysis climatology.

use anyhow::{Context, Result};
use tracing::{info, info_span};

use hindcast_bias::correct_forecast;
use hindcast_io::{read_forecast, write_corrected, write_member_bias};

use crate::convert::Settings;
use crate::tables;

pub fn run(settings: &Settings) -> Result<()> {
    let _cmd = info_span!("correct").entered();

    for &g in &settings.granularities {
        let _g = info_span!("granularity", granularity = %g).entered();
        let path = settings.artifacts.forecast(g);
        let forecast = read_forecast(&path, g).with_context(|| {
            format!("failed to read {} (run `hindcast forecast` first)", path.display())
        })?;
        let era5 = tables::climatology_table(settings, g)?;

        let result = correct_forecast(&forecast, &era5, g, &settings.bias)
            .with_context(|| format!("failed to bias-correct {g} forecast"))?;
        info!(
            rows = result.corrected().len(),
            dropped = result.dropped(),
            flagged = result.flagged(),
            "forecast corrected"
        );
        let (corrected, member_bias) = result.into_parts();

        let out = settings.artifacts.corrected(g);
        write_corrected(&out, g, &corrected, &settings.writer)
            .with_context(|| format!("failed to write {}", out.display()))?;
        let out = settings.artifacts.member_bias(g);
        write_member_bias(&out, g, &member_bias, &settings.writer)
            .with_context(|| format!("failed to write {}", out.display()))?;
    }
    Ok(())
}
