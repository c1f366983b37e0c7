//! Readers for artifacts shared by several stages.

use anyhow::{Context, Result};

use hindcast_climatology::ClimatologyTable;
use hindcast_io::{
    CorrectedForecast, Granularity, ReanalysisOutcome, read_climatology, read_corrected,
    read_reanalysis_outcomes,
};

use crate::convert::Settings;

pub fn climatology_table(settings: &Settings, g: Granularity) -> Result<ClimatologyTable> {
    let path = settings.artifacts.climatology(g);
    let records = read_climatology(&path, g, &settings.quantiles)
        .with_context(|| {
            format!(
                "failed to read {} (run `hindcast reanalysis` first)",
                path.display()
            )
        })?;
    ClimatologyTable::new(records, settings.quantiles.clone())
        .with_context(|| format!("invalid climatology in {}", path.display()))
}

pub fn outcomes(settings: &Settings, g: Granularity) -> Result<Vec<ReanalysisOutcome>> {
    let path = settings.artifacts.era5(g);
    read_reanalysis_outcomes(&path, g, &settings.quantiles)
        .with_context(|| {
            format!(
                "failed to read {} (run `hindcast reanalysis` first)",
                path.display()
            )
        })
}

pub fn corrected(settings: &Settings, g: Granularity) -> Result<Vec<CorrectedForecast>> {
    let path = settings.artifacts.corrected(g);
    read_corrected(&path, g)
        .with_context(|| {
            format!(
                "failed to read {} (run `hindcast correct` first)",
                path.display()
            )
        })
}
