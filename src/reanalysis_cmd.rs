//! Reanalysis stage: regrid onto the forecast grid, keep the linked pixels,
//! then derive the climatology and the observed below-quantile outcomes.

use anyhow::{Context, Result, bail};
use tracing::{info, info_span};

use hindcast_climatology::{climatology, reanalysis_outcomes};
use hindcast_grid::{ReferenceGrid, TargetGrid, regrid_reanalysis};
use hindcast_io::{
    BoundingBox, ClimatologyRecord, GridPoint, grid_axes, load_grid, read_reference_grid,
    write_climatology, write_reanalysis_outcomes,
};

use crate::convert::Settings;

/// Smallest box holding every point.
fn extent(points: &[GridPoint]) -> Option<BoundingBox> {
    points
        .iter()
        .map(|p| BoundingBox::new(p.longitude(), p.latitude(), p.longitude(), p.latitude()))
        .reduce(|a, b| a.union(&b))
}

pub fn run(settings: &Settings) -> Result<()> {
    let _cmd = info_span!("reanalysis").entered();

    let grid_path = settings.artifacts.reference_grid();
    let links = read_reference_grid(&grid_path).with_context(|| {
        format!(
            "failed to read reference grid {} (run `hindcast forecast` first)",
            grid_path.display()
        )
    })?;
    let reference = ReferenceGrid::from_links(links);
    let pixels = reference.pixels();
    let Some(bbox) = extent(&pixels) else {
        bail!("reference grid {} is empty", grid_path.display());
    };

    // Snap against the whole forecast grid; the join keeps linked pixels only.
    let forecast = &settings.forecast_path;
    let (lats, lons) = grid_axes(forecast, &settings.forecast_loader)
        .with_context(|| format!("failed to read forecast axes: {}", forecast.display()))?;
    let target = TargetGrid::new(&lats, &lons).context("failed to derive the target grid")?;
    info!(
        n_lats = target.lats().len(),
        n_lons = target.lons().len(),
        linked_pixels = pixels.len(),
        method = ?settings.regrid,
        "regridding reanalysis onto the forecast grid"
    );

    let path = &settings.reanalysis_path;
    let raw = load_grid(path, &settings.reanalysis_loader, Some(&bbox), None)
        .with_context(|| format!("failed to load reanalysis: {}", path.display()))?;
    let aggregated = regrid_reanalysis(&raw, &target, &reference, settings.regrid)
        .context("failed to regrid reanalysis")?;

    for &g in &settings.granularities {
        let _g = info_span!("granularity", granularity = %g).entered();
        let rows = aggregated.get(g);
        let table = climatology(rows, g, &settings.climatology)
            .with_context(|| format!("failed to compute {g} climatology"))?;
        let outcomes = reanalysis_outcomes(rows, &table);

        let out = settings.artifacts.climatology(g);
        let clim: Vec<ClimatologyRecord> = table.records().cloned().collect();
        write_climatology(&out, g, &clim, &settings.quantiles, &settings.writer)
            .with_context(|| format!("failed to write {}", out.display()))?;

        let out = settings.artifacts.era5(g);
        write_reanalysis_outcomes(&out, g, &outcomes, &settings.quantiles, &settings.writer)
            .with_context(|| format!("failed to write {}", out.display()))?;
        info!(
            climatology_rows = clim.len(),
            outcome_rows = outcomes.len(),
            "reanalysis written"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extent_covers_all_points() {
        let b = extent(&[GridPoint::new(1.0, 5.0), GridPoint::new(-2.0, 7.0)]).unwrap();
        assert_eq!((b.lon_min, b.lat_min, b.lon_max, b.lat_max), (5.0, -2.0, 7.0, 1.0));
        assert!(extent(&[]).is_none());
    }
}
