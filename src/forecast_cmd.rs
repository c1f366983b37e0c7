//! Forecast stage: load the ensemble member by member, link pixels to admin
//! regions and aggregate to every granularity.

use anyhow::{Context, Result, bail};
use tracing::{info, info_span, warn};

use hindcast_grid::{
    ReferenceGrid, aggregate_forecast, build_reference_grid, sort_forecast, unique_points,
};
use hindcast_io::{
    ForecastRecord, Granularity, ensemble_members, forecast_records, load_grid,
    read_admin_boundaries, total_bounds, write_forecast, write_reference_grid,
};

use crate::convert::Settings;

pub fn run(settings: &Settings) -> Result<()> {
    let _cmd = info_span!("forecast").entered();
    let path = &settings.forecast_path;

    let boundaries = read_admin_boundaries(&settings.boundaries_path, &settings.code_property)
        .with_context(|| {
            format!(
                "failed to read admin boundaries: {}",
                settings.boundaries_path.display()
            )
        })?;
    let bbox = total_bounds(&boundaries);
    if bbox.is_none() {
        warn!("admin boundaries have no extent, loading the full forecast grid");
    }
    info!(regions = boundaries.len(), "admin boundaries loaded");

    let members = match &settings.members {
        Some(m) => m.clone(),
        None => ensemble_members(path, &settings.forecast_loader)
            .with_context(|| format!("failed to list ensemble members: {}", path.display()))?,
    };
    if members.is_empty() {
        bail!(
            "forecast file has no ensemble member dimension: {}",
            path.display()
        );
    }
    info!(n_members = members.len(), "loading forecast ensemble");

    let mut reference: Option<ReferenceGrid> = None;
    let mut pixel: Vec<ForecastRecord> = Vec::new();
    let mut admin: Vec<ForecastRecord> = Vec::new();

    for member in members {
        let _m = info_span!("member", number = member).entered();
        let raw = load_grid(path, &settings.forecast_loader, bbox.as_ref(), Some(member))
            .with_context(|| format!("failed to load member {member} from {}", path.display()))?;
        let records = forecast_records(&raw)
            .with_context(|| format!("failed to convert member {member}"))?;

        let grid = match reference.take() {
            Some(grid) => grid,
            None => {
                let points = unique_points(records.iter().map(|r| &r.location));
                build_reference_grid(&points, &boundaries, &settings.reference)
                    .context("failed to build reference grid")?
            }
        };
        let aggregated = aggregate_forecast(&records, &grid)
            .with_context(|| format!("failed to aggregate member {member}"))?;
        pixel.extend(aggregated.pixel);
        admin.extend(aggregated.admin);
        reference = Some(grid);
    }

    let reference = reference.unwrap_or_default();
    if reference.is_empty() {
        warn!("reference grid is empty, downstream stages will produce no rows");
    }
    let out = settings.artifacts.reference_grid();
    write_reference_grid(&out, reference.links(), &settings.writer)
        .with_context(|| format!("failed to write {}", out.display()))?;

    sort_forecast(&mut pixel);
    sort_forecast(&mut admin);
    for &g in &settings.granularities {
        let records = match g {
            Granularity::Pixel => &pixel,
            Granularity::Admin => &admin,
        };
        let out = settings.artifacts.forecast(g);
        write_forecast(&out, g, records, &settings.writer)
            .with_context(|| format!("failed to write {}", out.display()))?;
        info!(granularity = %g, rows = records.len(), path = %out.display(), "forecast written");
    }
    Ok(())
}
