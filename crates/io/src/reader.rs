//! Readers for the persisted pipeline tables.
//!
//! Every reader looks its columns up by name, so column order in the file
//! does not matter. A missing column is reported as
//! [`IoError::MissingColumn`].

use std::path::Path;

use tracing::debug;

use crate::error::IoError;
use crate::parquet_read::{self, Columns};
use crate::records::{
    AdminCode, AdminLink, ClimatologyRecord, CorrectedForecast, ForecastRecord, Granularity,
    GridPoint, MemberBias, PixelId, ProbabilityRecord, QuantileSet, ReanalysisOutcome,
};
use crate::writer::quantile_columns;

/// Read every batch of `path` and decode each with `decode`.
fn read_table<T>(
    path: &Path,
    mut decode: impl FnMut(&Columns<'_>, &mut Vec<T>) -> Result<(), IoError>,
) -> Result<Vec<T>, IoError> {
    let batches = parquet_read::read_batches(path)?;
    let mut out = Vec::new();
    for batch in &batches {
        decode(&Columns::new(batch, path), &mut out)?;
    }
    debug!(path = %path.display(), rows = out.len(), "read parquet table");
    Ok(out)
}

/// Read the pixel-to-admin link table.
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`], [`IoError::MissingColumn`] or
/// [`IoError::Parquet`].
pub fn read_reference_grid(path: &Path) -> Result<Vec<AdminLink>, IoError> {
    read_table(path, |cols, out| {
        let ids = cols.i64("pixel_geom_id")?;
        let codes = cols.utf8("adm_pcode")?;
        let lats = cols.f64("latitude")?;
        let lons = cols.f64("longitude")?;
        for i in 0..cols.num_rows() {
            out.push(AdminLink {
                point: GridPoint::from_parts(
                    PixelId::from_raw(ids.value(i)),
                    lats.value(i),
                    lons.value(i),
                ),
                adm_pcode: AdminCode::new(codes.value(i)),
            });
        }
        Ok(())
    })
}

/// Read ensemble forecast records at `granularity`.
///
/// # Errors
///
/// Returns [`IoError::GranularityMismatch`] if the file holds the other
/// granularity, plus the errors of [`read_reference_grid`].
pub fn read_forecast(
    path: &Path,
    granularity: Granularity,
) -> Result<Vec<ForecastRecord>, IoError> {
    read_table(path, |cols, out| {
        let locations = cols.locations(granularity)?;
        let number = cols.u32("number")?;
        let year = cols.i32("valid_time_year")?;
        let month = cols.u8("valid_time_month")?;
        let lead = cols.u8("lead_time")?;
        let tp = cols.f64("tp_mm_day")?;
        for (i, location) in locations.into_iter().enumerate() {
            out.push(ForecastRecord {
                location,
                number: number.value(i),
                year: year.value(i),
                month: month.value(i),
                lead_time: lead.value(i),
                tp_mm_day: tp.value(i),
            });
        }
        Ok(())
    })
}

/// Read reanalysis records with climatology and below-quantile flags.
///
/// # Errors
///
/// Same as [`read_forecast`]; a quantile column absent for `quantiles` is
/// an [`IoError::MissingColumn`].
pub fn read_reanalysis_outcomes(
    path: &Path,
    granularity: Granularity,
    quantiles: &QuantileSet,
) -> Result<Vec<ReanalysisOutcome>, IoError> {
    let (clim_names, prob_names) = quantile_columns(quantiles);
    read_table(path, |cols, out| {
        let locations = cols.locations(granularity)?;
        let year = cols.i32("valid_time_year")?;
        let month = cols.u8("valid_time_month")?;
        let tp = cols.f64("tp_mm_day")?;
        let mean = cols.f64("climatology_avg")?;
        let clim = cols.f64_many(&clim_names)?;
        let prob = cols.f64_many(&prob_names)?;
        for (i, location) in locations.into_iter().enumerate() {
            out.push(ReanalysisOutcome {
                location,
                year: year.value(i),
                month: month.value(i),
                tp_mm_day: tp.value(i),
                climatology_mean: mean.value(i),
                thresholds: clim.iter().map(|c| c.value(i)).collect(),
                below: prob.iter().map(|c| c.value(i)).collect(),
            });
        }
        Ok(())
    })
}

/// Read per-month climatology.
///
/// # Errors
///
/// Same as [`read_reanalysis_outcomes`].
pub fn read_climatology(
    path: &Path,
    granularity: Granularity,
    quantiles: &QuantileSet,
) -> Result<Vec<ClimatologyRecord>, IoError> {
    let (clim_names, _) = quantile_columns(quantiles);
    read_table(path, |cols, out| {
        let locations = cols.locations(granularity)?;
        let month = cols.u8("valid_time_month")?;
        let mean = cols.f64("climatology_avg")?;
        let clim = cols.f64_many(&clim_names)?;
        for (i, location) in locations.into_iter().enumerate() {
            out.push(ClimatologyRecord {
                location,
                month: month.value(i),
                mean: mean.value(i),
                thresholds: clim.iter().map(|c| c.value(i)).collect(),
            });
        }
        Ok(())
    })
}

/// Read raw and corrected forecast series.
///
/// # Errors
///
/// Same as [`read_forecast`].
pub fn read_corrected(
    path: &Path,
    granularity: Granularity,
) -> Result<Vec<CorrectedForecast>, IoError> {
    read_table(path, |cols, out| {
        let locations = cols.locations(granularity)?;
        let number = cols.u32("number")?;
        let year = cols.i32("valid_time_year")?;
        let month = cols.u8("valid_time_month")?;
        let lead = cols.u8("lead_time")?;
        let raw = cols.f64("tp_mm_day_raw")?;
        let corrected = cols.f64("tp_mm_day_bias_corrected")?;
        let calibrated = cols.f64("tp_mm_day_era5_calibrated")?;
        for (i, location) in locations.into_iter().enumerate() {
            out.push(CorrectedForecast {
                location,
                number: number.value(i),
                year: year.value(i),
                month: month.value(i),
                lead_time: lead.value(i),
                tp_mm_day_raw: raw.value(i),
                tp_mm_day_bias_corrected: corrected.value(i),
                tp_mm_day_era5_calibrated: parquet_read::nullable(calibrated, i),
            });
        }
        Ok(())
    })
}

/// Read per-member bias rows.
///
/// # Errors
///
/// Same as [`read_forecast`].
pub fn read_member_bias(path: &Path, granularity: Granularity) -> Result<Vec<MemberBias>, IoError> {
    read_table(path, |cols, out| {
        let locations = cols.locations(granularity)?;
        let number = cols.u32("number")?;
        let month = cols.u8("valid_time_month")?;
        let lead = cols.u8("lead_time")?;
        let mean_raw = cols.f64("tp_mm_day_mean_raw")?;
        let era5 = cols.f64("climatology_avg")?;
        let bias = cols.f64("bias")?;
        for (i, location) in locations.into_iter().enumerate() {
            out.push(MemberBias {
                location,
                number: number.value(i),
                month: month.value(i),
                lead_time: lead.value(i),
                mean_raw: mean_raw.value(i),
                era5_mean: era5.value(i),
                bias: bias.value(i),
            });
        }
        Ok(())
    })
}

/// Read below-quantile probabilities.
///
/// # Errors
///
/// Same as [`read_reanalysis_outcomes`].
pub fn read_probabilities(
    path: &Path,
    granularity: Granularity,
    quantiles: &QuantileSet,
) -> Result<Vec<ProbabilityRecord>, IoError> {
    let (clim_names, prob_names) = quantile_columns(quantiles);
    read_table(path, |cols, out| {
        let locations = cols.locations(granularity)?;
        let year = cols.i32("valid_time_year")?;
        let month = cols.u8("valid_time_month")?;
        let lead = cols.u8("lead_time")?;
        let tp = cols.f64("tp_mm_day")?;
        let clim = cols.f64_many(&clim_names)?;
        let prob = cols.f64_many(&prob_names)?;
        let bias = cols.f64("bias")?;
        let mae = cols.f64("mae")?;
        for (i, location) in locations.into_iter().enumerate() {
            out.push(ProbabilityRecord {
                location,
                year: year.value(i),
                month: month.value(i),
                lead_time: lead.value(i),
                tp_mm_day: tp.value(i),
                thresholds: clim.iter().map(|c| c.value(i)).collect(),
                probabilities: prob.iter().map(|c| c.value(i)).collect(),
                bias: parquet_read::nullable(bias, i),
                mae: parquet_read::nullable(mae, i),
            });
        }
        Ok(())
    })
}
