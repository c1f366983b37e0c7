//! High-level Parquet writer configuration and one writer per pipeline table.

use std::path::Path;

use parquet::file::properties::WriterProperties;
use tracing::debug;

use crate::error::IoError;
use crate::parquet_write::{self, TableBuilder};
use crate::records::{
    AdminLink, ClimatologyRecord, CorrectedForecast, ForecastRecord, Granularity, MemberBias,
    ProbabilityRecord, QuantileSet, ReanalysisOutcome,
};

/// Compression algorithm for Parquet output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Compression {
    /// No compression.
    None,
    /// Snappy compression (fast, moderate ratio).
    Snappy,
    /// Gzip compression (widely readable).
    #[default]
    Gzip,
    /// Zstd compression (slower, better ratio).
    Zstd,
}

impl Compression {
    /// Converts to the corresponding `parquet::basic::Compression` variant.
    fn to_parquet(self) -> Result<parquet::basic::Compression, IoError> {
        Ok(match self {
            Self::None => parquet::basic::Compression::UNCOMPRESSED,
            Self::Snappy => parquet::basic::Compression::SNAPPY,
            Self::Gzip => parquet::basic::Compression::GZIP(Default::default()),
            Self::Zstd => {
                let level =
                    parquet::basic::ZstdLevel::try_new(3).map_err(|e| IoError::Parquet {
                        reason: e.to_string(),
                    })?;
                parquet::basic::Compression::ZSTD(level)
            }
        })
    }
}

/// Configuration for writing pipeline tables to Parquet.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Compression algorithm to use.
    compression: Compression,
    /// Maximum number of rows per row group.
    row_group_size: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
            row_group_size: 1_000_000,
        }
    }
}

impl WriterConfig {
    /// Sets the compression algorithm.
    pub fn with_compression(mut self, comp: Compression) -> Self {
        self.compression = comp;
        self
    }

    /// Sets the maximum number of rows per row group.
    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Validates this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Validation`] if `row_group_size` is zero.
    pub fn validate(&self) -> Result<(), IoError> {
        if self.row_group_size == 0 {
            return Err(IoError::Validation {
                count: 1,
                details: "row_group_size must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    fn properties(&self) -> Result<WriterProperties, IoError> {
        self.validate()?;
        Ok(WriterProperties::builder()
            .set_compression(self.compression.to_parquet()?)
            .set_max_row_group_size(self.row_group_size)
            .build())
    }
}

fn write_table(path: &Path, table: TableBuilder, config: &WriterConfig) -> Result<(), IoError> {
    let props = config.properties()?;
    let (schema, batch) = table.finish()?;
    let rows = batch.num_rows();
    parquet_write::write_batches(path, &[batch], schema, props)?;
    debug!(path = %path.display(), rows, "wrote parquet table");
    Ok(())
}

fn climatology_columns(quantiles: &QuantileSet) -> Vec<String> {
    quantiles
        .labels()
        .iter()
        .map(|l| format!("climatology_{l}"))
        .collect()
}

fn probability_columns(quantiles: &QuantileSet) -> Vec<String> {
    quantiles.labels().iter().map(|l| format!("prob_{l}")).collect()
}

/// Append one `Float64` column per quantile, taking the `k`-th entry of each
/// row's vector.
fn per_quantile<'r, R: 'r>(
    mut table: TableBuilder,
    names: &[String],
    rows: &'r [R],
    values: impl Fn(&'r R) -> &'r [f64],
) -> Result<TableBuilder, IoError> {
    for (k, name) in names.iter().enumerate() {
        let column = rows
            .iter()
            .map(|r| {
                values(r).get(k).copied().ok_or_else(|| IoError::DimensionMismatch {
                    name: name.clone(),
                    expected: names.len(),
                    got: values(r).len(),
                })
            })
            .collect::<Result<Vec<f64>, IoError>>()?;
        table = table.f64(name, column);
    }
    Ok(table)
}

/// Write the pixel-to-admin link table (`reference_grid.parquet`).
///
/// # Errors
///
/// Returns [`IoError`] on invalid configuration or file I/O failure.
pub fn write_reference_grid(
    path: &Path,
    links: &[AdminLink],
    config: &WriterConfig,
) -> Result<(), IoError> {
    let table = TableBuilder::new()
        .i64("pixel_geom_id", links.iter().map(|l| l.point.id().get()).collect())
        .utf8(
            "adm_pcode",
            links.iter().map(|l| l.adm_pcode.as_str().to_string()).collect(),
        )
        .f64("latitude", links.iter().map(|l| l.point.latitude()).collect())
        .f64("longitude", links.iter().map(|l| l.point.longitude()).collect());
    write_table(path, table, config)
}

/// Write ensemble forecast records.
///
/// # Errors
///
/// Returns [`IoError::GranularityMismatch`] if a record's location is not of
/// `granularity`, or another [`IoError`] on I/O failure.
pub fn write_forecast(
    path: &Path,
    granularity: Granularity,
    records: &[ForecastRecord],
    config: &WriterConfig,
) -> Result<(), IoError> {
    let table = TableBuilder::new()
        .locations(granularity, records.iter().map(|r| &r.location))?
        .u32("number", records.iter().map(|r| r.number).collect())
        .i32("valid_time_year", records.iter().map(|r| r.year).collect())
        .u8("valid_time_month", records.iter().map(|r| r.month).collect())
        .u8("lead_time", records.iter().map(|r| r.lead_time).collect())
        .f64("tp_mm_day", records.iter().map(|r| r.tp_mm_day).collect());
    write_table(path, table, config)
}

/// Write reanalysis records with their climatology and below-quantile flags
/// (`era5_{granularity}.parquet`).
///
/// # Errors
///
/// Returns [`IoError::DimensionMismatch`] if a record's threshold or flag
/// vector does not match `quantiles`, plus the errors of [`write_forecast`].
pub fn write_reanalysis_outcomes(
    path: &Path,
    granularity: Granularity,
    records: &[ReanalysisOutcome],
    quantiles: &QuantileSet,
    config: &WriterConfig,
) -> Result<(), IoError> {
    let table = TableBuilder::new()
        .locations(granularity, records.iter().map(|r| &r.location))?
        .i32("valid_time_year", records.iter().map(|r| r.year).collect())
        .u8("valid_time_month", records.iter().map(|r| r.month).collect())
        .u8("lead_time", vec![0; records.len()])
        .f64("tp_mm_day", records.iter().map(|r| r.tp_mm_day).collect())
        .f64(
            "climatology_avg",
            records.iter().map(|r| r.climatology_mean).collect(),
        );
    let table = per_quantile(table, &climatology_columns(quantiles), records, |r| {
        r.thresholds.as_slice()
    })?;
    let table = per_quantile(table, &probability_columns(quantiles), records, |r| {
        r.below.as_slice()
    })?;
    write_table(path, table, config)
}

/// Write per-month climatology (`climatology_{granularity}.parquet`).
///
/// # Errors
///
/// Same as [`write_reanalysis_outcomes`].
pub fn write_climatology(
    path: &Path,
    granularity: Granularity,
    records: &[ClimatologyRecord],
    quantiles: &QuantileSet,
    config: &WriterConfig,
) -> Result<(), IoError> {
    let table = TableBuilder::new()
        .locations(granularity, records.iter().map(|r| &r.location))?
        .u8("valid_time_month", records.iter().map(|r| r.month).collect())
        .f64("climatology_avg", records.iter().map(|r| r.mean).collect());
    let table = per_quantile(table, &climatology_columns(quantiles), records, |r| {
        r.thresholds.as_slice()
    })?;
    write_table(path, table, config)
}

/// Write raw and corrected forecast series side by side.
///
/// # Errors
///
/// Same as [`write_forecast`].
pub fn write_corrected(
    path: &Path,
    granularity: Granularity,
    records: &[CorrectedForecast],
    config: &WriterConfig,
) -> Result<(), IoError> {
    let table = TableBuilder::new()
        .locations(granularity, records.iter().map(|r| &r.location))?
        .u32("number", records.iter().map(|r| r.number).collect())
        .i32("valid_time_year", records.iter().map(|r| r.year).collect())
        .u8("valid_time_month", records.iter().map(|r| r.month).collect())
        .u8("lead_time", records.iter().map(|r| r.lead_time).collect())
        .f64("tp_mm_day_raw", records.iter().map(|r| r.tp_mm_day_raw).collect())
        .f64(
            "tp_mm_day_bias_corrected",
            records.iter().map(|r| r.tp_mm_day_bias_corrected).collect(),
        )
        .opt_f64(
            "tp_mm_day_era5_calibrated",
            records.iter().map(|r| r.tp_mm_day_era5_calibrated).collect(),
        );
    write_table(path, table, config)
}

/// Write per-member bias against the reanalysis climatology.
///
/// # Errors
///
/// Same as [`write_forecast`].
pub fn write_member_bias(
    path: &Path,
    granularity: Granularity,
    records: &[MemberBias],
    config: &WriterConfig,
) -> Result<(), IoError> {
    let table = TableBuilder::new()
        .locations(granularity, records.iter().map(|r| &r.location))?
        .u32("number", records.iter().map(|r| r.number).collect())
        .u8("valid_time_month", records.iter().map(|r| r.month).collect())
        .u8("lead_time", records.iter().map(|r| r.lead_time).collect())
        .f64("tp_mm_day_mean_raw", records.iter().map(|r| r.mean_raw).collect())
        .f64("climatology_avg", records.iter().map(|r| r.era5_mean).collect())
        .f64("bias", records.iter().map(|r| r.bias).collect());
    write_table(path, table, config)
}

/// Write below-quantile probabilities with ensemble mean and bias columns.
///
/// # Errors
///
/// Same as [`write_reanalysis_outcomes`].
pub fn write_probabilities(
    path: &Path,
    granularity: Granularity,
    records: &[ProbabilityRecord],
    quantiles: &QuantileSet,
    config: &WriterConfig,
) -> Result<(), IoError> {
    let table = TableBuilder::new()
        .locations(granularity, records.iter().map(|r| &r.location))?
        .i32("valid_time_year", records.iter().map(|r| r.year).collect())
        .u8("valid_time_month", records.iter().map(|r| r.month).collect())
        .u8("lead_time", records.iter().map(|r| r.lead_time).collect())
        .f64("tp_mm_day", records.iter().map(|r| r.tp_mm_day).collect());
    let table = per_quantile(table, &climatology_columns(quantiles), records, |r| {
        r.thresholds.as_slice()
    })?;
    let table = per_quantile(table, &probability_columns(quantiles), records, |r| {
        r.probabilities.as_slice()
    })?
    .opt_f64("bias", records.iter().map(|r| r.bias).collect())
    .opt_f64("mae", records.iter().map(|r| r.mae).collect());
    write_table(path, table, config)
}

/// Column names for the given quantiles, `(climatology_*, prob_*)`.
pub fn quantile_columns(quantiles: &QuantileSet) -> (Vec<String>, Vec<String>) {
    (climatology_columns(quantiles), probability_columns(quantiles))
}
