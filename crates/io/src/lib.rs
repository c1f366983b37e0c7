//! # hindcast-io
//!
//! Load gridded forecast and reanalysis data from NetCDF, read
//! administrative boundaries from GeoJSON, and persist every pipeline table
//! to Parquet. Also home of the record types shared by all hindcast crates.

mod boundaries;
mod conversion;
mod error;
mod loader;
mod netcdf_read;
mod parquet_read;
mod parquet_write;
mod reader;
mod records;
mod writer;

pub use boundaries::{AdminBoundary, Polygon, Ring, read_admin_boundaries, total_bounds};
pub use conversion::{
    forecast_rate_to_mm_day, forecast_records, lead_time_months, reanalysis_depth_to_mm_day,
    reanalysis_records, shift_valid_month,
};
pub use error::IoError;
pub use loader::{BoundingBox, LoaderConfig, ensemble_members, grid_axes, load_grid};
pub use reader::{
    read_climatology, read_corrected, read_forecast, read_member_bias, read_probabilities,
    read_reanalysis_outcomes, read_reference_grid,
};
pub use records::{
    AdminCode, AdminLink, ClimatologyRecord, CorrectedForecast, ForecastRecord, ForecastVariant,
    Granularity, GridPoint, GridRecord, Location, MemberBias, PixelId, ProbabilityRecord,
    QuantileSet, ReanalysisOutcome, ReanalysisRecord, quantile_label,
};
pub use writer::{
    Compression, WriterConfig, quantile_columns, write_climatology, write_corrected,
    write_forecast, write_member_bias, write_probabilities, write_reanalysis_outcomes,
    write_reference_grid,
};
