//! # hindcast-grid
//!
//! Spatial matching between the forecast grid, the reanalysis grid and
//! administrative regions: the pixel-to-region reference grid, regridding
//! onto the forecast grid, and aggregation of pixel records to both
//! granularities.

mod error;
mod geometry;
mod join;
mod reference;
mod regrid;

pub use error::GridError;
pub use join::{
    Aggregated, aggregate_forecast, aggregate_reanalysis, regrid_reanalysis, sort_forecast,
};
pub use reference::{ReferenceGrid, ReferenceGridConfig, build_reference_grid, unique_points};
pub use regrid::{RegridMethod, TargetGrid, regrid};
