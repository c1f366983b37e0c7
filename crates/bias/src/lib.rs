//! Bias correction of ensemble seasonal forecasts.
//!
//! Two independent corrections remove each member's systematic offset per
//! location, calendar month and lead time:
//!
//! 1. **Lead-time correction** re-centres each member on the forecast's own
//!    mean over all lead times, removing drift with lead time.
//! 2. **Reanalysis calibration** re-centres each member on the reanalysis
//!    climatological mean.
//!
//! Both corrected series are floored at zero and stored next to the raw
//! series; nothing is overwritten.
//!
//! # Quick Start
//!
//! ```no_run
//! use hindcast_bias::{BiasConfig, correct_forecast};
//! use hindcast_climatology::{ClimatologyConfig, climatology};
//! use hindcast_io::{ForecastRecord, Granularity, ReanalysisRecord};
//!
//! # fn run(
//! #     forecast: Vec<ForecastRecord>,
//! #     era5: Vec<ReanalysisRecord>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let table = climatology(&era5, Granularity::Admin, &ClimatologyConfig::default())?;
//! let result = correct_forecast(&forecast, &table, Granularity::Admin, &BiasConfig::new())?;
//! println!("{} corrected rows", result.corrected().len());
//! # Ok(())
//! # }
//! ```

mod config;
mod correct;
mod error;
mod result;

pub use config::BiasConfig;
pub use correct::correct_forecast;
pub use error::BiasError;
pub use result::BiasResult;
