//! # hindcast-climatology
//!
//! Reanalysis climatology per location and calendar month (mean and
//! quantile thresholds over a reference period), and the binary
//! below-quantile outcomes the forecast probabilities are scored against.

mod compute;
mod config;
mod error;
mod table;

pub use compute::{climatology, reanalysis_outcomes};
pub use config::{ClimatologyConfig, MissingClimatology, ReferencePeriod};
pub use error::ClimatologyError;
pub use table::ClimatologyTable;
