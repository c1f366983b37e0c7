//! # hindcast-probability
//!
//! Ensemble below-quantile probabilities of a forecast series against the
//! reanalysis climatology, with optional bias and absolute error against
//! the reanalysis itself.

mod config;
mod ensemble;
mod error;

pub use config::ProbabilityConfig;
pub use ensemble::{probabilities, select_variant};
pub use error::ProbabilityError;
