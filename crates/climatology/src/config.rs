//! Climatology configuration.

use std::fmt;
use std::str::FromStr;

use hindcast_io::QuantileSet;

use crate::error::ClimatologyError;

/// Inclusive range of years a climatology is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferencePeriod {
    start: i32,
    end: i32,
}

impl ReferencePeriod {
    /// # Errors
    ///
    /// Returns [`ClimatologyError::EmptyPeriod`] if `end < start`.
    pub fn new(start: i32, end: i32) -> Result<Self, ClimatologyError> {
        if end < start {
            return Err(ClimatologyError::EmptyPeriod { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn end(&self) -> i32 {
        self.end
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.start..=self.end).contains(&year)
    }
}

impl fmt::Display for ReferencePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// What to do with forecast rows whose location and month have no
/// reanalysis climatology.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingClimatology {
    /// Remove the rows from the output.
    #[default]
    Drop,
    /// Keep the rows with missing derived values.
    Flag,
}

impl MissingClimatology {
    pub fn as_str(self) -> &'static str {
        match self {
            MissingClimatology::Drop => "drop",
            MissingClimatology::Flag => "flag",
        }
    }
}

impl fmt::Display for MissingClimatology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MissingClimatology {
    type Err = ClimatologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "drop" => Ok(MissingClimatology::Drop),
            "flag" => Ok(MissingClimatology::Flag),
            other => Err(ClimatologyError::Validation {
                count: 1,
                details: format!(
                    "unknown missing-climatology policy '{other}', expected drop or flag"
                ),
            }),
        }
    }
}

/// Configuration for [`climatology`](crate::climatology).
#[derive(Debug, Clone, Default)]
pub struct ClimatologyConfig {
    period: Option<ReferencePeriod>,
    quantiles: QuantileSet,
}

impl ClimatologyConfig {
    /// Restrict the climatology to a reference period. Without one, every
    /// input year is used.
    pub fn with_period(mut self, period: ReferencePeriod) -> Self {
        self.period = Some(period);
        self
    }

    pub fn with_quantiles(mut self, quantiles: QuantileSet) -> Self {
        self.quantiles = quantiles;
        self
    }

    pub fn period(&self) -> Option<ReferencePeriod> {
        self.period
    }

    pub fn quantiles(&self) -> &QuantileSet {
        &self.quantiles
    }
}
