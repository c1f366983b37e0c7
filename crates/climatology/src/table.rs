//! Lookup of climatology rows by location and calendar month.

use std::collections::BTreeMap;

use hindcast_io::{ClimatologyRecord, Location, QuantileSet};

use crate::error::ClimatologyError;

/// Climatology rows keyed by (location, month), with the quantile set their
/// thresholds are parallel to.
#[derive(Debug, Clone, PartialEq)]
pub struct ClimatologyTable {
    quantiles: QuantileSet,
    by_key: BTreeMap<(Location, u8), ClimatologyRecord>,
}

impl ClimatologyTable {
    /// Index climatology rows. A later row for the same key replaces an
    /// earlier one.
    ///
    /// # Errors
    ///
    /// Returns [`ClimatologyError::Validation`] if any row's threshold count
    /// differs from the quantile count.
    pub fn new(
        records: Vec<ClimatologyRecord>,
        quantiles: QuantileSet,
    ) -> Result<Self, ClimatologyError> {
        let bad: Vec<String> = records
            .iter()
            .filter(|r| r.thresholds.len() != quantiles.len())
            .map(|r| format!("{} month {}", r.location, r.month))
            .collect();
        if !bad.is_empty() {
            return Err(ClimatologyError::Validation {
                count: bad.len(),
                details: format!(
                    "expected {} thresholds per row; mismatched: {}",
                    quantiles.len(),
                    bad.join(", ")
                ),
            });
        }
        let by_key = records
            .into_iter()
            .map(|r| ((r.location.clone(), r.month), r))
            .collect();
        Ok(Self { quantiles, by_key })
    }

    pub fn get(&self, location: &Location, month: u8) -> Option<&ClimatologyRecord> {
        self.by_key.get(&(location.clone(), month))
    }

    pub fn quantiles(&self) -> &QuantileSet {
        &self.quantiles
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Rows in (location, month) order.
    pub fn records(&self) -> impl Iterator<Item = &ClimatologyRecord> {
        self.by_key.values()
    }
}
