//! Result type for bias correction.

use hindcast_io::{CorrectedForecast, MemberBias};

/// The output of [`correct_forecast`](crate::correct_forecast).
///
/// Holds the corrected series next to the raw one, the per-member bias
/// against the reanalysis climatology, and counts of rows affected by a
/// missing climatology.
#[derive(Debug, Clone)]
pub struct BiasResult {
    corrected: Vec<CorrectedForecast>,
    member_bias: Vec<MemberBias>,
    dropped: usize,
    flagged: usize,
}

impl BiasResult {
    pub(crate) fn new(
        corrected: Vec<CorrectedForecast>,
        member_bias: Vec<MemberBias>,
        dropped: usize,
        flagged: usize,
    ) -> Self {
        Self {
            corrected,
            member_bias,
            dropped,
            flagged,
        }
    }

    /// Corrected rows, sorted by (location, member, year, month, lead time).
    pub fn corrected(&self) -> &[CorrectedForecast] {
        &self.corrected
    }

    /// Per-member bias rows, sorted by (location, member, month, lead time).
    pub fn member_bias(&self) -> &[MemberBias] {
        &self.member_bias
    }

    /// Rows removed because no reanalysis climatology exists.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Rows kept without a calibrated value.
    pub fn flagged(&self) -> usize {
        self.flagged
    }

    /// Consumes `self` and returns the corrected and member-bias tables.
    pub fn into_parts(self) -> (Vec<CorrectedForecast>, Vec<MemberBias>) {
        (self.corrected, self.member_bias)
    }
}
