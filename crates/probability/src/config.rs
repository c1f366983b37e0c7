//! Probability configuration.

use hindcast_climatology::MissingClimatology;

/// Configuration for [`probabilities`](crate::probabilities).
#[derive(Debug, Clone, Default)]
pub struct ProbabilityConfig {
    missing_climatology: MissingClimatology,
}

impl ProbabilityConfig {
    /// Set the policy for forecast groups without a climatology.
    pub fn with_missing_climatology(mut self, policy: MissingClimatology) -> Self {
        self.missing_climatology = policy;
        self
    }

    pub fn missing_climatology(&self) -> MissingClimatology {
        self.missing_climatology
    }
}
