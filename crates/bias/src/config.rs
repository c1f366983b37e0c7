//! Configuration for bias correction.

use hindcast_climatology::MissingClimatology;

/// Configuration for [`correct_forecast`](crate::correct_forecast).
///
/// # Example
///
/// ```
/// use hindcast_bias::BiasConfig;
/// use hindcast_climatology::MissingClimatology;
///
/// let config = BiasConfig::new().with_missing_climatology(MissingClimatology::Flag);
/// assert_eq!(config.missing_climatology(), MissingClimatology::Flag);
/// ```
#[derive(Clone, Debug, Default)]
pub struct BiasConfig {
    missing_climatology: MissingClimatology,
}

impl BiasConfig {
    /// Creates a new configuration with defaults (`missing_climatology =
    /// Drop`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the policy for forecast rows without a reanalysis climatology.
    pub fn with_missing_climatology(mut self, policy: MissingClimatology) -> Self {
        self.missing_climatology = policy;
        self
    }

    /// Returns the missing-climatology policy.
    pub fn missing_climatology(&self) -> MissingClimatology {
        self.missing_climatology
    }
}
