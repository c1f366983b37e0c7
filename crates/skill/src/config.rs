//! Skill evaluation configuration.

use crate::error::SkillError;

/// Configuration for [`evaluate_skill`](crate::evaluate_skill).
#[derive(Debug, Clone)]
pub struct SkillConfig {
    decision_thresholds: Vec<f64>,
    months: Option<Vec<u8>>,
    spatial_lead_time: u8,
    spatial_threshold: f64,
}

impl Default for SkillConfig {
    fn default() -> Self {
        Self {
            decision_thresholds: (0..=10).map(|i| f64::from(i) / 10.0).collect(),
            months: None,
            spatial_lead_time: 1,
            spatial_threshold: 0.5,
        }
    }
}

impl SkillConfig {
    /// Set the probability thresholds at which accuracy and F1 are scored.
    pub fn with_decision_thresholds(mut self, thresholds: Vec<f64>) -> Self {
        self.decision_thresholds = thresholds;
        self
    }

    /// Only score these valid months.
    pub fn with_months(mut self, months: Vec<u8>) -> Self {
        self.months = Some(months);
        self
    }

    /// Set the lead time of the spatial accuracy map.
    pub fn with_spatial_lead_time(mut self, lead_time: u8) -> Self {
        self.spatial_lead_time = lead_time;
        self
    }

    /// Set the decision threshold of the spatial accuracy map.
    pub fn with_spatial_threshold(mut self, threshold: f64) -> Self {
        self.spatial_threshold = threshold;
        self
    }

    /// Returns the decision thresholds.
    pub fn decision_thresholds(&self) -> &[f64] {
        &self.decision_thresholds
    }

    /// Returns the month filter, if any.
    pub fn months(&self) -> Option<&[u8]> {
        self.months.as_deref()
    }

    pub fn spatial_lead_time(&self) -> u8 {
        self.spatial_lead_time
    }

    pub fn spatial_threshold(&self) -> f64 {
        self.spatial_threshold
    }

    /// Whether `month` passes the month filter.
    pub fn includes_month(&self, month: u8) -> bool {
        self.months.as_ref().is_none_or(|m| m.contains(&month))
    }

    /// # Errors
    ///
    /// Returns [`SkillError::Validation`] listing every threshold outside
    /// `[0, 1]` and every month outside `1..=12`.
    pub fn validate(&self) -> Result<(), SkillError> {
        let mut errors = Vec::new();
        if self.decision_thresholds.is_empty() {
            errors.push("no decision thresholds".to_string());
        }
        for t in self
            .decision_thresholds
            .iter()
            .chain(std::iter::once(&self.spatial_threshold))
        {
            if !(0.0..=1.0).contains(t) {
                errors.push(format!("decision threshold {t} outside [0, 1]"));
            }
        }
        for m in self.months.iter().flatten() {
            if !(1..=12).contains(m) {
                errors.push(format!("month {m} out of range"));
            }
        }
        if !errors.is_empty() {
            return Err(SkillError::Validation {
                count: errors.len(),
                details: errors.join("; "),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = SkillConfig::default();
        assert_eq!(config.decision_thresholds().len(), 11);
        assert_eq!(config.decision_thresholds()[0], 0.0);
        assert_eq!(config.decision_thresholds()[10], 1.0);
        assert!(config.months().is_none());
        assert_eq!(config.spatial_lead_time(), 1);
        assert_eq!(config.spatial_threshold(), 0.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_month_filter() {
        let config = SkillConfig::default().with_months(vec![6, 7, 8]);
        assert!(config.includes_month(7));
        assert!(!config.includes_month(1));
        assert!(SkillConfig::default().includes_month(1));
    }

    #[test]
    fn test_validate_collects_errors() {
        let config = SkillConfig::default()
            .with_decision_thresholds(vec![0.5, 1.5])
            .with_months(vec![0, 13]);
        match config.validate().unwrap_err() {
            SkillError::Validation { count, .. } => assert_eq!(count, 3),
            other => panic!("unexpected error: {other}"),
        }
    }
}
