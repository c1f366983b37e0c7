//! JSON output structures for skill results.

use hindcast_io::Location;
use serde::Serialize;

use crate::error::SkillError;

/// Top-level skill report of one forecast variant at one granularity.
#[derive(Debug, Clone, Serialize)]
pub struct SkillReport {
    pub config: ConfigSummary,
    /// Number of (location, year, month, lead time) rows scored.
    pub n_pairs: usize,
    /// One entry per (lead time, quantile).
    pub scores: Vec<QuantileSkill>,
    pub spatial_accuracy: Vec<SpatialAccuracy>,
    pub leadtime_dependency: Vec<LeadTimeError>,
    pub climatology_profile: Vec<ProfileEntry>,
}

/// Summary of the configuration used.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    pub granularity: String,
    pub variant: String,
    pub quantiles: Vec<String>,
    pub decision_thresholds: Vec<f64>,
    pub months: Option<Vec<u8>>,
    pub spatial_lead_time: u8,
    pub spatial_threshold: f64,
}

/// Scores of one quantile at one lead time.
#[derive(Debug, Clone, Serialize)]
pub struct QuantileSkill {
    pub lead_time: u8,
    pub quantile: String,
    pub n: usize,
    /// Mean absolute difference between probability and 0/1 outcome.
    pub mae: Option<f64>,
    pub thresholds: Vec<ThresholdScore>,
    /// ROC points; the first threshold is `+inf` and serialises as `null`.
    pub roc: Option<RocCurve>,
    pub auc: Option<f64>,
}

/// Accuracy and F1 at one decision threshold.
#[derive(Debug, Clone, Serialize)]
pub struct ThresholdScore {
    pub threshold: f64,
    pub accuracy: f64,
    pub f1: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RocCurve {
    pub thresholds: Vec<f64>,
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
}

/// Location columns as they appear in the persisted tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationKey {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixel_geom_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adm_pcode: Option<String>,
}

impl From<&Location> for LocationKey {
    fn from(location: &Location) -> Self {
        match location {
            Location::Pixel(p) => Self {
                pixel_geom_id: Some(p.id().get()),
                latitude: Some(p.latitude()),
                longitude: Some(p.longitude()),
                adm_pcode: None,
            },
            Location::Admin(code) => Self {
                pixel_geom_id: None,
                latitude: None,
                longitude: None,
                adm_pcode: Some(code.as_str().to_string()),
            },
        }
    }
}

/// Share of correct below-quantile calls at one location.
#[derive(Debug, Clone, Serialize)]
pub struct SpatialAccuracy {
    #[serde(flatten)]
    pub location: LocationKey,
    pub quantile: String,
    pub n: usize,
    pub accuracy: f64,
}

/// Error of one forecast series against the reanalysis at one lead time.
#[derive(Debug, Clone, Serialize)]
pub struct LeadTimeError {
    pub lead_time: u8,
    pub variant: String,
    pub n: usize,
    /// Mean of ensemble mean minus reanalysis.
    pub bias: f64,
    pub mae: f64,
}

/// Mean precipitation of one forecast series per month and lead time, next
/// to the reanalysis mean of that month.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileEntry {
    pub month: u8,
    pub lead_time: u8,
    pub variant: String,
    pub tp_mm_day: f64,
    pub reanalysis_tp_mm_day: Option<f64>,
}

/// Serialize a skill report to a pretty JSON string.
pub fn to_json(report: &SkillReport) -> Result<String, SkillError> {
    serde_json::to_string_pretty(report).map_err(|e| SkillError::Serialization {
        reason: e.to_string(),
    })
}
