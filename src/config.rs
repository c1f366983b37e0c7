use std::path::PathBuf;

use serde::Deserialize;

/// Top-level hindcast configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HindcastConfig {
    /// Directory receiving every artifact.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Granularities to produce: "pixel", "admin" or both.
    #[serde(default = "default_granularities")]
    pub granularities: Vec<String>,

    /// Seasonal forecast ensemble.
    pub forecast: ForecastToml,

    /// Reanalysis reference data.
    pub reanalysis: ReanalysisToml,

    /// Administrative boundaries.
    pub boundaries: BoundariesToml,

    /// Climatology and missing-climatology policy.
    #[serde(default)]
    pub climatology: ClimatologyToml,

    /// Skill scoring settings.
    #[serde(default)]
    pub skill: SkillToml,

    /// Parquet output settings.
    #[serde(default)]
    pub io: IoToml,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}
fn default_granularities() -> Vec<String> {
    vec!["pixel".to_string(), "admin".to_string()]
}

/// Dimension name aliases; unset lists keep the loader defaults.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct DimensionsToml {
    pub latitude: Option<Vec<String>>,
    pub longitude: Option<Vec<String>>,
    pub time: Option<Vec<String>>,
    pub step: Option<Vec<String>>,
    pub member: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForecastToml {
    pub path: PathBuf,
    #[serde(default = "default_forecast_variable")]
    pub variable: String,
    /// Members to load; all members in the file when unset.
    #[serde(default)]
    pub members: Option<Vec<u32>>,
    #[serde(default = "default_bbox_buffer")]
    pub bbox_buffer: f64,
    #[serde(default)]
    pub dimensions: DimensionsToml,
}

fn default_forecast_variable() -> String {
    "tprate".to_string()
}
fn default_bbox_buffer() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReanalysisToml {
    pub path: PathBuf,
    #[serde(default = "default_reanalysis_variable")]
    pub variable: String,
    /// "nearest" or "conservative".
    #[serde(default = "default_regrid")]
    pub regrid: String,
    #[serde(default = "default_bbox_buffer")]
    pub bbox_buffer: f64,
    #[serde(default)]
    pub dimensions: DimensionsToml,
}

fn default_reanalysis_variable() -> String {
    "tp".to_string()
}
fn default_regrid() -> String {
    "nearest".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoundariesToml {
    pub path: PathBuf,
    #[serde(default = "default_code_property")]
    pub code_property: String,
    /// Half-width of the square cell around each forecast pixel, degrees.
    #[serde(default = "default_half_width")]
    pub half_width: f64,
}

fn default_code_property() -> String {
    "adm2_pcode".to_string()
}
fn default_half_width() -> f64 {
    0.5
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClimatologyToml {
    /// Quantile fractions; the standard 1/2, 1/3, 1/4, 1/5 set when unset.
    #[serde(default)]
    pub quantiles: Option<Vec<f64>>,
    /// First and last year of the reference period; both or neither.
    #[serde(default)]
    pub start_year: Option<i32>,
    #[serde(default)]
    pub end_year: Option<i32>,
    /// "drop" or "flag".
    #[serde(default = "default_missing")]
    pub missing: String,
}

impl Default for ClimatologyToml {
    fn default() -> Self {
        Self {
            quantiles: None,
            start_year: None,
            end_year: None,
            missing: default_missing(),
        }
    }
}

fn default_missing() -> String {
    "drop".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SkillToml {
    /// Series to score: "raw", "bias_corrected", "era5_calibrated".
    #[serde(default = "default_variants")]
    pub variants: Vec<String>,
    #[serde(default)]
    pub decision_thresholds: Option<Vec<f64>>,
    #[serde(default)]
    pub months: Option<Vec<u8>>,
    #[serde(default = "default_spatial_lead_time")]
    pub spatial_lead_time: u8,
    #[serde(default = "default_spatial_threshold")]
    pub spatial_threshold: f64,
}

impl Default for SkillToml {
    fn default() -> Self {
        Self {
            variants: default_variants(),
            decision_thresholds: None,
            months: None,
            spatial_lead_time: default_spatial_lead_time(),
            spatial_threshold: default_spatial_threshold(),
        }
    }
}

fn default_variants() -> Vec<String> {
    ["raw", "bias_corrected", "era5_calibrated"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_spatial_lead_time() -> u8 {
    1
}
fn default_spatial_threshold() -> f64 {
    0.5
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IoToml {
    #[serde(default = "default_compression")]
    pub compression: String,
    #[serde(default = "default_row_group_size")]
    pub row_group_size: usize,
}

impl Default for IoToml {
    fn default() -> Self {
        Self {
            compression: default_compression(),
            row_group_size: default_row_group_size(),
        }
    }
}

fn default_compression() -> String {
    "gzip".to_string()
}
fn default_row_group_size() -> usize {
    1_000_000
}
