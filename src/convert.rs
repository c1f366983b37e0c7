//! Pure conversion functions: TOML config structs -> crate API config types.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::artifacts::Artifacts;
use crate::config::*;

use hindcast_bias::BiasConfig;
use hindcast_climatology::{ClimatologyConfig, MissingClimatology, ReferencePeriod};
use hindcast_grid::{ReferenceGridConfig, RegridMethod};
use hindcast_io::{
    Compression, ForecastVariant, Granularity, LoaderConfig, QuantileSet, WriterConfig,
};
use hindcast_probability::ProbabilityConfig;
use hindcast_skill::SkillConfig;

/// Everything a pipeline stage needs, validated up front.
#[derive(Debug)]
pub struct Settings {
    pub artifacts: Artifacts,
    pub granularities: Vec<Granularity>,
    pub forecast_path: PathBuf,
    pub forecast_loader: LoaderConfig,
    pub members: Option<Vec<u32>>,
    pub reanalysis_path: PathBuf,
    pub reanalysis_loader: LoaderConfig,
    pub regrid: RegridMethod,
    pub boundaries_path: PathBuf,
    pub code_property: String,
    pub reference: ReferenceGridConfig,
    pub quantiles: QuantileSet,
    pub climatology: ClimatologyConfig,
    pub bias: BiasConfig,
    pub probability: ProbabilityConfig,
    pub variants: Vec<ForecastVariant>,
    pub skill: SkillConfig,
    pub writer: WriterConfig,
}

/// Parses a compression algorithm name string into the corresponding enum variant.
pub fn parse_compression(s: &str) -> Result<Compression> {
    match s.to_lowercase().as_str() {
        "none" => Ok(Compression::None),
        "snappy" => Ok(Compression::Snappy),
        "gzip" => Ok(Compression::Gzip),
        "zstd" => Ok(Compression::Zstd),
        other => bail!("unknown compression: {other:?}"),
    }
}

/// Parses a regridding method name.
pub fn parse_regrid(s: &str) -> Result<RegridMethod> {
    match s.to_lowercase().as_str() {
        "nearest" => Ok(RegridMethod::Nearest),
        "conservative" => Ok(RegridMethod::Conservative),
        other => bail!("unknown regrid method: {other:?}"),
    }
}

/// Parses a forecast series name as used in artifact file names.
pub fn parse_variant(s: &str) -> Result<ForecastVariant> {
    ForecastVariant::ALL
        .into_iter()
        .find(|v| v.as_str() == s.to_lowercase())
        .with_context(|| format!("unknown forecast variant: {s:?}"))
}

/// Parses a granularity name, `pixel` or `admin`.
pub fn parse_granularity(s: &str) -> Result<Granularity> {
    match s.to_lowercase().as_str() {
        "pixel" => Ok(Granularity::Pixel),
        "admin" => Ok(Granularity::Admin),
        other => bail!("unknown granularity: {other:?}"),
    }
}

/// Parses a list of names, dropping repeats and keeping first-seen order.
fn parse_list<T: PartialEq>(
    items: &[String],
    what: &str,
    parse: fn(&str) -> Result<T>,
) -> Result<Vec<T>> {
    let mut out = Vec::new();
    for item in items {
        let value = parse(item)?;
        if !out.contains(&value) {
            out.push(value);
        }
    }
    if out.is_empty() {
        bail!("at least one {what} is required");
    }
    Ok(out)
}

/// Builds a `LoaderConfig` from a variable name, buffer and alias overrides.
pub fn build_loader_config(
    variable: &str,
    bbox_buffer: f64,
    dims: &DimensionsToml,
) -> Result<LoaderConfig> {
    let mut cfg = LoaderConfig::default()
        .with_variable(variable)
        .with_bbox_buffer(bbox_buffer);
    if let Some(a) = &dims.latitude {
        cfg = cfg.with_lat_aliases(a.clone());
    }
    if let Some(a) = &dims.longitude {
        cfg = cfg.with_lon_aliases(a.clone());
    }
    if let Some(a) = &dims.time {
        cfg = cfg.with_time_aliases(a.clone());
    }
    if let Some(a) = &dims.step {
        cfg = cfg.with_step_aliases(a.clone());
    }
    if let Some(a) = &dims.member {
        cfg = cfg.with_member_aliases(a.clone());
    }
    cfg.validate()
        .with_context(|| format!("invalid loader settings for variable {variable:?}"))?;
    Ok(cfg)
}

/// Converts `[climatology]` into the quantile set and `ClimatologyConfig`.
pub fn build_climatology_config(t: &ClimatologyToml) -> Result<(QuantileSet, ClimatologyConfig)> {
    let quantiles = match &t.quantiles {
        Some(fractions) => {
            QuantileSet::new(fractions.clone()).context("invalid [climatology].quantiles")?
        }
        None => QuantileSet::standard(),
    };
    let mut cfg = ClimatologyConfig::default().with_quantiles(quantiles.clone());
    match (t.start_year, t.end_year) {
        (Some(start), Some(end)) => {
            cfg = cfg.with_period(ReferencePeriod::new(start, end)?);
        }
        (None, None) => {}
        _ => bail!("[climatology] needs both start_year and end_year, or neither"),
    }
    Ok((quantiles, cfg))
}

/// Converts `[skill]` into a validated `SkillConfig`.
pub fn build_skill_config(t: &SkillToml) -> Result<SkillConfig> {
    let mut cfg = SkillConfig::default()
        .with_spatial_lead_time(t.spatial_lead_time)
        .with_spatial_threshold(t.spatial_threshold);
    if let Some(thresholds) = &t.decision_thresholds {
        cfg = cfg.with_decision_thresholds(thresholds.clone());
    }
    if let Some(months) = &t.months {
        cfg = cfg.with_months(months.clone());
    }
    cfg.validate().context("invalid [skill] settings")?;
    Ok(cfg)
}

/// Converts `[io]` into a validated `WriterConfig`.
pub fn build_writer_config(t: &IoToml) -> Result<WriterConfig> {
    let cfg = WriterConfig::default()
        .with_compression(parse_compression(&t.compression)?)
        .with_row_group_size(t.row_group_size);
    cfg.validate().context("invalid [io] settings")?;
    Ok(cfg)
}

/// Converts the whole configuration into stage settings.
///
/// `output_dir` overrides the configured output directory.
pub fn build_settings(config: &HindcastConfig, output_dir: Option<&Path>) -> Result<Settings> {
    let forecast_loader = build_loader_config(
        &config.forecast.variable,
        config.forecast.bbox_buffer,
        &config.forecast.dimensions,
    )?;
    let reanalysis_loader = build_loader_config(
        &config.reanalysis.variable,
        config.reanalysis.bbox_buffer,
        &config.reanalysis.dimensions,
    )?;
    if config.forecast.members.as_ref().is_some_and(Vec::is_empty) {
        bail!("[forecast].members must not be empty; omit it to load every member");
    }

    let reference = ReferenceGridConfig::default().with_half_width(config.boundaries.half_width);
    reference.validate().context("invalid [boundaries] settings")?;

    let (quantiles, climatology) = build_climatology_config(&config.climatology)?;
    let missing: MissingClimatology = config.climatology.missing.parse()?;

    Ok(Settings {
        artifacts: Artifacts::new(output_dir.unwrap_or(config.output_dir.as_path())),
        granularities: parse_list(&config.granularities, "granularity", parse_granularity)?,
        forecast_path: config.forecast.path.clone(),
        forecast_loader,
        members: config.forecast.members.clone(),
        reanalysis_path: config.reanalysis.path.clone(),
        reanalysis_loader,
        regrid: parse_regrid(&config.reanalysis.regrid)?,
        boundaries_path: config.boundaries.path.clone(),
        code_property: config.boundaries.code_property.clone(),
        reference,
        quantiles,
        climatology,
        bias: BiasConfig::new().with_missing_climatology(missing),
        probability: ProbabilityConfig::default().with_missing_climatology(missing),
        variants: parse_list(&config.skill.variants, "forecast variant", parse_variant)?,
        skill: build_skill_config(&config.skill)?,
        writer: build_writer_config(&config.io)?,
    })
}
