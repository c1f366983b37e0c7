//! Low-level NetCDF extraction helpers.

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

use crate::error::IoError;

/// Open a NetCDF file at `path`, returning [`IoError::FileNotFound`] if the
/// path does not exist on disk.
pub(crate) fn open_file(path: &Path) -> Result<netcdf::File, IoError> {
    if !path.exists() {
        return Err(IoError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(netcdf::open(path)?)
}

/// Look up a variable by name.
pub(crate) fn variable<'f>(
    file: &'f netcdf::File,
    name: &str,
    path: &Path,
) -> Result<netcdf::Variable<'f>, IoError> {
    file.variable(name).ok_or_else(|| IoError::MissingVariable {
        name: name.to_string(),
        path: path.to_path_buf(),
    })
}

/// Read a 1-D `f64` variable, trying each alias in order.
///
/// Returns the data from the first alias that matches. If none match,
/// returns [`IoError::MissingVariable`] with the first alias as the name.
pub(crate) fn read_1d_f64(
    file: &netcdf::File,
    aliases: &[&str],
    path: &Path,
) -> Result<Vec<f64>, IoError> {
    for &alias in aliases {
        if let Some(var) = file.variable(alias) {
            return Ok(var.get_values::<f64, _>(..)?);
        }
    }

    let name = aliases.first().copied().unwrap_or("unknown");
    Err(IoError::MissingVariable {
        name: name.to_string(),
        path: path.to_path_buf(),
    })
}

/// Read a hyperslab of `var` as `f64`, given per-dimension start and count.
pub(crate) fn read_slab_f64(
    var: &netcdf::Variable<'_>,
    start: &[usize],
    count: &[usize],
) -> Result<Vec<f64>, IoError> {
    Ok(var.get_values::<f64, _>((start, count))?)
}

fn has_attr(var: &netcdf::Variable<'_>, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

/// Numeric attribute as `f64`, if present and numeric.
pub(crate) fn f64_attr(var: &netcdf::Variable<'_>, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let value = var.attribute_value(name)?.ok()?;
    f64::try_from(value).ok()
}

/// String attribute, if present and textual.
pub(crate) fn string_attr(var: &netcdf::Variable<'_>, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

/// Packing and masking attributes of a data variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ValueEncoding {
    pub fill_value: Option<f64>,
    pub missing_value: Option<f64>,
    pub scale_factor: f64,
    pub add_offset: f64,
}

impl ValueEncoding {
    pub(crate) fn of(var: &netcdf::Variable<'_>) -> Self {
        Self {
            fill_value: f64_attr(var, "_FillValue"),
            missing_value: f64_attr(var, "missing_value"),
            scale_factor: f64_attr(var, "scale_factor").unwrap_or(1.0),
            add_offset: f64_attr(var, "add_offset").unwrap_or(0.0),
        }
    }

    /// Decode a raw value; masked or non-finite values become `None`.
    pub(crate) fn decode(&self, raw: f64) -> Option<f64> {
        if !raw.is_finite() || self.fill_value == Some(raw) || self.missing_value == Some(raw) {
            return None;
        }
        Some(raw * self.scale_factor + self.add_offset)
    }
}

/// Length of one CF time unit in seconds.
fn unit_seconds(unit: &str) -> Option<f64> {
    match unit.to_ascii_lowercase().as_str() {
        "day" | "days" | "d" => Some(86_400.0),
        "hour" | "hours" | "hr" | "hrs" | "h" => Some(3_600.0),
        "minute" | "minutes" | "min" | "mins" => Some(60.0),
        "second" | "seconds" | "sec" | "secs" | "s" => Some(1.0),
        _ => None,
    }
}

fn parse_base_datetime(text: &str) -> Result<NaiveDateTime, IoError> {
    let text = text.trim().trim_end_matches(" UTC").trim_end_matches('Z');
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Ok(dt);
        }
    }
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|e| IoError::InvalidTime {
        reason: format!("failed to parse base date '{text}': {e}"),
    })?;
    Ok(date.and_time(chrono::NaiveTime::MIN))
}

/// Parse CF time units of the form `"<unit> since <datetime>"`.
///
/// Returns the unit length in seconds and the epoch.
pub(crate) fn parse_time_units(units: &str) -> Result<(f64, NaiveDateTime), IoError> {
    let mut parts = units.trim().splitn(3, ' ');
    let unit = parts.next().unwrap_or_default();
    let since = parts.next().unwrap_or_default();
    let base = parts.next().unwrap_or_default();
    if since != "since" || base.is_empty() {
        return Err(IoError::InvalidTime {
            reason: format!("unexpected time units format: '{units}'"),
        });
    }
    let seconds = unit_seconds(unit).ok_or_else(|| IoError::InvalidTime {
        reason: format!("unsupported time unit '{unit}' in '{units}'"),
    })?;
    Ok((seconds, parse_base_datetime(base)?))
}

/// Parse the units of a duration axis (e.g. forecast step) into seconds per
/// unit. Accepts a bare unit (`"hours"`) or CF style (`"hours since ..."`).
pub(crate) fn parse_duration_units(units: &str) -> Result<f64, IoError> {
    let unit = units.split_whitespace().next().unwrap_or_default();
    unit_seconds(unit).ok_or_else(|| IoError::InvalidTime {
        reason: format!("unsupported duration unit '{units}'"),
    })
}

/// Read the `units` attribute of a coordinate variable.
pub(crate) fn read_units(file: &netcdf::File, name: &str, path: &Path) -> Result<String, IoError> {
    let var = variable(file, name, path)?;
    string_attr(&var, "units").ok_or_else(|| IoError::InvalidTime {
        reason: format!("variable '{name}' has no string 'units' attribute"),
    })
}

/// Convert offsets in `unit_seconds` from `epoch` into timestamps.
///
/// Offsets are rounded to the nearest second.
pub(crate) fn offsets_to_datetimes(
    epoch: NaiveDateTime,
    unit_seconds: f64,
    offsets: &[f64],
) -> Result<Vec<NaiveDateTime>, IoError> {
    offsets
        .iter()
        .map(|&offset| {
            if !offset.is_finite() {
                return Err(IoError::InvalidTime {
                    reason: format!("non-finite time offset {offset}"),
                });
            }
            let secs = (offset * unit_seconds).round() as i64;
            TimeDelta::try_seconds(secs)
                .and_then(|delta| epoch.checked_add_signed(delta))
                .ok_or_else(|| IoError::InvalidTime {
                    reason: format!("date overflow adding {secs} s to {epoch}"),
                })
        })
        .collect()
}
