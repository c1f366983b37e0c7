//! Loader output to pixel-located forecast and reanalysis records.

use chrono::{Datelike, NaiveDateTime, TimeDelta};
use tracing::{debug, warn};

use crate::error::IoError;
use crate::records::{ForecastRecord, GridPoint, GridRecord, Location, ReanalysisRecord};

/// Seconds per day.
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Millimetres per metre.
const MM_PER_M: f64 = 1_000.0;

/// Forecast precipitation rate (m/s) to mm/day.
pub fn forecast_rate_to_mm_day(rate_m_per_s: f64) -> f64 {
    rate_m_per_s * MM_PER_M * SECONDS_PER_DAY
}

/// Reanalysis daily total (m/day) to mm/day.
pub fn reanalysis_depth_to_mm_day(depth_m_per_day: f64) -> f64 {
    depth_m_per_day * MM_PER_M
}

/// Lead time in months: forecast step in days divided by 30, rounded half to
/// even.
pub fn lead_time_months(step_days: f64) -> Option<u8> {
    let months = (step_days / 30.0).round_ties_even();
    if months.is_finite() && (0.0..=f64::from(u8::MAX)).contains(&months) {
        Some(months as u8)
    } else {
        None
    }
}

/// Forecast monthly means are stamped at the end of the month they cover,
/// so the covered month is the one before the valid date's month.
///
/// Returns `(year, month)`; January maps to December of the previous year.
pub fn shift_valid_month(valid: NaiveDateTime) -> (i32, u8) {
    match valid.month() {
        1 => (valid.year() - 1, 12),
        m => (valid.year(), (m - 1) as u8),
    }
}

/// Convert forecast loader output into pixel-located [`ForecastRecord`]s.
///
/// The valid date is `time + step`; lead time and month follow
/// [`lead_time_months`] and [`shift_valid_month`]. Rows without an
/// ensemble member or a step, or with an unrepresentable lead time, are
/// rejected.
///
/// # Errors
///
/// Returns [`IoError::Validation`] if any row lacks a member or step, and
/// [`IoError::InvalidTime`] if a valid date overflows.
pub fn forecast_records(grid: &[GridRecord]) -> Result<Vec<ForecastRecord>, IoError> {
    let mut out = Vec::with_capacity(grid.len());
    for rec in grid {
        let (Some(number), Some(step_days)) = (rec.number, rec.step_days) else {
            return Err(IoError::Validation {
                count: 1,
                details: format!(
                    "forecast value at ({}, {}) {} has no ensemble member or step",
                    rec.latitude, rec.longitude, rec.time
                ),
            });
        };
        let lead_time = lead_time_months(step_days).ok_or_else(|| IoError::Validation {
            count: 1,
            details: format!("step of {step_days} days is not a valid lead time"),
        })?;
        let valid = TimeDelta::try_seconds((step_days * SECONDS_PER_DAY).round() as i64)
            .and_then(|step| rec.time.checked_add_signed(step))
            .ok_or_else(|| IoError::InvalidTime {
                reason: format!("valid date overflow: {} + {step_days} days", rec.time),
            })?;
        let (year, month) = shift_valid_month(valid);
        out.push(ForecastRecord {
            location: Location::Pixel(GridPoint::new(rec.latitude, rec.longitude)),
            number,
            year,
            month,
            lead_time,
            tp_mm_day: forecast_rate_to_mm_day(rec.value),
        });
    }
    debug!(records = out.len(), "converted forecast values");
    Ok(out)
}

/// Convert reanalysis loader output into pixel-located
/// [`ReanalysisRecord`]s. The valid month is the calendar month of the
/// timestamp (no shift).
///
/// A reanalysis file with several members or steps at the same point and
/// month yields duplicate rows here; grid aggregation averages them.
pub fn reanalysis_records(grid: &[GridRecord]) -> Vec<ReanalysisRecord> {
    let with_member = grid.iter().filter(|r| r.number.is_some()).count();
    if with_member > 0 {
        warn!(
            rows = with_member,
            "reanalysis values carry an ensemble member; members will be averaged"
        );
    }
    grid.iter()
        .map(|rec| ReanalysisRecord {
            location: Location::Pixel(GridPoint::new(rec.latitude, rec.longitude)),
            year: rec.time.year(),
            month: rec.time.month() as u8,
            tp_mm_day: reanalysis_depth_to_mm_day(rec.value),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    use super::*;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .expect("valid date")
    }

    #[test]
    fn unit_conversions() {
        assert_relative_eq!(forecast_rate_to_mm_day(1.0e-8), 0.864, epsilon = 1e-12);
        assert_relative_eq!(reanalysis_depth_to_mm_day(0.0025), 2.5, epsilon = 1e-12);
    }

    #[test]
    fn lead_time_rounding() {
        assert_eq!(lead_time_months(31.0), Some(1));
        assert_eq!(lead_time_months(59.0), Some(2));
        assert_eq!(lead_time_months(184.0), Some(6));
        // Ties round to even, as Python's round does.
        assert_eq!(lead_time_months(45.0), Some(2));
        assert_eq!(lead_time_months(75.0), Some(2));
        assert_eq!(lead_time_months(-60.0), None);
        assert_eq!(lead_time_months(f64::NAN), None);
    }

    #[test]
    fn valid_month_shift() {
        assert_eq!(shift_valid_month(at(2000, 4, 1)), (2000, 3));
        assert_eq!(shift_valid_month(at(2001, 1, 1)), (2000, 12));
    }

    #[test]
    fn forecast_records_apply_all_conventions() {
        let grid = vec![GridRecord {
            latitude: 12.0,
            longitude: 15.0,
            number: Some(3),
            time: at(2000, 2, 1),
            step_days: Some(29.0),
            value: 1.0e-8,
        }];
        let recs = forecast_records(&grid).unwrap();
        assert_eq!(recs.len(), 1);
        let r = &recs[0];
        assert_eq!(r.number, 3);
        assert_eq!(r.lead_time, 1);
        // 2000-02-01 + 29 days = 2000-03-01, covering February.
        assert_eq!((r.year, r.month), (2000, 2));
        assert_relative_eq!(r.tp_mm_day, 0.864, epsilon = 1e-12);
        assert_eq!(r.location, Location::Pixel(GridPoint::new(12.0, 15.0)));
    }

    #[test]
    fn forecast_records_require_member_and_step() {
        let grid = vec![GridRecord {
            latitude: 0.0,
            longitude: 0.0,
            number: None,
            time: at(2000, 1, 1),
            step_days: Some(31.0),
            value: 0.0,
        }];
        assert!(matches!(
            forecast_records(&grid),
            Err(IoError::Validation { .. })
        ));
    }

    #[test]
    fn reanalysis_records_keep_calendar_month() {
        let grid = vec![GridRecord {
            latitude: 1.0,
            longitude: 2.0,
            number: None,
            time: at(1999, 1, 1),
            step_days: None,
            value: 0.002,
        }];
        let recs = reanalysis_records(&grid);
        assert_eq!((recs[0].year, recs[0].month), (1999, 1));
        assert_relative_eq!(recs[0].tp_mm_day, 2.0, epsilon = 1e-12);
    }
}
