//! Climatology error types.

/// Errors that can occur while computing climatologies.
#[derive(Debug, thiserror::Error)]
pub enum ClimatologyError {
    /// One or more validation checks failed.
    #[error("{count} validation error(s): {details}")]
    Validation { count: usize, details: String },

    /// A reference period ends before it starts.
    #[error("reference period {start}..={end} is empty")]
    EmptyPeriod { start: i32, end: i32 },

    /// Records of the wrong granularity were passed in.
    #[error(transparent)]
    Io(#[from] hindcast_io::IoError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_period_display() {
        let err = ClimatologyError::EmptyPeriod {
            start: 2016,
            end: 1993,
        };
        assert_eq!(err.to_string(), "reference period 2016..=1993 is empty");
    }

    #[test]
    fn test_validation_display() {
        let err = ClimatologyError::Validation {
            count: 1,
            details: "3 thresholds for 4 quantiles".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("1 validation error(s)"));
        assert!(msg.contains("3 thresholds"));
    }
}
