//! Error types for hindcast-io.

use std::path::PathBuf;

use crate::records::Granularity;

/// Error type for all fallible operations in the hindcast-io crate.
///
/// This enum covers I/O failures, format-specific errors from NetCDF, Parquet
/// and GeoJSON, time decoding issues, and schema mismatches encountered when
/// reading or writing pipeline tables.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when a required file does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path that could not be found.
        path: PathBuf,
    },

    /// Wraps an error originating from the NetCDF library.
    #[error("netcdf error: {reason}")]
    Netcdf {
        /// Description of the underlying NetCDF failure.
        reason: String,
    },

    /// Wraps an error originating from the Parquet or Arrow libraries.
    #[error("parquet error: {reason}")]
    Parquet {
        /// Description of the underlying Parquet failure.
        reason: String,
    },

    /// Returned when an administrative boundary file cannot be interpreted.
    #[error("boundary file {}: {reason}", path.display())]
    Boundary {
        /// Path to the boundary file.
        path: PathBuf,
        /// Description of the problem.
        reason: String,
    },

    /// Returned when one or more validation checks fail.
    #[error("{count} validation error(s): {details}")]
    Validation {
        /// Number of accumulated validation failures.
        count: usize,
        /// Human-readable summary of the failures.
        details: String,
    },

    /// Returned when a required variable is not present in a file.
    #[error("variable '{name}' not found in {}", path.display())]
    MissingVariable {
        /// Name of the missing variable.
        name: String,
        /// Path to the file that was inspected.
        path: PathBuf,
    },

    /// Returned when a required column is absent from a table.
    #[error("column '{column}' not found in {}", path.display())]
    MissingColumn {
        /// Name of the missing column.
        column: String,
        /// Path to the table that was inspected.
        path: PathBuf,
    },

    /// Returned when a dimension has an unexpected size.
    #[error("dimension '{name}' mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Name of the dimension.
        name: String,
        /// Expected size.
        expected: usize,
        /// Actual size.
        got: usize,
    },

    /// Returned when a data variable has a dimension the loader cannot map.
    #[error("variable '{variable}' has unsupported dimension '{dimension}' (length {len})")]
    UnsupportedDimension {
        /// Data variable being read.
        variable: String,
        /// Name of the unmapped dimension.
        dimension: String,
        /// Length of the unmapped dimension.
        len: usize,
    },

    /// Returned when a requested ensemble member is not in the file.
    #[error("ensemble member {number} not found in {}", path.display())]
    MissingMember {
        /// Requested member number.
        number: u32,
        /// Path to the file that was inspected.
        path: PathBuf,
    },

    /// Returned when a time value cannot be parsed or is out of range.
    #[error("invalid time: {reason}")]
    InvalidTime {
        /// Description of the time parsing issue.
        reason: String,
    },

    /// Returned when a table mixes or mislabels location granularities.
    #[error("expected {expected} locations, found {found}")]
    GranularityMismatch {
        /// Granularity the caller asked for.
        expected: Granularity,
        /// Granularity actually found.
        found: Granularity,
    },
}

impl From<netcdf::Error> for IoError {
    fn from(e: netcdf::Error) -> Self {
        IoError::Netcdf {
            reason: e.to_string(),
        }
    }
}

impl From<parquet::errors::ParquetError> for IoError {
    fn from(e: parquet::errors::ParquetError) -> Self {
        IoError::Parquet {
            reason: e.to_string(),
        }
    }
}

impl From<arrow::error::ArrowError> for IoError {
    fn from(e: arrow::error::ArrowError) -> Self {
        IoError::Parquet {
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_file_not_found() {
        let err = IoError::FileNotFound {
            path: PathBuf::from("/tmp/missing.nc"),
        };
        assert_eq!(err.to_string(), "file not found: /tmp/missing.nc");
    }

    #[test]
    fn display_missing_column() {
        let err = IoError::MissingColumn {
            column: "climatology_q50".to_string(),
            path: PathBuf::from("/data/era5_pixel.parquet"),
        };
        assert_eq!(
            err.to_string(),
            "column 'climatology_q50' not found in /data/era5_pixel.parquet"
        );
    }

    #[test]
    fn display_unsupported_dimension() {
        let err = IoError::UnsupportedDimension {
            variable: "tprate".to_string(),
            dimension: "surface".to_string(),
            len: 3,
        };
        assert_eq!(
            err.to_string(),
            "variable 'tprate' has unsupported dimension 'surface' (length 3)"
        );
    }

    #[test]
    fn display_granularity_mismatch() {
        let err = IoError::GranularityMismatch {
            expected: Granularity::Admin,
            found: Granularity::Pixel,
        };
        assert_eq!(err.to_string(), "expected admin locations, found pixel");
    }

    #[test]
    fn display_missing_member() {
        let err = IoError::MissingMember {
            number: 50,
            path: PathBuf::from("seas5.nc"),
        };
        assert_eq!(err.to_string(), "ensemble member 50 not found in seas5.nc");
    }

    #[test]
    fn from_netcdf_error() {
        let nc_err = netcdf::Error::Str("test nc error".to_string());
        let err: IoError = nc_err.into();
        assert!(matches!(err, IoError::Netcdf { .. }));
        assert!(err.to_string().contains("test nc error"));
    }

    #[test]
    fn from_parquet_error() {
        let pq_err = parquet::errors::ParquetError::General("test pq error".to_string());
        let err: IoError = pq_err.into();
        assert!(matches!(err, IoError::Parquet { .. }));
        assert!(err.to_string().contains("test pq error"));
    }

    #[test]
    fn error_is_send_sync_and_std_error() {
        fn assert_bounds<T: Send + Sync + std::error::Error>() {}
        assert_bounds::<IoError>();
    }
}
