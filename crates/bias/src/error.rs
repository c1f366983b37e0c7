//! Bias correction error types.

/// Errors that can occur during bias correction.
#[derive(Debug, thiserror::Error)]
pub enum BiasError {
    /// No forecast rows were supplied.
    #[error("no forecast rows to correct")]
    EmptyData,

    /// Records of the wrong granularity were passed in.
    #[error(transparent)]
    Io(#[from] hindcast_io::IoError),
}
