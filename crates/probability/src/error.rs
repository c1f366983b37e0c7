//! Probability error types.

/// Errors that can occur while computing ensemble probabilities.
#[derive(Debug, thiserror::Error)]
pub enum ProbabilityError {
    /// Records of the wrong granularity were passed in.
    #[error(transparent)]
    Io(#[from] hindcast_io::IoError),
}
