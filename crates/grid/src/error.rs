//! Grid error types.

/// Errors that can occur while building the reference grid or regridding.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// One or more validation checks failed.
    #[error("{count} validation error(s): {details}")]
    Validation { count: usize, details: String },

    /// A target axis is too short to derive a grid spacing.
    #[error("{axis} axis has {len} distinct value(s), need at least 2")]
    DegenerateAxis { axis: &'static str, len: usize },

    /// Records of the wrong granularity were passed in.
    #[error(transparent)]
    Io(#[from] hindcast_io::IoError),
}
