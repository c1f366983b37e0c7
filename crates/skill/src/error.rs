//! Skill evaluation error types.

/// Errors that can occur during skill evaluation.
#[derive(Debug, thiserror::Error)]
pub enum SkillError {
    /// One or more validation checks failed.
    #[error("{count} validation error(s): {details}")]
    Validation { count: usize, details: String },

    /// JSON serialization failed.
    #[error("serialization error: {reason}")]
    Serialization { reason: String },

    /// Records of the wrong granularity were passed in.
    #[error(transparent)]
    Io(#[from] hindcast_io::IoError),
}
