// Error types for series materialization

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("invalid column reference '{reference}': {reason}")]
    InvalidColumnReference { reference: String, reason: String },

    #[error("invalid role spec: {0}")]
    InvalidRoleSpec(String),

    #[error("latitude and longitude must be specified together")]
    IncompleteGeoSpec,

    #[error("missing timestamp: {0}")]
    MissingTimestamp(String),

    #[error("source unavailable: {0}")]
    SourceUnavailable(String),
}

impl LoadError {
    /// Row access past the end of a row, for a role that may not degrade.
    pub(crate) fn out_of_range(position: usize, width: usize) -> Self {
        LoadError::InvalidColumnReference {
            reference: position.to_string(),
            reason: format!("position out of range for row of width {width}"),
        }
    }
}
