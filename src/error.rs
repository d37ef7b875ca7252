use thiserror::Error;

/// Errors surfaced by the feature and regression pipeline.
///
/// Every variant is terminal for the calling request; nothing here is retried
/// internally.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("missing required columns: {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("input data is empty")]
    EmptyInput,

    #[error("model must be trained before this operation")]
    NotTrained,

    #[error("invalid configuration: {reason}")]
    Config { reason: String },

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl PipelineError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        PipelineError::InvalidInput { reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_lists_columns() {
        let err = PipelineError::Schema {
            missing: vec!["Low".to_string(), "Volume".to_string()],
        };
        assert_eq!(err.to_string(), "missing required columns: Low, Volume");
    }

    #[test]
    fn test_invalid_helper() {
        let err = PipelineError::invalid("row count mismatch");
        assert!(matches!(err, PipelineError::InvalidInput { .. }));
        assert_eq!(err.to_string(), "invalid input: row count mismatch");
    }
}
