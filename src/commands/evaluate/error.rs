use thiserror::Error;

/// Errors raised by protected-group selection and metric computation. Both
/// variants abort the per-query computation; the pipeline never
/// catches-and-skips, since a fairness score for a misconfigured protected
/// group is meaningless.
#[derive(Debug, Error)]
pub enum FairnessError {
    #[error("configuration error: {reason}")]
    Configuration { reason: String },

    #[error("validation error: {reason}")]
    Validation { reason: String },
}

impl FairnessError {
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }
}
