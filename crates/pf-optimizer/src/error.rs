use thiserror::Error;

/// Boxed error returned by caller-supplied objectives.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for optimizer operations.
pub type PfResult<T> = Result<T, PfError>;

/// Main error type for the optimizer
#[derive(Error, Debug)]
pub enum PfError {
    #[error("Invalid range for parameter '{name}': {reason}")]
    InvalidRange { name: String, reason: String },

    #[error("Duplicate parameter name: {name}")]
    DuplicateParameter { name: String },

    #[error("Parameter space has no dimensions")]
    EmptySpace,

    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    #[error("Unknown search strategy: {0}")]
    UnknownStrategy(String),

    #[error("Objective failed at evaluation {evaluation}: {source}")]
    Objective {
        evaluation: usize,
        #[source]
        source: BoxError,
    },

    #[error("Evaluation budget exhausted")]
    BudgetExhausted,
}

impl PfError {
    pub fn invalid_range(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRange {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// The error returned by the objective, if this run was aborted by one.
    pub fn objective_source(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::Objective { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
