use std::fmt::Debug;

use thiserror::Error;

/// Error returned by [`Saga::exec`](crate::Saga::exec).
///
/// Exactly one error is produced per failed run: the forward step that
/// stopped the saga. Rollback failures are not part of it.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SagaError<E: Debug> {
    /// A step returned an error from its forward action.
    #[error("error during saga {saga} execution, step '{step}' failed")]
    StepFailed {
        /// Name of the saga.
        saga: String,
        /// Name of the step that failed.
        step: String,
        /// The error returned by the step.
        #[source]
        source: E,
    },

    /// A step panicked inside its forward action.
    #[error("error during saga {saga} execution, step '{step}' panicked: {message}")]
    StepPanicked {
        /// Name of the saga.
        saga: String,
        /// Name of the step that panicked.
        step: String,
        /// Panic payload, when it was a string.
        message: String,
    },
}

impl<E: Debug> SagaError<E> {
    /// Name of the saga that failed.
    #[must_use]
    pub fn saga(&self) -> &str {
        match self {
            Self::StepFailed { saga, .. } | Self::StepPanicked { saga, .. } => saga,
        }
    }

    /// Name of the step that stopped the saga.
    #[must_use]
    pub fn step(&self) -> &str {
        match self {
            Self::StepFailed { step, .. } | Self::StepPanicked { step, .. } => step,
        }
    }
}

/// Error from building a saga with an invalid configuration.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SagaConfigError {
    /// No logger was configured.
    #[error("saga '{saga}' has no logger configured")]
    MissingLogger { saga: String },

    /// Two steps share a name.
    #[error("step '{step}' is declared more than once")]
    DuplicateStep { step: String },

    /// A step lists itself as a requirement.
    #[error("step '{step}' requires itself")]
    SelfRequirement { step: String },

    /// A requirement names a step declared later.
    #[error("step '{step}' requires '{requirement}', which is declared after it")]
    ForwardRequirement { step: String, requirement: String },

    /// A requirement names no step of the saga.
    #[error("step '{step}' requires unknown step '{requirement}'")]
    UnknownRequirement { step: String, requirement: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("boom")]
    struct Boom;

    #[test]
    fn step_failed_names_saga_and_step() {
        let err: SagaError<Boom> = SagaError::StepFailed {
            saga: "checkout".to_string(),
            step: "charge_card".to_string(),
            source: Boom,
        };

        assert_eq!(
            err.to_string(),
            "error during saga checkout execution, step 'charge_card' failed"
        );
        assert_eq!(err.saga(), "checkout");
        assert_eq!(err.step(), "charge_card");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn step_panicked_includes_message() {
        let err: SagaError<Boom> = SagaError::StepPanicked {
            saga: "checkout".to_string(),
            step: "reserve".to_string(),
            message: "index out of bounds".to_string(),
        };

        assert!(err.to_string().contains("panicked: index out of bounds"));
        assert_eq!(err.step(), "reserve");
    }

    #[test]
    fn config_errors_describe_offending_step() {
        let err = SagaConfigError::ForwardRequirement {
            step: "ship".to_string(),
            requirement: "pack".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "step 'ship' requires 'pack', which is declared after it"
        );
    }
}
