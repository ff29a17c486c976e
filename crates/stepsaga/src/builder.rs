use std::collections::HashMap;
use std::sync::Arc;

use crate::error::SagaConfigError;
use crate::logger::{Logger, TracingLogger};
use crate::saga::Saga;
use crate::step::Step;

/// Builder for a [`Saga`].
///
/// Steps are appended in execution order. [`build`](SagaBuilder::build)
/// checks that a logger is configured, that step names are unique, and that
/// every requirement names a step declared earlier.
///
/// ```
/// use stepsaga::{RecordingLogger, SagaBuilder, Step, StepHandler};
///
/// struct Constant(i32);
///
/// impl StepHandler for Constant {
///     type Value = i32;
///     type Error = std::io::Error;
///
///     fn execute(&mut self, inputs: Vec<i32>) -> Result<i32, Self::Error> {
///         Ok(self.0 + inputs.iter().sum::<i32>())
///     }
/// }
///
/// let mut saga = SagaBuilder::new("example")
///     .logger(RecordingLogger::new())
///     .step(Step::new("base", Constant(2)))
///     .step(Step::new("total", Constant(1)).requires("base"))
///     .build()?;
///
/// let results = saga.exec()?;
/// assert_eq!(results["total"], 3);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
///
/// A requirement on a later step is rejected:
///
/// ```
/// use stepsaga::{RecordingLogger, SagaBuilder, SagaConfigError, Step, StepHandler};
///
/// struct Noop;
///
/// impl StepHandler for Noop {
///     type Value = ();
///     type Error = std::io::Error;
///
///     fn execute(&mut self, _inputs: Vec<()>) -> Result<(), Self::Error> {
///         Ok(())
///     }
/// }
///
/// let result = SagaBuilder::new("example")
///     .logger(RecordingLogger::new())
///     .step(Step::new("ship", Noop).requires("pack"))
///     .step(Step::new("pack", Noop))
///     .build();
///
/// assert!(matches!(result, Err(SagaConfigError::ForwardRequirement { .. })));
/// ```
pub struct SagaBuilder<V, E> {
    name: String,
    logger: Option<Arc<dyn Logger>>,
    steps: Vec<Step<V, E>>,
}

impl<V, E> SagaBuilder<V, E> {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            logger: None,
            steps: Vec::new(),
        }
    }

    /// Use `logger` for every trace line of the saga.
    #[must_use]
    pub fn logger(mut self, logger: impl Logger + 'static) -> Self {
        self.logger = Some(Arc::new(logger));
        self
    }

    /// Share an existing logger with the saga.
    #[must_use]
    pub fn shared_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Log through `tracing`, naming the logger after the service and saga.
    #[must_use]
    pub fn tracing_logger(self, service: &str, environment: &str) -> Self {
        let logger = TracingLogger::new(service, environment, &self.name);
        self.logger(logger)
    }

    /// Append a step.
    #[must_use]
    pub fn step(mut self, step: Step<V, E>) -> Self {
        self.steps.push(step);
        self
    }

    /// Validate the configuration and build the saga.
    ///
    /// # Errors
    ///
    /// Returns a [`SagaConfigError`] if no logger is configured, a step name
    /// is repeated, or a requirement does not name an earlier step.
    pub fn build(self) -> Result<Saga<V, E>, SagaConfigError> {
        let Some(logger) = self.logger else {
            return Err(SagaConfigError::MissingLogger { saga: self.name });
        };
        validate_steps(&self.steps)?;
        Ok(Saga::from_parts(self.name, logger, self.steps))
    }
}

fn validate_steps<V, E>(steps: &[Step<V, E>]) -> Result<(), SagaConfigError> {
    let mut positions: HashMap<&str, usize> = HashMap::with_capacity(steps.len());
    for (index, step) in steps.iter().enumerate() {
        if positions.insert(step.name(), index).is_some() {
            return Err(SagaConfigError::DuplicateStep {
                step: step.name().to_string(),
            });
        }
    }

    for (index, step) in steps.iter().enumerate() {
        for requirement in step.requirements() {
            match positions.get(requirement.as_str()) {
                Some(&position) if position < index => {}
                Some(&position) if position == index => {
                    return Err(SagaConfigError::SelfRequirement {
                        step: step.name().to_string(),
                    });
                }
                Some(_) => {
                    return Err(SagaConfigError::ForwardRequirement {
                        step: step.name().to_string(),
                        requirement: requirement.clone(),
                    });
                }
                None => {
                    return Err(SagaConfigError::UnknownRequirement {
                        step: step.name().to_string(),
                        requirement: requirement.clone(),
                    });
                }
            }
        }
    }

    Ok(())
}
