use std::any::Any;
use std::fmt::{Debug, Display};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::audit::{SagaAuditLog, StepStatus};
use crate::error::SagaError;
use crate::logger::Logger;
use crate::step::Step;

/// Results of a successful run, keyed by step name in declaration order.
pub type SagaResults<V> = IndexMap<String, V>;

/// A configured saga, built with [`SagaBuilder`](crate::SagaBuilder).
///
/// Steps execute in declaration order. Each step receives the results of its
/// requirements as positional inputs. If a step fails, every step that
/// completed before it is rolled back in reverse order (LIFO), and the run
/// returns no results.
///
/// A saga can be executed any number of times; each run starts from empty
/// results. `exec` takes `&mut self`, so runs on one instance never overlap.
pub struct Saga<V, E> {
    name: String,
    logger: Arc<dyn Logger>,
    steps: Vec<Step<V, E>>,
    results: SagaResults<V>,
    last_success: Option<usize>,
}

impl<V, E> Saga<V, E> {
    pub(crate) fn from_parts(name: String, logger: Arc<dyn Logger>, steps: Vec<Step<V, E>>) -> Self {
        Self {
            name,
            logger,
            steps,
            results: IndexMap::new(),
            last_success: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Step names in execution order.
    #[must_use]
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(Step::name).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Index of the last step that completed in the most recent run.
    ///
    /// `None` before the first run, or when no step of the last run completed.
    #[must_use]
    pub fn last_success(&self) -> Option<usize> {
        self.last_success
    }
}

impl<V, E> Saga<V, E>
where
    V: Clone,
    E: Debug + Display,
{
    /// Execute the saga, returning every step's result on success.
    ///
    /// On failure, rolls back all previously completed steps in reverse order
    /// before returning. Rollback failures are logged and reported to the
    /// step's [`handle_rollback_error`](crate::StepHandler::handle_rollback_error)
    /// hook; they do not change the returned error.
    ///
    /// # Errors
    ///
    /// Returns `SagaError::StepFailed` if a step returns an error.
    /// Returns `SagaError::StepPanicked` if a step panics in its forward action.
    /// The panic is caught, but the process panic hook still runs first, so
    /// the default hook prints the panic to stderr outside of the saga's
    /// logger.
    ///
    /// # Panics
    ///
    /// Panics raised by `rollback` or `handle_rollback_error` are not caught.
    pub fn exec(&mut self) -> Result<SagaResults<V>, SagaError<E>> {
        let (result, _audit_log) = self.exec_internal();
        result
    }

    /// Execute the saga and return both the result and an audit log.
    ///
    /// The audit log tracks every step execution and rollback, including
    /// rollbacks that failed.
    pub fn exec_with_audit(&mut self) -> (Result<SagaResults<V>, SagaError<E>>, SagaAuditLog) {
        self.exec_internal()
    }

    fn exec_internal(&mut self) -> (Result<SagaResults<V>, SagaError<E>>, SagaAuditLog) {
        let mut audit_log = SagaAuditLog::new();
        self.last_success = None;
        self.results = IndexMap::with_capacity(self.steps.len());

        self.logger
            .info(&format!("begin to process saga {}", self.name));

        for index in 0..self.steps.len() {
            let inputs = self.build_step_input(index);
            if let Err(error) = self.process(index, inputs, &mut audit_log) {
                self.rollback(&mut audit_log);
                self.results.clear();
                self.logger.error(&error.to_string());
                return (Err(error), audit_log);
            }
        }

        self.logger
            .info(&format!("successfully processed saga {}", self.name));
        (Ok(self.results.clone()), audit_log)
    }

    /// Collect the results a step requires, in requirement order.
    ///
    /// The builder guarantees every requirement names an earlier step, and
    /// earlier steps have all completed by the time this runs. A missing
    /// result is a broken invariant and panics.
    fn build_step_input(&self, index: usize) -> Vec<V> {
        self.steps[index]
            .requirements
            .iter()
            .map(|requirement| self.results[requirement.as_str()].clone())
            .collect()
    }

    fn process(
        &mut self,
        index: usize,
        inputs: Vec<V>,
        audit_log: &mut SagaAuditLog,
    ) -> Result<(), SagaError<E>> {
        let step = &mut self.steps[index];
        self.logger
            .info(&format!("begin to process step {}", step.name));
        audit_log.record_start(&step.name);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| step.handler.execute(inputs)));

        match outcome {
            Ok(Ok(value)) => {
                self.results.insert(step.name.clone(), value);
                self.last_success = Some(index);
                audit_log.record_success(step.rollback_description());
                self.logger
                    .info(&format!("successfully processed step {}", step.name));
                Ok(())
            }
            Ok(Err(source)) => {
                self.logger.error(&format!(
                    "error during step {}, error: {source}",
                    step.name
                ));
                audit_log.record_failure(StepStatus::Failed);
                Err(SagaError::StepFailed {
                    saga: self.name.clone(),
                    step: step.name.clone(),
                    source,
                })
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                self.logger.error(&format!(
                    "step {} panicked, error: {message}",
                    step.name
                ));
                audit_log.record_failure(StepStatus::Panicked);
                Err(SagaError::StepPanicked {
                    saga: self.name.clone(),
                    step: step.name.clone(),
                    message,
                })
            }
        }
    }

    fn rollback(&mut self, audit_log: &mut SagaAuditLog) {
        self.logger
            .info(&format!("begin to rollback saga {}", self.name));

        let completed = self.last_success.map_or(0, |last| last + 1);
        let mut failures = 0_usize;

        for step in self.steps[..completed].iter_mut().rev() {
            self.logger
                .info(&format!("begin to rollback step {}", step.name));

            match step.handler.rollback() {
                Ok(()) => {
                    audit_log.record_rollback(&step.name, StepStatus::RolledBack);
                    self.logger
                        .info(&format!("successfully rolled back step {}", step.name));
                }
                Err(error) => {
                    failures += 1;
                    audit_log.record_rollback(&step.name, StepStatus::RollbackFailed);
                    self.logger.error(&format!(
                        "error during rolling back step {}, error: {error}",
                        step.name
                    ));
                    step.handler.handle_rollback_error();
                }
            }
        }

        if failures == 0 {
            self.logger
                .info(&format!("finished rolling back saga {}", self.name));
        } else {
            self.logger.error(&format!(
                "finished rolling back saga {}, {failures} compensation(s) failed",
                self.name
            ));
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
