//! Saga orchestration for multi-step operations without a global transaction.
//!
//! A saga runs its steps in declaration order. Each step receives the results
//! of the steps it names as requirements, in the order it names them. When a
//! step fails, every step that already succeeded is rolled back in reverse
//! order. Rollback is best-effort: a failing compensation is reported to its
//! step and logged, and the remaining compensations still run.

mod audit;
mod builder;
mod error;
mod logger;
mod saga;
mod step;

pub use audit::{SagaAuditLog, StepRecord, StepStatus};
pub use builder::SagaBuilder;
pub use error::{SagaConfigError, SagaError};
pub use logger::{LogLevel, Logger, RecordingLogger, TracingLogger};
pub use saga::{Saga, SagaResults};
pub use step::{Step, StepHandler};
