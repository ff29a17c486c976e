/// Forward and compensating actions of one saga step.
///
/// Handlers are owned by the saga and called through `&mut self`, so a
/// handler can keep whatever its forward action produced and use it later in
/// [`rollback`](StepHandler::rollback). The saga never passes data to
/// `rollback`.
///
/// # Type Parameters
///
/// - `Value`: Data exchanged between steps (shared by all steps of a saga)
/// - `Error`: The error type for step and rollback failures
pub trait StepHandler: Send {
    /// Data received from required steps and produced for later ones.
    type Value;

    /// Error type for step failures.
    type Error;

    /// Perform the forward action.
    ///
    /// `inputs` holds the results of the step's requirements, in the order
    /// the requirements were declared. It is empty for a step without
    /// requirements.
    ///
    /// # Errors
    ///
    /// Returns an error if the step fails to complete. The saga then rolls
    /// back every step that completed before this one.
    fn execute(&mut self, inputs: Vec<Self::Value>) -> Result<Self::Value, Self::Error>;

    /// Undo the effects of a successful [`execute`](StepHandler::execute).
    ///
    /// The default implementation is a no-op, suitable for read-only steps.
    ///
    /// # Errors
    ///
    /// Returns an error if compensation fails.
    fn rollback(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Last-resort hook invoked once when [`rollback`](StepHandler::rollback)
    /// fails, e.g. to raise an alert. Rollback of earlier steps continues
    /// afterwards.
    fn handle_rollback_error(&mut self) {}

    /// Human-readable description of what rollback will do.
    fn rollback_description(&self) -> Option<String> {
        None
    }
}

/// A named unit of work in a saga.
pub struct Step<V, E> {
    pub(crate) name: String,
    pub(crate) requirements: Vec<String>,
    pub(crate) handler: Box<dyn StepHandler<Value = V, Error = E>>,
}

impl<V, E> Step<V, E> {
    /// Create a step without requirements.
    pub fn new<H>(name: impl Into<String>, handler: H) -> Self
    where
        H: StepHandler<Value = V, Error = E> + 'static,
    {
        Self {
            name: name.into(),
            requirements: Vec::new(),
            handler: Box::new(handler),
        }
    }

    /// Append a requirement. Its result becomes the next positional input.
    #[must_use]
    pub fn requires(mut self, step: impl Into<String>) -> Self {
        self.requirements.push(step.into());
        self
    }

    /// Append several requirements, keeping their order.
    #[must_use]
    pub fn with_requirements<I, S>(mut self, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requirements.extend(steps.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn requirements(&self) -> &[String] {
        &self.requirements
    }

    pub(crate) fn rollback_description(&self) -> String {
        self.handler
            .rollback_description()
            .unwrap_or_else(|| format!("undo {}", self.name))
    }
}

impl<V, E> std::fmt::Debug for Step<V, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("requirements", &self.requirements)
            .finish_non_exhaustive()
    }
}
