use crate::{Args, Dynamics, LogError, LogRecord, LogScope, LoggableFunction};

/// How a child subsystem's record is merged into its parent's record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergePolicy {
    /// Store the child's record as a sub-record under the invocation key.
    #[default]
    Nested,

    /// Move the child's fields into the parent's current level.
    ///
    /// The invocation key is not used.
    Only,
}

impl LogScope {
    /// Evaluates a child subsystem and merges its record into this scope.
    ///
    /// On an enabled scope the child runs in logging mode with a scope of its
    /// own, and its finished record is merged according to `policy`. On a
    /// disabled scope the child runs in plain mode and nothing is merged, so
    /// nesting adds no logging cost to the hot path.
    ///
    /// To keep a loggable child out of the parent's record altogether, call
    /// [`LoggableFunction::evaluate`] on it directly instead.
    ///
    /// # Errors
    ///
    /// - Any [`LogError`] raised inside the child.
    /// - [`LogError::DuplicateField`] if `policy` is [`MergePolicy::Nested`]
    ///   and `key` is already logged here.
    /// - [`LogError::FieldCollision`] if `policy` is [`MergePolicy::Only`] and
    ///   one of the child's fields is already logged here.
    pub fn invoke<D: Dynamics + ?Sized>(
        &mut self,
        key: &str,
        policy: MergePolicy,
        child: &D,
        dx: &mut [f64],
        args: Args<'_, D::Params>,
    ) -> Result<(), LogError> {
        if !self.is_enabled() {
            return child.evaluate(dx, args);
        }
        let record = child.evaluate_with_log(dx, args)?;
        self.merge(key, policy, record)
    }

    /// Merges an already computed child record into this scope.
    ///
    /// Does nothing on a disabled scope.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::DuplicateField`] for a nested merge under an
    /// existing key, or [`LogError::FieldCollision`] for a flattened merge
    /// that would overwrite a field. A failed merge leaves the scope unchanged.
    pub fn merge(
        &mut self,
        key: &str,
        policy: MergePolicy,
        record: LogRecord,
    ) -> Result<(), LogError> {
        let Some(parent) = self.record_mut() else {
            return Ok(());
        };
        match policy {
            MergePolicy::Nested => parent.insert(key, record),
            MergePolicy::Only => parent.absorb(record),
        }
    }
}
