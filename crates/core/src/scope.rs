use crate::{LogError, LogRecord, LogValue};

/// The accumulation context for one evaluation of a [`Dynamics`](crate::Dynamics).
///
/// A scope is either *enabled*, collecting appended fields into a fresh
/// [`LogRecord`], or *disabled*, in which case every append is a no-op that
/// never converts its value. The integrator's hot path runs with a disabled
/// scope; the driver's save-time captures run with an enabled one.
///
/// Every logging-mode activation owns its own scope value. Nested subsystems
/// get a new scope of their own through [`LogScope::invoke`], and their record
/// is merged into the parent only once the child has finished, so a child can
/// never observe or corrupt its parent's record in progress.
#[derive(Debug)]
pub struct LogScope {
    record: Option<LogRecord>,
}

impl LogScope {
    /// Creates a scope that collects appended fields.
    #[must_use]
    pub fn enabled() -> Self {
        Self {
            record: Some(LogRecord::new()),
        }
    }

    /// Creates a scope that ignores appended fields.
    #[must_use]
    pub fn disabled() -> Self {
        Self { record: None }
    }

    /// Returns `true` if appended fields are being collected.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.record.is_some()
    }

    /// Appends `{name: value}` at this scope's level.
    ///
    /// On a disabled scope the value is dropped without being converted, so
    /// passing borrowed data such as `&x[..]` costs nothing on the hot path.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::DuplicateField`] if `name` was already appended.
    pub fn append<V: Into<LogValue>>(&mut self, name: &str, value: V) -> Result<(), LogError> {
        match self.record.as_mut() {
            Some(record) => record.insert(name, value),
            None => Ok(()),
        }
    }

    /// Appends a lazily computed value.
    ///
    /// The closure only runs on an enabled scope, which keeps derived
    /// quantities that exist purely for logging off the hot path.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::DuplicateField`] if `name` was already appended.
    pub fn append_with<V, F>(&mut self, name: &str, value: F) -> Result<(), LogError>
    where
        V: Into<LogValue>,
        F: FnOnce() -> V,
    {
        match self.record.as_mut() {
            Some(record) => record.insert(name, value()),
            None => Ok(()),
        }
    }

    /// Returns the record collected so far, or `None` if the scope is disabled.
    #[must_use]
    pub fn record(&self) -> Option<&LogRecord> {
        self.record.as_ref()
    }

    /// Consumes the scope and returns its record.
    ///
    /// A disabled scope yields an empty record.
    #[must_use]
    pub fn into_record(self) -> LogRecord {
        self.record.unwrap_or_default()
    }

    pub(crate) fn record_mut(&mut self) -> Option<&mut LogRecord> {
        self.record.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn enabled_scope_collects_fields() {
        let mut scope = LogScope::enabled();
        scope.append("x", 1.5).unwrap();
        scope.append("state", &[1.0, 2.0][..]).unwrap();

        let record = scope.into_record();

        assert_eq!(record.get("x"), Some(&LogValue::Scalar(1.5)));
        assert_eq!(record.get("state"), Some(&LogValue::Vector(vec![1.0, 2.0])));
    }

    #[test]
    fn disabled_scope_ignores_fields() {
        let mut scope = LogScope::disabled();
        scope.append("x", 1.5).unwrap();
        scope.append("x", 2.5).unwrap();

        assert!(!scope.is_enabled());
        assert!(scope.record().is_none());
        assert!(scope.into_record().is_empty());
    }

    #[test]
    fn duplicate_append_fails() {
        let mut scope = LogScope::enabled();
        scope.append("x", 1.0).unwrap();

        let error = scope.append("x", 2.0).unwrap_err();

        assert_eq!(
            error,
            LogError::DuplicateField {
                name: "x".to_owned()
            }
        );
    }

    #[test]
    fn append_with_is_lazy() {
        let calls = Cell::new(0);
        let value = || {
            calls.set(calls.get() + 1);
            42.0
        };

        LogScope::disabled().append_with("power", value).unwrap();
        assert_eq!(calls.get(), 0);

        let mut scope = LogScope::enabled();
        scope.append_with("power", value).unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(
            scope.record().and_then(|r| r.get("power")),
            Some(&LogValue::Scalar(42.0))
        );
    }
}
