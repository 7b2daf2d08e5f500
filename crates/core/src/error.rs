use thiserror::Error;

/// Errors raised while building a [`LogRecord`](crate::LogRecord).
///
/// Both variants are authoring errors in the dynamics: they are raised
/// synchronously by a logging-mode activation and are not meant to be
/// recovered from.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LogError {
    #[error("field `{name}` is already logged at this level")]
    DuplicateField { name: String },

    #[error("flattened field `{name}` collides with an existing field")]
    FieldCollision { name: String },
}
