use skein_core::{LogRecord, LogShape, LogValue};
use thiserror::Error;

/// The finalized output of a simulation: one row per save, ascending in time.
///
/// The `time` column holds the save times and the `log` column holds the
/// record captured at each one.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Table {
    time: Vec<f64>,
    log: Vec<LogRecord>,
}

/// Errors raised while building or reading a [`Table`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TableError {
    #[error("field `{path}` changed shape from {expected} to {found} at t = {time}")]
    InconsistentShape {
        path: String,
        expected: LogShape,
        found: LogShape,
        time: f64,
    },

    #[error("entry at t = {time} does not follow t = {last}")]
    OutOfOrder { time: f64, last: f64 },

    #[error("row {row} has no field `{path}`")]
    MissingField { path: String, row: usize },

    #[error("field `{path}` in row {row} is not a scalar")]
    NotScalar { path: String, row: usize },
}

impl Table {
    pub(crate) fn from_columns(time: Vec<f64>, log: Vec<LogRecord>) -> Self {
        Self { time, log }
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.time.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Returns the time column.
    #[must_use]
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Returns the log column.
    #[must_use]
    pub fn log(&self) -> &[LogRecord] {
        &self.log
    }

    /// Returns the row at `index`.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<(f64, &LogRecord)> {
        Some((*self.time.get(index)?, self.log.get(index)?))
    }

    /// Iterates over `(time, record)` rows in ascending time order.
    pub fn rows(&self) -> impl Iterator<Item = (f64, &LogRecord)> {
        self.time.iter().copied().zip(&self.log)
    }

    /// Returns the value at a dotted field path in every row.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::MissingField`] for the first row without the field.
    pub fn column(&self, path: &str) -> Result<Vec<&LogValue>, TableError> {
        self.log
            .iter()
            .enumerate()
            .map(|(row, record)| {
                record
                    .get_path(path)
                    .ok_or_else(|| TableError::MissingField {
                        path: path.to_owned(),
                        row,
                    })
            })
            .collect()
    }

    /// Returns a scalar field as a plain column of numbers.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::MissingField`] if a row lacks the field, or
    /// [`TableError::NotScalar`] if a row holds something other than a scalar.
    pub fn scalars(&self, path: &str) -> Result<Vec<f64>, TableError> {
        self.column(path)?
            .into_iter()
            .enumerate()
            .map(|(row, value)| {
                value.as_scalar().ok_or_else(|| TableError::NotScalar {
                    path: path.to_owned(),
                    row,
                })
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = (f64, &'a LogRecord);
    type IntoIter = std::iter::Zip<
        std::iter::Copied<std::slice::Iter<'a, f64>>,
        std::slice::Iter<'a, LogRecord>,
    >;

    fn into_iter(self) -> Self::IntoIter {
        self.time.iter().copied().zip(self.log.iter())
    }
}
