use std::collections::HashMap;

use skein_core::{LogRecord, LogShape};

use crate::{Table, TableError};

/// Records collected during a run, in strictly ascending time order.
///
/// Each push checks that the time follows the previous entry and that every
/// field path keeps the shape it had when first seen. A rejected push leaves
/// the trace unchanged.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    time: Vec<f64>,
    log: Vec<LogRecord>,
    shapes: HashMap<String, LogShape>,
}

impl Trace {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a `(time, record)` entry.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::OutOfOrder`] if `time` does not come strictly
    /// after the last entry, or [`TableError::InconsistentShape`] if a field
    /// path changed shape.
    pub fn push(&mut self, time: f64, record: LogRecord) -> Result<(), TableError> {
        if let Some(&last) = self.time.last() {
            // Negated so that a NaN time is rejected too.
            if !(time > last) {
                return Err(TableError::OutOfOrder { time, last });
            }
        }

        let shapes = record.shapes();
        for (path, found) in &shapes {
            if let Some(&expected) = self.shapes.get(path) {
                if expected != *found {
                    return Err(TableError::InconsistentShape {
                        path: path.clone(),
                        expected,
                        found: *found,
                        time,
                    });
                }
            }
        }
        self.shapes.extend(shapes);

        self.time.push(time);
        self.log.push(record);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.time.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Returns the most recent entry.
    #[must_use]
    pub fn last(&self) -> Option<(f64, &LogRecord)> {
        Some((*self.time.last()?, self.log.last()?))
    }

    /// Finalizes the trace into a table.
    #[must_use]
    pub fn into_table(self) -> Table {
        Table::from_columns(self.time, self.log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use skein_core::LogValue;

    fn record(x: impl Into<LogValue>) -> LogRecord {
        LogRecord::new().with("x", x).unwrap()
    }

    #[test]
    fn pushes_in_order() {
        let mut trace = Trace::new();
        trace.push(0.0, record(1.0)).unwrap();
        trace.push(0.5, record(2.0)).unwrap();

        assert_eq!(trace.len(), 2);
        assert_eq!(trace.last(), Some((0.5, &record(2.0))));

        let table = trace.into_table();
        assert_eq!(table.time(), &[0.0, 0.5]);
        assert_eq!(table.scalars("x").unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn rejects_repeated_or_earlier_times() {
        let mut trace = Trace::new();
        trace.push(1.0, record(1.0)).unwrap();

        assert_eq!(
            trace.push(1.0, record(2.0)),
            Err(TableError::OutOfOrder {
                time: 1.0,
                last: 1.0
            })
        );
        assert!(matches!(
            trace.push(0.5, record(2.0)),
            Err(TableError::OutOfOrder { .. })
        ));
        assert!(matches!(
            trace.push(f64::NAN, record(2.0)),
            Err(TableError::OutOfOrder { .. })
        ));
        assert_eq!(trace.len(), 1);
    }

    #[test]
    fn rejects_shape_changes() {
        let mut trace = Trace::new();
        trace.push(0.0, record(vec![1.0, 2.0])).unwrap();

        assert_eq!(
            trace.push(1.0, record(vec![1.0, 2.0, 3.0])),
            Err(TableError::InconsistentShape {
                path: "x".to_owned(),
                expected: LogShape::Vector(2),
                found: LogShape::Vector(3),
                time: 1.0,
            })
        );
        assert!(matches!(
            trace.push(1.0, record("text")),
            Err(TableError::InconsistentShape { .. })
        ));
        assert_eq!(trace.len(), 1);
    }

    #[test]
    fn checks_nested_paths() {
        let nested = |value: f64| {
            LogRecord::new()
                .with("engine", record(value))
                .unwrap()
        };
        let mut trace = Trace::new();
        trace.push(0.0, nested(1.0)).unwrap();
        trace.push(0.5, nested(2.0)).unwrap();

        let error = trace
            .push(1.0, LogRecord::new().with("engine", record(true)).unwrap())
            .unwrap_err();

        assert_eq!(
            error,
            TableError::InconsistentShape {
                path: "engine.x".to_owned(),
                expected: LogShape::Scalar,
                found: LogShape::Bool,
                time: 1.0,
            }
        );
    }

    #[test]
    fn new_fields_may_appear() {
        let mut trace = Trace::new();
        trace.push(0.0, record(1.0)).unwrap();

        let wider = record(2.0).with("y", 3.0).unwrap();
        trace.push(1.0, wider).unwrap();

        assert_eq!(trace.len(), 2);
    }
}
