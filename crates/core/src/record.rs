use std::fmt;

use crate::LogError;

/// A value captured in a [`LogRecord`].
///
/// Leaves are simple values (scalars, integers, flags, text, and vectors).
/// A [`LogValue::Record`] holds a nested record, which is how subsystem logs
/// are preserved as a hierarchy.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(untagged))]
pub enum LogValue {
    Scalar(f64),
    Integer(i64),
    Bool(bool),
    Text(String),
    Vector(Vec<f64>),
    Record(LogRecord),
}

/// The shape of a [`LogValue`].
///
/// Within one trace, a given field path is expected to keep the same shape at
/// every save time. Vectors include their length in the shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogShape {
    Scalar,
    Integer,
    Bool,
    Text,
    Vector(usize),
    Record,
}

impl LogValue {
    /// Returns the shape of this value.
    #[must_use]
    pub fn shape(&self) -> LogShape {
        match self {
            Self::Scalar(_) => LogShape::Scalar,
            Self::Integer(_) => LogShape::Integer,
            Self::Bool(_) => LogShape::Bool,
            Self::Text(_) => LogShape::Text,
            Self::Vector(values) => LogShape::Vector(values.len()),
            Self::Record(_) => LogShape::Record,
        }
    }

    /// Returns the value as an `f64` if it is a scalar.
    #[must_use]
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the value as a slice if it is a vector.
    #[must_use]
    pub fn as_vector(&self) -> Option<&[f64]> {
        match self {
            Self::Vector(values) => Some(values),
            _ => None,
        }
    }

    /// Returns the nested record if this value is one.
    #[must_use]
    pub fn as_record(&self) -> Option<&LogRecord> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }
}

impl From<f64> for LogValue {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<f32> for LogValue {
    fn from(value: f32) -> Self {
        Self::Scalar(value.into())
    }
}

impl From<i64> for LogValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for LogValue {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<u32> for LogValue {
    fn from(value: u32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<bool> for LogValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for LogValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for LogValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<f64>> for LogValue {
    fn from(values: Vec<f64>) -> Self {
        Self::Vector(values)
    }
}

impl From<&[f64]> for LogValue {
    fn from(values: &[f64]) -> Self {
        Self::Vector(values.to_vec())
    }
}

impl<const N: usize> From<[f64; N]> for LogValue {
    fn from(values: [f64; N]) -> Self {
        Self::Vector(values.to_vec())
    }
}

impl<const N: usize> From<&[f64; N]> for LogValue {
    fn from(values: &[f64; N]) -> Self {
        Self::Vector(values.to_vec())
    }
}

impl From<LogRecord> for LogValue {
    fn from(record: LogRecord) -> Self {
        Self::Record(record)
    }
}

/// An insertion-ordered, hierarchical record of named values.
///
/// Field names are unique within one level of a record. Nested records may
/// reuse names freely, since each level is its own namespace.
///
/// Values can be looked up one level at a time with [`LogRecord::get`] or
/// across levels with a dotted path via [`LogRecord::get_path`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogRecord {
    fields: Vec<(String, LogValue)>,
}

impl LogRecord {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of fields at the top level of this record.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns `true` if a field with this name exists at the top level.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(field, _)| field == name)
    }

    /// Returns the value of a top-level field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&LogValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Returns the value at a dotted path, such as `"engine.actuator.position"`.
    ///
    /// Each segment descends into a nested record. Returns `None` if any
    /// segment is missing or an intermediate value is not a record.
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<&LogValue> {
        let mut segments = path.split('.');
        let mut value = self.get(segments.next()?)?;
        for segment in segments {
            value = value.as_record()?.get(segment)?;
        }
        Some(value)
    }

    /// Adds a field to the top level of the record.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::DuplicateField`] if the name is already present.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<LogValue>,
    ) -> Result<(), LogError> {
        let name = name.into();
        if self.contains(&name) {
            return Err(LogError::DuplicateField { name });
        }
        self.fields.push((name, value.into()));
        Ok(())
    }

    /// Adds a field and returns the record, for building records inline.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::DuplicateField`] if the name is already present.
    pub fn with(
        mut self,
        name: impl Into<String>,
        value: impl Into<LogValue>,
    ) -> Result<Self, LogError> {
        self.insert(name, value)?;
        Ok(self)
    }

    /// Moves every field of `other` into the top level of this record.
    ///
    /// The check happens before anything is moved, so on error this record is
    /// left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::FieldCollision`] naming the first field of `other`
    /// that already exists here.
    pub fn absorb(&mut self, other: LogRecord) -> Result<(), LogError> {
        if let Some((name, _)) = other.fields.iter().find(|(name, _)| self.contains(name)) {
            return Err(LogError::FieldCollision { name: name.clone() });
        }
        self.fields.extend(other.fields);
        Ok(())
    }

    /// Iterates over the top-level fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &LogValue)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Iterates over the top-level field names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Returns the dotted path and shape of every value in the record.
    ///
    /// Nested records contribute an entry for themselves (with
    /// [`LogShape::Record`]) followed by entries for their contents.
    #[must_use]
    pub fn shapes(&self) -> Vec<(String, LogShape)> {
        let mut shapes = Vec::new();
        collect_shapes(self, "", &mut shapes);
        shapes
    }
}

fn collect_shapes(record: &LogRecord, prefix: &str, shapes: &mut Vec<(String, LogShape)>) {
    for (name, value) in &record.fields {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };
        shapes.push((path.clone(), value.shape()));
        if let LogValue::Record(inner) = value {
            collect_shapes(inner, &path, shapes);
        }
    }
}

impl IntoIterator for LogRecord {
    type Item = (String, LogValue);
    type IntoIter = std::vec::IntoIter<(String, LogValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl fmt::Display for LogValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(value) => write!(f, "{value}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "{value:?}"),
            Self::Vector(values) => write!(f, "{values:?}"),
            Self::Record(record) => write!(f, "{record}"),
        }
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (index, (name, value)) in self.fields.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        f.write_str("}")
    }
}

impl fmt::Display for LogShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar => f.write_str("scalar"),
            Self::Integer => f.write_str("integer"),
            Self::Bool => f.write_str("bool"),
            Self::Text => f.write_str("text"),
            Self::Vector(len) => write!(f, "vector[{len}]"),
            Self::Record => f.write_str("record"),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for LogRecord {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_record() -> LogRecord {
        let actuator = LogRecord::new().with("position", 0.25).unwrap();
        LogRecord::new()
            .with("rpm", 3000.0)
            .unwrap()
            .with("actuator", actuator)
            .unwrap()
    }

    #[test]
    fn insert_preserves_order() {
        let record = LogRecord::new()
            .with("b", 2.0)
            .unwrap()
            .with("a", 1.0)
            .unwrap()
            .with("c", 3.0)
            .unwrap();

        let keys: Vec<_> = record.keys().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(record.len(), 3);
    }

    #[test]
    fn insert_rejects_duplicates() {
        let mut record = LogRecord::new();
        record.insert("x", 1.0).unwrap();

        let error = record.insert("x", 2.0).unwrap_err();

        assert_eq!(
            error,
            LogError::DuplicateField {
                name: "x".to_owned()
            }
        );
        assert_eq!(record.get("x"), Some(&LogValue::Scalar(1.0)));
    }

    #[test]
    fn nested_levels_are_separate_namespaces() {
        let inner = LogRecord::new().with("x", 2.0).unwrap();
        let record = LogRecord::new()
            .with("x", 1.0)
            .unwrap()
            .with("sub", inner)
            .unwrap();

        assert_eq!(record.get_path("x"), Some(&LogValue::Scalar(1.0)));
        assert_eq!(record.get_path("sub.x"), Some(&LogValue::Scalar(2.0)));
    }

    #[test]
    fn get_path_descends_records() {
        let record = LogRecord::new().with("engine", engine_record()).unwrap();

        assert_eq!(
            record
                .get_path("engine.actuator.position")
                .and_then(LogValue::as_scalar),
            Some(0.25)
        );
        assert!(record.get_path("engine.rpm.value").is_none());
        assert!(record.get_path("engine.missing").is_none());
        assert!(record.get_path("").is_none());
    }

    #[test]
    fn absorb_moves_fields_into_parent() {
        let mut parent = LogRecord::new().with("a", 1.0).unwrap();
        let child = LogRecord::new().with("b", 2.0).unwrap();

        parent.absorb(child).unwrap();

        let expected = LogRecord::new()
            .with("a", 1.0)
            .unwrap()
            .with("b", 2.0)
            .unwrap();
        assert_eq!(parent, expected);
    }

    #[test]
    fn absorb_collision_leaves_parent_unchanged() {
        let mut parent = LogRecord::new()
            .with("a", 1.0)
            .unwrap()
            .with("b", 5.0)
            .unwrap();
        let before = parent.clone();
        let child = LogRecord::new()
            .with("c", 3.0)
            .unwrap()
            .with("b", 2.0)
            .unwrap();

        let error = parent.absorb(child).unwrap_err();

        assert_eq!(
            error,
            LogError::FieldCollision {
                name: "b".to_owned()
            }
        );
        assert_eq!(parent, before);
    }

    #[test]
    fn shapes_cover_every_level() {
        let record = LogRecord::new()
            .with("speed", 12.0)
            .unwrap()
            .with("gear", 3_i64)
            .unwrap()
            .with("wheels", [1.0, 2.0, 3.0, 4.0])
            .unwrap()
            .with("engine", engine_record())
            .unwrap();

        let shapes = record.shapes();

        assert_eq!(
            shapes,
            vec![
                ("speed".to_owned(), LogShape::Scalar),
                ("gear".to_owned(), LogShape::Integer),
                ("wheels".to_owned(), LogShape::Vector(4)),
                ("engine".to_owned(), LogShape::Record),
                ("engine.rpm".to_owned(), LogShape::Scalar),
                ("engine.actuator".to_owned(), LogShape::Record),
                ("engine.actuator.position".to_owned(), LogShape::Scalar),
            ]
        );
    }

    #[test]
    fn display_reads_like_a_map() {
        let inner = LogRecord::new().with("b", 2.0).unwrap();
        let record = LogRecord::new()
            .with("a", 1.0)
            .unwrap()
            .with("sub", inner)
            .unwrap()
            .with("mode", "cruise")
            .unwrap();

        assert_eq!(record.to_string(), r#"{a: 1, sub: {b: 2}, mode: "cruise"}"#);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_as_ordered_map() {
        let record = LogRecord::new()
            .with("z", 1.0)
            .unwrap()
            .with("engine", engine_record())
            .unwrap()
            .with("flags", true)
            .unwrap();

        let json = serde_json::to_string(&record).unwrap();

        assert_eq!(
            json,
            r#"{"z":1.0,"engine":{"rpm":3000.0,"actuator":{"position":0.25}},"flags":true}"#
        );
    }
}
