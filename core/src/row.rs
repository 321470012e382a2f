//! Result rows produced by an executor.

use compact_str::CompactString;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::value::Value;

/// An ordered column-to-value mapping for one fetched row.
///
/// Serializes as a JSON object in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(CompactString, Value)>,
}

impl Row {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty row with capacity for `n` cells.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            cells: Vec::with_capacity(n),
        }
    }

    /// Appends a cell.
    pub fn push(&mut self, column: impl Into<CompactString>, value: Value) {
        self.cells.push((column.into(), value));
    }

    /// Returns the value of the named column, if present.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Number of cells in the row.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true when the row has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterates cells in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.cells.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            cells: iter
                .into_iter()
                .map(|(name, value)| (CompactString::from(name), value))
                .collect(),
        }
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, value) in &self.cells {
            map.serialize_entry(name.as_str(), value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_column_name() {
        let mut row = Row::new();
        row.push("id", Value::Integer(7));
        row.push("title", Value::Text("hello".into()));
        assert_eq!(row.get("id"), Some(&Value::Integer(7)));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn serializes_as_object() {
        let mut row = Row::new();
        row.push("id", Value::Integer(1));
        row.push("name", Value::Text("Ada".into()));
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"id":1,"name":"Ada"}"#);
    }
}
