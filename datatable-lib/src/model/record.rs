//! Dynamic record row

use std::collections::BTreeMap;

use serde::Serialize;

use super::CellValue;
use super::RowId;
use super::TableRow;
use crate::error::DataTableError;

/// A dynamically shaped row.
///
/// Records hold field values as an ordered map, allowing key accessors to
/// reach any field. Used for rows read from JSON.
///
/// # Example
///
/// ```ignore
/// use datatable_lib::model::Record;
///
/// let record = Record::new(1)
///     .set("name", "Alice")
///     .set("age", 30);
///
/// assert_eq!(record.get("name").to_string(), "Alice");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    #[serde(skip)]
    id: RowId,
    #[serde(flatten)]
    fields: BTreeMap<String, CellValue>,
}

impl Record {
    /// Creates a new empty record.
    pub fn new(id: impl Into<RowId>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Sets a field value (builder pattern).
    pub fn set(mut self, field: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Returns the value of a field, or `Null` when absent.
    pub fn get(&self, field: &str) -> CellValue {
        self.fields.get(field).cloned().unwrap_or_default()
    }

    /// Returns all fields.
    pub fn fields(&self) -> &BTreeMap<String, CellValue> {
        &self.fields
    }

    /// Builds a record from a JSON object.
    ///
    /// The id is read from `id_field`; when that field is missing the
    /// position in the input is used instead.
    pub fn from_json(value: serde_json::Value, id_field: &str, index: usize) -> Result<Self, DataTableError> {
        let serde_json::Value::Object(map) = value else {
            return Err(DataTableError::invalid_record(index, "expected a JSON object"));
        };

        let id = match map.get(id_field) {
            None | Some(serde_json::Value::Null) => RowId::Int(index as i64),
            Some(serde_json::Value::String(s)) => RowId::Str(s.clone()),
            Some(serde_json::Value::Number(n)) => match n.as_i64() {
                Some(i) => RowId::Int(i),
                None => RowId::Str(n.to_string()),
            },
            Some(other) => {
                return Err(DataTableError::invalid_record(
                    index,
                    format!("id field '{}' must be a string or integer, got {}", id_field, other),
                ));
            }
        };

        let fields = map.into_iter().map(|(k, v)| (k, CellValue::from(v))).collect();
        Ok(Self { id, fields })
    }

    /// Builds records from a JSON array of objects.
    pub fn from_json_array(value: serde_json::Value, id_field: &str) -> Result<Vec<Self>, DataTableError> {
        let serde_json::Value::Array(items) = value else {
            return Err(DataTableError::invalid_record(0, "expected a JSON array of objects"));
        };
        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| Self::from_json(item, id_field, index))
            .collect()
    }
}

impl TableRow for Record {
    fn id(&self) -> RowId {
        self.id.clone()
    }

    fn field(&self, key: &str) -> CellValue {
        self.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_reads_id_field() {
        let record = Record::from_json(serde_json::json!({"id": 7, "name": "Alice"}), "id", 0).unwrap();
        assert_eq!(record.id(), RowId::Int(7));
        assert_eq!(record.field("name"), CellValue::from("Alice"));
        assert!(record.field("missing").is_null());
    }

    #[test]
    fn test_from_json_falls_back_to_index() {
        let records = Record::from_json_array(serde_json::json!([{"name": "A"}, {"name": "B"}]), "id").unwrap();
        assert_eq!(records[1].id(), RowId::Int(1));
    }

    #[test]
    fn test_from_json_rejects_non_objects() {
        let err = Record::from_json(serde_json::json!(42), "id", 3).unwrap_err();
        assert!(matches!(err, DataTableError::InvalidRecord { index: 3, .. }));
    }

    #[test]
    fn test_serialize_flattens_fields() {
        let record = Record::new(1).set("age", 30).set("name", "Alice");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, serde_json::json!({"age": 30, "name": "Alice"}));
    }
}
