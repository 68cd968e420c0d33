//! Per-document field access.

use ahash::AHashMap;
use serde_json::Value;
use crate::value::FieldValue;

/// Live field values of the document being scored.
pub trait DataSource {
    /// All values of `field`; empty when the field is absent.
    fn get(&self, field: &str) -> Vec<FieldValue>;
}

impl<T: DataSource + ?Sized> DataSource for &T {
    fn get(&self, field: &str) -> Vec<FieldValue> {
        (**self).get(field)
    }
}

/// JSON documents: scalars are single values, arrays fan out, nulls are absent.
impl DataSource for Value {
    fn get(&self, field: &str) -> Vec<FieldValue> {
        match Value::get(self, field) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.iter().filter_map(FieldValue::from_json).collect(),
            Some(scalar) => FieldValue::from_json(scalar).into_iter().collect(),
        }
    }
}

/// In-memory field map, mostly for tests and embedding hosts.
#[derive(Debug, Clone, Default)]
pub struct MapDataSource {
    fields: AHashMap<String, Vec<FieldValue>>,
}

impl MapDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, values: Vec<FieldValue>) {
        self.fields.insert(field.into(), values);
    }

    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.entry(field.into()).or_default().push(value.into());
        self
    }

    /// Register the field as present but empty.
    #[must_use]
    pub fn with_empty(mut self, field: impl Into<String>) -> Self {
        self.fields.insert(field.into(), Vec::new());
        self
    }
}

impl DataSource for MapDataSource {
    fn get(&self, field: &str) -> Vec<FieldValue> {
        self.fields.get(field).cloned().unwrap_or_default()
    }
}
