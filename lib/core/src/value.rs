use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};
use crate::spec::DataType;

/// A single typed value read from a document field or a spec literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Double(f64),
    Float(f32),
    String(String),
}

impl FieldValue {
    /// Parse a spec literal according to a declared datatype.
    pub fn parse(literal: &str, data_type: DataType) -> Result<Self> {
        let literal = literal.trim();
        match data_type {
            DataType::Double => literal
                .parse::<f64>()
                .map(FieldValue::Double)
                .map_err(|_| Error::malformed(format!("'{}' is not a valid double", literal))),
            DataType::Float => literal
                .parse::<f32>()
                .map(FieldValue::Float)
                .map_err(|_| Error::malformed(format!("'{}' is not a valid float", literal))),
            DataType::Integer => literal
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|_| Error::malformed(format!("'{}' is not a valid integer", literal))),
            DataType::String => Ok(FieldValue::String(literal.to_string())),
            other => Err(Error::unsupported(format!(
                "only double, float, integer and string literals are implemented, got {:?}",
                other
            ))),
        }
    }

    /// Convert a scalar JSON value. Nulls, objects and arrays yield `None`.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Some(FieldValue::Integer(i)),
                None => n.as_f64().map(FieldValue::Double),
            },
            serde_json::Value::String(s) => Some(FieldValue::String(s.clone())),
            serde_json::Value::Bool(b) => Some(FieldValue::String(b.to_string())),
            _ => None,
        }
    }

    #[inline]
    pub fn is_numeric(&self) -> bool {
        !matches!(self, FieldValue::String(_))
    }

    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Double(d) => Some(*d),
            FieldValue::Float(f) => Some(*f as f64),
            FieldValue::String(_) => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Key used to look this value up among a field's declared categories.
    ///
    /// Numeric-typed fields compare by numeric value, so `1`, `1.0` and
    /// `"1.0"` share a key; string-typed fields compare by text.
    pub fn category_key(&self, data_type: DataType) -> String {
        if data_type.is_numeric() {
            let numeric = match self {
                FieldValue::String(s) => s.trim().parse::<f64>().ok(),
                other => other.as_f64(),
            };
            if let Some(n) = numeric {
                return match data_type {
                    DataType::Float => format!("{}", n as f32),
                    _ => format!("{}", n),
                };
            }
        }
        match self {
            FieldValue::String(s) => s.clone(),
            other => format!("{}", other.as_f64().unwrap_or(f64::NAN)),
        }
    }

    /// Coerce to the representation a field of `data_type` holds:
    /// numeric types become `Double`, strings stay text.
    pub fn coerce(&self, data_type: DataType) -> Option<FieldValue> {
        if data_type.is_numeric() {
            match self {
                FieldValue::String(s) => s.trim().parse::<f64>().ok().map(FieldValue::Double),
                other => other.as_f64().map(FieldValue::Double),
            }
        } else {
            Some(FieldValue::String(self.category_key(data_type)))
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Double(d) => write!(f, "{}", d),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(d: f64) -> Self {
        FieldValue::Double(d)
    }
}

impl From<f32> for FieldValue {
    fn from(v: f32) -> Self {
        FieldValue::Float(v)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Integer(i as i64)
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}
