//! In-memory model-spec tree
//!
//! This is the shape handed over by the document parser: a data dictionary,
//! a transformation dictionary of derived fields, and one or more model
//! descriptions. Keys follow the camelCase attribute names of the source
//! format so a JSON rendition of a document deserializes directly.

use serde::{Deserialize, Serialize};
use std::io::Read;
use crate::error::Result;
use crate::model_spec::ModelSpec;

/// A complete parsed model document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pmml {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    pub data_dictionary: DataDictionary,

    #[serde(default)]
    pub transformation_dictionary: TransformationDictionary,

    #[serde(default)]
    pub models: Vec<ModelSpec>,
}

impl Pmml {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DataDictionary {
    #[serde(default)]
    pub data_fields: Vec<DataField>,
}

impl DataDictionary {
    pub fn new(data_fields: Vec<DataField>) -> Self {
        Self { data_fields }
    }

    pub fn field(&self, name: &str) -> Option<&DataField> {
        self.data_fields.iter().find(|f| f.name == name)
    }
}

/// A raw input field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DataField {
    pub name: String,
    pub optype: OpType,
    pub data_type: DataType,
    /// Legal categories, in declaration order. Empty for continuous fields.
    #[serde(default)]
    pub values: Vec<String>,
}

impl DataField {
    pub fn continuous(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            optype: OpType::Continuous,
            data_type,
            values: Vec::new(),
        }
    }

    pub fn categorical<S: Into<String>>(
        name: impl Into<String>,
        data_type: DataType,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name: name.into(),
            optype: OpType::Categorical,
            data_type,
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OpType {
    Continuous,
    Categorical,
    Ordinal,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Double,
    Float,
    Integer,
    String,
    Boolean,
    Date,
}

impl DataType {
    #[inline]
    pub fn is_numeric(self) -> bool {
        matches!(self, DataType::Double | DataType::Float | DataType::Integer)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransformationDictionary {
    #[serde(default)]
    pub derived_fields: Vec<DerivedField>,
}

impl TransformationDictionary {
    pub fn new(derived_fields: Vec<DerivedField>) -> Self {
        Self { derived_fields }
    }
}

/// A named field computed from another field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DerivedField {
    pub name: String,
    pub optype: OpType,
    pub data_type: DataType,
    pub expression: Expression,
}

impl DerivedField {
    /// `if(isMissing(source), literal, source)`
    pub fn missing_value(
        name: impl Into<String>,
        source: impl Into<String>,
        optype: OpType,
        data_type: DataType,
        literal: impl Into<String>,
    ) -> Self {
        let source = source.into();
        Self {
            name: name.into(),
            optype,
            data_type,
            expression: Expression::Apply {
                function: "if".to_string(),
                expressions: vec![
                    Expression::Apply {
                        function: "isMissing".to_string(),
                        expressions: vec![Expression::FieldRef { field: source.clone() }],
                    },
                    Expression::Constant { value: Some(literal.into()) },
                    Expression::FieldRef { field: source },
                ],
            },
        }
    }
}

/// Transformation expressions. Only `Apply`, `Constant` and `FieldRef` are
/// understood; every other kind deserializes to `Unsupported`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Expression {
    Apply {
        function: String,
        #[serde(default)]
        expressions: Vec<Expression>,
    },
    Constant {
        #[serde(default)]
        value: Option<String>,
    },
    FieldRef {
        field: String,
    },
    #[serde(other)]
    Unsupported,
}

impl Expression {
    pub fn kind(&self) -> &'static str {
        match self {
            Expression::Apply { .. } => "Apply",
            Expression::Constant { .. } => "Constant",
            Expression::FieldRef { .. } => "FieldRef",
            Expression::Unsupported => "unsupported expression",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MiningSchema {
    #[serde(default)]
    pub mining_fields: Vec<MiningField>,
}

impl MiningSchema {
    pub fn new(mining_fields: Vec<MiningField>) -> Self {
        Self { mining_fields }
    }

    pub fn field(&self, name: &str) -> Option<&MiningField> {
        self.mining_fields.iter().find(|f| f.name == name)
    }

    /// The `target` field, or the first `predicted` one when none is marked target.
    pub fn target_field(&self) -> Option<&str> {
        self.mining_fields
            .iter()
            .find(|f| f.usage_type == UsageType::Target)
            .or_else(|| {
                self.mining_fields
                    .iter()
                    .find(|f| f.usage_type == UsageType::Predicted)
            })
            .map(|f| f.name.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MiningField {
    pub name: String,
    #[serde(default)]
    pub usage_type: UsageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_value_replacement: Option<String>,
}

impl MiningField {
    pub fn active(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            usage_type: UsageType::Active,
            missing_value_replacement: None,
        }
    }

    pub fn target(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            usage_type: UsageType::Target,
            missing_value_replacement: None,
        }
    }

    #[must_use]
    pub fn with_replacement(mut self, literal: impl Into<String>) -> Self {
        self.missing_value_replacement = Some(literal.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UsageType {
    #[default]
    Active,
    Target,
    Predicted,
    Supplementary,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MiningFunction {
    Classification,
    Regression,
    Clustering,
}
