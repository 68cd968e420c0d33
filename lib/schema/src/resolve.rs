//! Field Resolver
//!
//! Walks a derived-field chain back to the raw field it is computed from and
//! collects the preprocessing steps on the way. Steps are discovered
//! outermost-first and reversed before they are returned, so applying them
//! in list order runs from the raw value outwards.

use ahash::{AHashMap, AHashSet};
use pmmlx_core::{
    DataDictionary, DataField, DataSource, DataType, DerivedField, Error, Expression,
    FieldValue, MiningSchema, OpType, Result,
};
use tracing::debug;

/// A typed operation applied to a raw value before vectorization.
#[derive(Debug, Clone, PartialEq)]
pub enum PreprocessingStep {
    /// Substitute `replacement` when the field has no value.
    MissingValue { replacement: FieldValue },
}

impl PreprocessingStep {
    pub fn apply(&self, values: Vec<FieldValue>) -> Vec<FieldValue> {
        match self {
            PreprocessingStep::MissingValue { replacement } => {
                if values.is_empty() {
                    vec![replacement.clone()]
                } else {
                    values
                }
            }
        }
    }
}

/// A logical field traced back to its raw input.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField {
    /// Name the model refers to.
    pub name: String,
    /// The raw dictionary field the chain ends at.
    pub raw: DataField,
    /// Operational type of the logical field.
    pub optype: OpType,
    /// Datatype of the logical field.
    pub data_type: DataType,
    /// Steps in application order, raw side first.
    pub steps: Vec<PreprocessingStep>,
}

impl ResolvedField {
    /// Read the raw values from `source` and run them through every step.
    pub fn apply<S: DataSource + ?Sized>(&self, source: &S) -> Vec<FieldValue> {
        let mut values = source.get(&self.raw.name);
        for step in &self.steps {
            values = step.apply(values);
        }
        values
    }

    /// Declared categories of the underlying raw field.
    #[inline]
    pub fn categories(&self) -> &[String] {
        &self.raw.values
    }
}

/// Resolves field names against a dictionary, the visible derived fields
/// and optionally a model's mining schema.
#[derive(Debug)]
pub struct FieldResolver<'a> {
    dictionary: &'a DataDictionary,
    derived: AHashMap<&'a str, &'a DerivedField>,
    mining_schema: Option<&'a MiningSchema>,
}

impl<'a> FieldResolver<'a> {
    pub fn new<I>(dictionary: &'a DataDictionary, derived_fields: I) -> Self
    where
        I: IntoIterator<Item = &'a DerivedField>,
    {
        let derived = derived_fields
            .into_iter()
            .map(|d| (d.name.as_str(), d))
            .collect();
        Self {
            dictionary,
            derived,
            mining_schema: None,
        }
    }

    /// Also apply the mining schema's missing-value replacements.
    #[must_use]
    pub fn with_mining_schema(mut self, mining_schema: &'a MiningSchema) -> Self {
        self.mining_schema = Some(mining_schema);
        self
    }

    pub fn dictionary(&self) -> &'a DataDictionary {
        self.dictionary
    }

    pub fn resolve(&self, target: &str) -> Result<ResolvedField> {
        let mut steps = Vec::new();
        let mut visited: AHashSet<&str> = AHashSet::new();
        let mut current = target;
        let mut logical: Option<&DerivedField> = None;

        let raw = loop {
            if let Some(raw) = self.dictionary.field(current) {
                break raw;
            }
            let derived = self
                .derived
                .get(current)
                .copied()
                .ok_or_else(|| Error::malformed(format!("field '{}' is not declared", current)))?;
            if !visited.insert(current) {
                return Err(Error::malformed(format!(
                    "derived field '{}' is part of a reference cycle",
                    current
                )));
            }
            let (source, step) = missing_value_step(derived)?;
            logical.get_or_insert(derived);
            steps.push(step);
            current = source;
        };

        if let Some(replacement) = self
            .mining_schema
            .and_then(|schema| schema.field(&raw.name))
            .and_then(|field| field.missing_value_replacement.as_deref())
        {
            steps.push(PreprocessingStep::MissingValue {
                replacement: FieldValue::parse(replacement, raw.data_type)?,
            });
        }
        steps.reverse();

        debug!(
            field = target,
            raw = %raw.name,
            steps = steps.len(),
            "Resolved field chain"
        );

        let (optype, data_type) = match logical {
            Some(derived) => (derived.optype, derived.data_type),
            None => (raw.optype, raw.data_type),
        };
        Ok(ResolvedField {
            name: target.to_string(),
            raw: raw.clone(),
            optype,
            data_type,
            steps,
        })
    }
}

/// Resolve `target` against a dictionary and a list of derived fields.
pub fn resolve_field(
    target: &str,
    derived_fields: &[DerivedField],
    dictionary: &DataDictionary,
) -> Result<ResolvedField> {
    FieldResolver::new(dictionary, derived_fields).resolve(target)
}

/// Match `if(isMissing(x), literal, x)` and return `x` plus the step.
fn missing_value_step(derived: &DerivedField) -> Result<(&str, PreprocessingStep)> {
    let unsupported = || {
        Error::unsupported(format!(
            "derived field '{}': only if(isMissing(x), constant, x) is implemented, got {}",
            derived.name,
            derived.expression.kind()
        ))
    };

    let Expression::Apply { function, expressions } = &derived.expression else {
        return Err(unsupported());
    };
    let [test, constant, fallback] = expressions.as_slice() else {
        return Err(unsupported());
    };
    if function != "if" {
        return Err(unsupported());
    }

    let source = match test {
        Expression::Apply { function, expressions } if function == "isMissing" => {
            match expressions.as_slice() {
                [Expression::FieldRef { field }] => field.as_str(),
                _ => return Err(unsupported()),
            }
        }
        _ => return Err(unsupported()),
    };
    match fallback {
        Expression::FieldRef { field } if field == source => {}
        _ => return Err(unsupported()),
    }
    let literal = match constant {
        Expression::Constant { value: Some(value) } => value,
        Expression::Constant { value: None } => {
            return Err(Error::unsupported(format!(
                "derived field '{}' has no replacement literal",
                derived.name
            )))
        }
        _ => return Err(unsupported()),
    };

    let replacement = FieldValue::parse(literal, derived.data_type)?;
    Ok((source, PreprocessingStep::MissingValue { replacement }))
}
