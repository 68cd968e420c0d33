//! Parameter Orderer
//!
//! Lays model coefficients out against the feature vector. Fields are
//! visited in sorted name order so the index layout is reproducible and
//! matches coefficient vectors computed elsewhere against the same model.

use std::collections::BTreeMap;
use ahash::{AHashMap, AHashSet};
use pmmlx_core::{DataField, Error, FieldValue, Result};
use serde::Serialize;
use tracing::debug;
use crate::range::{RangeKind, VectorRange};
use crate::resolve::FieldResolver;
use crate::vectorizer::Vectorizer;

/// Parameter `parameter` multiplies field `field`. Categorical fields name
/// the category the parameter belongs to in `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoefficientCell {
    pub field: String,
    pub value: Option<String>,
    pub parameter: String,
}

impl CoefficientCell {
    pub fn continuous(field: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: None,
            parameter: parameter.into(),
        }
    }

    pub fn categorical(
        field: impl Into<String>,
        value: impl Into<String>,
        parameter: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            value: Some(value.into()),
            parameter: parameter.into(),
        }
    }
}

/// A model's parameters in declaration order plus the cells tying them to fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterDeclarations {
    pub parameters: Vec<String>,
    pub cells: Vec<CoefficientCell>,
}

/// Parameter names by vector index.
///
/// `None` marks a categorical slot no parameter claims (the reference
/// category of a dummy-coded factor); its coefficient is zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderedParameterList(Vec<Option<String>>);

impl OrderedParameterList {
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).and_then(|p| p.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&str>> {
        self.0.iter().map(|p| p.as_deref())
    }

    pub fn position(&self, parameter: &str) -> Option<usize> {
        self.0.iter().position(|p| p.as_deref() == Some(parameter))
    }

    /// Coefficient per vector index; unclaimed slots and parameters
    /// without a value get zero.
    pub fn coefficients(&self, values: &AHashMap<String, f64>) -> Vec<f64> {
        self.iter()
            .map(|p| p.and_then(|name| values.get(name).copied()).unwrap_or(0.0))
            .collect()
    }
}

impl FromIterator<Option<String>> for OrderedParameterList {
    fn from_iter<I: IntoIterator<Item = Option<String>>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Ranges plus the parameter list aligned with them.
#[derive(Debug, Clone)]
pub struct OrderedLayout {
    pub ranges: Vec<VectorRange>,
    pub parameters: OrderedParameterList,
}

impl OrderedLayout {
    pub fn size(&self) -> usize {
        self.ranges.iter().map(VectorRange::size).sum()
    }

    pub fn into_vectorizer(self) -> Result<(Vectorizer, OrderedParameterList)> {
        Ok((Vectorizer::new(self.ranges)?, self.parameters))
    }
}

pub fn order_parameters(
    declarations: &ParameterDeclarations,
    resolver: &FieldResolver<'_>,
) -> Result<OrderedLayout> {
    let mut declared: AHashSet<&str> = AHashSet::with_capacity(declarations.parameters.len());
    for parameter in &declarations.parameters {
        if !declared.insert(parameter.as_str()) {
            return Err(Error::malformed(format!(
                "parameter '{}' is declared more than once",
                parameter
            )));
        }
    }
    let mut claimed: AHashSet<&str> = AHashSet::new();
    for cell in &declarations.cells {
        if !declared.contains(cell.parameter.as_str()) {
            return Err(Error::malformed(format!(
                "cell for field '{}' names undeclared parameter '{}'",
                cell.field, cell.parameter
            )));
        }
        if !claimed.insert(cell.parameter.as_str()) {
            return Err(Error::unsupported(format!(
                "parameter '{}' is tied to more than one predictor; correlated predictors are not implemented",
                cell.parameter
            )));
        }
    }

    let mut by_field: BTreeMap<&str, Vec<&CoefficientCell>> = BTreeMap::new();
    for cell in &declarations.cells {
        by_field.entry(cell.field.as_str()).or_default().push(cell);
    }

    let mut ranges = Vec::with_capacity(by_field.len() + declarations.parameters.len());
    let mut parameters = Vec::new();
    let mut offset = 0;

    for (field, cells) in by_field {
        let resolved = resolver.resolve(field)?;
        let range = VectorRange::build(resolved, offset)?;
        let mut slots: Vec<Option<String>> = vec![None; range.size()];

        match range.kind() {
            RangeKind::ContinuousSingleEntry => {
                let [cell] = cells.as_slice() else {
                    return Err(Error::unsupported(format!(
                        "continuous field '{}' has {} coefficient cells; only one linear term is implemented",
                        field,
                        cells.len()
                    )));
                };
                slots[0] = Some(cell.parameter.clone());
            }
            RangeKind::SparseCategorical1ofK => {
                for cell in cells {
                    let value = cell.value.as_deref().ok_or_else(|| {
                        Error::malformed(format!(
                            "cell for categorical field '{}' names no category",
                            field
                        ))
                    })?;
                    let position = range.category_position(value).ok_or_else(|| {
                        Error::malformed(format!(
                            "'{}' is not a declared category of '{}'",
                            value, field
                        ))
                    })?;
                    if slots[position].is_some() {
                        return Err(Error::malformed(format!(
                            "category '{}' of '{}' has more than one parameter",
                            value, field
                        )));
                    }
                    slots[position] = Some(cell.parameter.clone());
                }
            }
            RangeKind::Intercept => {}
        }

        debug!(
            field,
            offset,
            size = range.size(),
            kind = ?range.kind(),
            "Placed vector range"
        );
        offset = range.end();
        parameters.extend(slots);
        ranges.push(range);
    }

    for parameter in &declarations.parameters {
        if !claimed.contains(parameter.as_str()) {
            debug!(parameter = %parameter, offset, "Placed intercept range");
            ranges.push(VectorRange::intercept(parameter.clone(), offset));
            parameters.push(Some(parameter.clone()));
            offset += 1;
        }
    }

    let layout = OrderedLayout {
        ranges,
        parameters: OrderedParameterList(parameters),
    };
    if layout.size() != layout.parameters.len() {
        return Err(Error::malformed(format!(
            "vector size {} does not match {} ordered parameters",
            layout.size(),
            layout.parameters.len()
        )));
    }
    Ok(layout)
}

/// Class labels of a binary classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetClasses {
    /// The class the coefficients model.
    pub positive: String,
    /// Its complement among the target's declared values.
    pub negative: String,
}

/// Find the modeled class and its complement on the target field.
///
/// `modeled` lists the target categories named by the coefficient cells;
/// exactly one distinct value may appear.
pub fn resolve_target_categories<'a, I>(modeled: I, target: &DataField) -> Result<TargetClasses>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut distinct: Vec<&str> = Vec::new();
    for category in modeled {
        if !distinct.contains(&category) {
            distinct.push(category);
        }
    }
    let positive = match distinct.as_slice() {
        [single] => *single,
        [] => {
            return Err(Error::malformed(format!(
                "no target category of '{}' is modeled",
                target.name
            )))
        }
        _ => {
            return Err(Error::unsupported(format!(
                "{} target categories are modeled; only binary classification is implemented",
                distinct.len()
            )))
        }
    };

    let key = |value: &str| FieldValue::from(value).category_key(target.data_type);
    let declared: AHashSet<String> = target.values.iter().map(|v| key(v.as_str())).collect();
    if declared.len() > 2 {
        return Err(Error::unsupported(format!(
            "target '{}' declares {} classes; only binary classification is implemented",
            target.name,
            declared.len()
        )));
    }

    let positive_key = key(positive);
    let complements: Vec<&String> = target
        .values
        .iter()
        .filter(|v| key(v.as_str()) != positive_key)
        .collect();
    match complements.as_slice() {
        [negative] => Ok(TargetClasses {
            positive: positive.to_string(),
            negative: (*negative).clone(),
        }),
        [] => Err(Error::malformed(format!(
            "target '{}' declares no class other than '{}'",
            target.name, positive
        ))),
        _ => Err(Error::malformed(format!(
            "target '{}' declares more than one class other than '{}'",
            target.name, positive
        ))),
    }
}
