//! Vector ranges
//!
//! A [`VectorRange`] owns a contiguous span `[offset, offset + size)` of the
//! feature vector together with the rule that fills it from a document.

use ahash::AHashMap;
use pmmlx_core::{DataSource, Error, FeatureVectorBuilder, FieldValue, OpType, Result};
use serde::Serialize;
use crate::resolve::ResolvedField;

/// Encoding kind of a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RangeKind {
    /// One slot holding the numeric value.
    ContinuousSingleEntry,
    /// One slot per declared category, 1.0 at the observed one.
    SparseCategorical1ofK,
    /// One slot that is always 1.0.
    Intercept,
}

#[derive(Debug, Clone)]
enum Encoding {
    Continuous {
        field: ResolvedField,
    },
    Categorical {
        field: ResolvedField,
        /// Category key to position within the range.
        positions: AHashMap<String, usize>,
    },
    Intercept {
        parameter: String,
    },
}

#[derive(Debug, Clone)]
pub struct VectorRange {
    offset: usize,
    size: usize,
    encoding: Encoding,
}

impl VectorRange {
    /// Build the range for a resolved field starting at `offset`.
    pub fn build(field: ResolvedField, offset: usize) -> Result<Self> {
        match field.optype {
            OpType::Continuous => {
                if !field.data_type.is_numeric() {
                    return Err(Error::unsupported(format!(
                        "continuous field '{}' has non-numeric datatype {:?}",
                        field.name, field.data_type
                    )));
                }
                Ok(Self {
                    offset,
                    size: 1,
                    encoding: Encoding::Continuous { field },
                })
            }
            OpType::Categorical => {
                if field.categories().is_empty() {
                    return Err(Error::malformed(format!(
                        "categorical field '{}' declares no values",
                        field.raw.name
                    )));
                }
                let mut positions = AHashMap::with_capacity(field.categories().len());
                for (position, category) in field.categories().iter().enumerate() {
                    let key = FieldValue::from(category.as_str())
                        .category_key(field.raw.data_type);
                    if positions.insert(key, position).is_some() {
                        return Err(Error::malformed(format!(
                            "categorical field '{}' declares '{}' twice",
                            field.raw.name, category
                        )));
                    }
                }
                Ok(Self {
                    offset,
                    size: positions.len(),
                    encoding: Encoding::Categorical { field, positions },
                })
            }
            other => Err(Error::unsupported(format!(
                "field '{}' has operational type {:?}; only continuous and categorical are implemented",
                field.name, other
            ))),
        }
    }

    /// A singleton range for a parameter no field claims.
    pub fn intercept(parameter: impl Into<String>, offset: usize) -> Self {
        Self {
            offset,
            size: 1,
            encoding: Encoding::Intercept {
                parameter: parameter.into(),
            },
        }
    }

    #[inline]
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// One past the last index of this range.
    #[inline]
    #[must_use]
    pub fn end(&self) -> usize {
        self.offset + self.size
    }

    pub fn kind(&self) -> RangeKind {
        match self.encoding {
            Encoding::Continuous { .. } => RangeKind::ContinuousSingleEntry,
            Encoding::Categorical { .. } => RangeKind::SparseCategorical1ofK,
            Encoding::Intercept { .. } => RangeKind::Intercept,
        }
    }

    /// The model-level field this range encodes, or the parameter name for
    /// an intercept.
    pub fn name(&self) -> &str {
        match &self.encoding {
            Encoding::Continuous { field } | Encoding::Categorical { field, .. } => &field.name,
            Encoding::Intercept { parameter } => parameter,
        }
    }

    pub fn field(&self) -> Option<&ResolvedField> {
        match &self.encoding {
            Encoding::Continuous { field } | Encoding::Categorical { field, .. } => Some(field),
            Encoding::Intercept { .. } => None,
        }
    }

    /// Position of `category` within a categorical range.
    pub fn category_position(&self, category: &str) -> Option<usize> {
        match &self.encoding {
            Encoding::Categorical { field, positions } => {
                let key = FieldValue::from(category).category_key(field.raw.data_type);
                positions.get(&key).copied()
            }
            _ => None,
        }
    }

    /// Write this range's entries for `source` into `builder`.
    pub fn fill<S: DataSource + ?Sized>(
        &self,
        source: &S,
        builder: &mut FeatureVectorBuilder,
    ) -> Result<()> {
        match &self.encoding {
            Encoding::Intercept { .. } => {
                builder.push(self.offset, 1.0);
            }
            Encoding::Continuous { field } => {
                let values = field.apply(source);
                let value = match values.as_slice() {
                    [value] => value,
                    [] => {
                        return Err(Error::mismatch(format!(
                            "continuous field '{}' has no value",
                            field.name
                        )))
                    }
                    _ => {
                        return Err(Error::mismatch(format!(
                            "continuous field '{}' has {} values, expected one",
                            field.name,
                            values.len()
                        )))
                    }
                };
                let number = value
                    .coerce(field.data_type)
                    .and_then(|v| v.as_f64())
                    .ok_or_else(|| {
                        Error::mismatch(format!(
                            "continuous field '{}' has non-numeric value '{}'",
                            field.name, value
                        ))
                    })?;
                builder.push(self.offset, number);
            }
            Encoding::Categorical { field, positions } => {
                let mut seen: Vec<usize> = Vec::new();
                for value in field.apply(source) {
                    let key = value.category_key(field.raw.data_type);
                    let position = *positions.get(&key).ok_or_else(|| {
                        Error::mismatch(format!(
                            "value '{}' is not a declared category of '{}'",
                            value, field.name
                        ))
                    })?;
                    if !seen.contains(&position) {
                        seen.push(position);
                        builder.push(self.offset + position, 1.0);
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::resolve_field;
    use pmmlx_core::{DataDictionary, DataField, DataType, DerivedField, MapDataSource};

    fn dictionary() -> DataDictionary {
        DataDictionary::new(vec![
            DataField::continuous("age", DataType::Double),
            DataField::categorical("grade", DataType::String, ["A", "B", "C"]),
            DataField::categorical("level", DataType::Integer, ["1", "2"]),
            DataField {
                name: "rank".to_string(),
                optype: OpType::Ordinal,
                data_type: DataType::Integer,
                values: vec!["1".to_string()],
            },
        ])
    }

    fn fill(range: &VectorRange, size: usize, source: &MapDataSource) -> Result<Vec<(usize, f64)>> {
        let mut builder = FeatureVectorBuilder::new(size);
        range.fill(source, &mut builder)?;
        Ok(builder.build()?.iter().collect())
    }

    #[test]
    fn test_categorical_one_of_k() {
        let field = resolve_field("grade", &[], &dictionary()).unwrap();
        let range = VectorRange::build(field, 4).unwrap();
        assert_eq!(range.kind(), RangeKind::SparseCategorical1ofK);
        assert_eq!(range.size(), 3);

        let entries = fill(&range, 7, &MapDataSource::new().with("grade", "B")).unwrap();
        assert_eq!(entries, vec![(5, 1.0)]);

        let result = fill(&range, 7, &MapDataSource::new().with("grade", "D"));
        assert!(matches!(result, Err(Error::EvaluationMismatch(_))));
    }

    #[test]
    fn test_categorical_fan_out_and_absent() {
        let field = resolve_field("grade", &[], &dictionary()).unwrap();
        let range = VectorRange::build(field, 0).unwrap();

        let source = MapDataSource::new().with("grade", "C").with("grade", "A").with("grade", "C");
        assert_eq!(fill(&range, 3, &source).unwrap(), vec![(0, 1.0), (2, 1.0)]);
        assert!(fill(&range, 3, &MapDataSource::new()).unwrap().is_empty());
    }

    #[test]
    fn test_numeric_categories_match_by_value() {
        let field = resolve_field("level", &[], &dictionary()).unwrap();
        let range = VectorRange::build(field, 0).unwrap();
        assert_eq!(range.category_position("2.0"), Some(1));
        let entries = fill(&range, 2, &MapDataSource::new().with("level", 2)).unwrap();
        assert_eq!(entries, vec![(1, 1.0)]);
    }

    #[test]
    fn test_continuous_with_substitution() {
        let derived = vec![DerivedField::missing_value(
            "age_filled",
            "age",
            OpType::Continuous,
            DataType::Double,
            "0.0",
        )];
        let field = resolve_field("age_filled", &derived, &dictionary()).unwrap();
        let range = VectorRange::build(field, 2).unwrap();
        assert_eq!(fill(&range, 3, &MapDataSource::new()).unwrap(), vec![(2, 0.0)]);
        assert_eq!(fill(&range, 3, &MapDataSource::new().with("age", 37)).unwrap(), vec![(2, 37.0)]);
    }

    #[test]
    fn test_continuous_rejects_bad_input() {
        let field = resolve_field("age", &[], &dictionary()).unwrap();
        let range = VectorRange::build(field, 0).unwrap();
        for source in [
            MapDataSource::new(),
            MapDataSource::new().with("age", "old"),
            MapDataSource::new().with("age", 1.0).with("age", 2.0),
        ] {
            assert!(matches!(fill(&range, 1, &source), Err(Error::EvaluationMismatch(_))));
        }
    }

    #[test]
    fn test_intercept_ignores_input() {
        let range = VectorRange::intercept("p0", 3);
        assert_eq!(range.kind(), RangeKind::Intercept);
        assert_eq!(range.name(), "p0");
        assert_eq!(fill(&range, 4, &MapDataSource::new()).unwrap(), vec![(3, 1.0)]);
    }

    #[test]
    fn test_unsupported_optype() {
        let field = resolve_field("rank", &[], &dictionary()).unwrap();
        assert!(matches!(VectorRange::build(field, 0), Err(Error::UnsupportedSpec(_))));
    }
}
