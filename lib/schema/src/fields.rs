//! Named-field input for evaluators that work on fields rather than vectors.

use ahash::AHashMap;
use pmmlx_core::{DataSource, Error, FieldValue, Result};
use crate::resolve::{FieldResolver, ResolvedField};

/// Field name to typed value, `None` meaning the field is missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldInput {
    values: AHashMap<String, Option<FieldValue>>,
}

impl FieldInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Option<FieldValue>) {
        self.values.insert(field.into(), value);
    }

    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(field, Some(value.into()));
        self
    }

    #[must_use]
    pub fn with_missing(mut self, field: impl Into<String>) -> Self {
        self.insert(field, None);
        self
    }

    /// Value of `field`; `None` when missing or not present at all.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field).and_then(Option::as_ref)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fail unless the key set is exactly `expected`.
    pub fn check_fields<'a, I>(&self, expected: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut count = 0;
        for field in expected {
            if !self.values.contains_key(field) {
                return Err(Error::mismatch(format!("input has no field '{}'", field)));
            }
            count += 1;
        }
        if count != self.values.len() {
            let mut names: Vec<&str> = self.values.keys().map(String::as_str).collect();
            names.sort_unstable();
            return Err(Error::mismatch(format!(
                "input has {} fields ({}), model expects {}",
                self.values.len(),
                names.join(", "),
                count
            )));
        }
        Ok(())
    }
}

/// Reads the fields a tree or naive-bayes model needs from a document,
/// running each through its preprocessing chain.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    fields: Vec<ResolvedField>,
}

impl FieldExtractor {
    /// Resolve `names` up front; the extractor keeps them sorted.
    pub fn new<'a, I>(names: I, resolver: &FieldResolver<'_>) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut fields = names
            .into_iter()
            .map(|name| resolver.resolve(name))
            .collect::<Result<Vec<_>>>()?;
        fields.sort_by(|a, b| a.name.cmp(&b.name));
        fields.dedup_by(|a, b| a.name == b.name);
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[ResolvedField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&ResolvedField> {
        self.fields
            .binary_search_by(|f| f.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.fields[i])
    }

    pub fn extract<S: DataSource + ?Sized>(&self, source: &S) -> Result<FieldInput> {
        let mut input = FieldInput::new();
        for field in &self.fields {
            let values = field.apply(source);
            let value = match values.as_slice() {
                [] => None,
                [value] => Some(value.coerce(field.data_type).ok_or_else(|| {
                    Error::mismatch(format!(
                        "field '{}' value '{}' does not fit datatype {:?}",
                        field.name, value, field.data_type
                    ))
                })?),
                _ => {
                    return Err(Error::mismatch(format!(
                        "field '{}' has {} values, expected at most one",
                        field.name,
                        values.len()
                    )))
                }
            };
            input.insert(field.name.clone(), value);
        }
        Ok(input)
    }
}
