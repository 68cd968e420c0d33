// Tree node predicates with three-valued logic
use std::collections::BTreeSet;
use ahash::AHashSet;
use pmmlx_core::{
    CompoundOperator, DataType, Error, FieldValue, Predicate, Result, SetOperator, SimpleOperator,
};
use pmmlx_schema::{FieldExtractor, FieldInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    NotEqual,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
}

/// A predicate with operands typed against the field they test.
#[derive(Debug, Clone)]
pub enum Condition {
    True,
    False,
    Compare {
        field: String,
        op: Comparison,
        operand: FieldValue,
    },
    IsMissing {
        field: String,
    },
    IsNotMissing {
        field: String,
    },
    InSet {
        field: String,
        data_type: DataType,
        members: AHashSet<String>,
        negate: bool,
    },
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Xor(Vec<Condition>),
    Surrogate(Vec<Condition>),
}

impl Condition {
    /// Type the predicate's operands against the extractor's fields.
    pub fn compile(predicate: &Predicate, fields: &FieldExtractor) -> Result<Self> {
        let data_type = |field: &str| {
            fields
                .field(field)
                .map(|f| f.data_type)
                .ok_or_else(|| Error::malformed(format!("predicate tests unknown field '{}'", field)))
        };

        Ok(match predicate {
            Predicate::True => Condition::True,
            Predicate::False => Condition::False,
            Predicate::SimplePredicate { field, operator, value } => {
                let dt = data_type(field)?;
                let op = match operator {
                    SimpleOperator::IsMissing => {
                        return Ok(Condition::IsMissing { field: field.clone() })
                    }
                    SimpleOperator::IsNotMissing => {
                        return Ok(Condition::IsNotMissing { field: field.clone() })
                    }
                    SimpleOperator::Equal => Comparison::Equal,
                    SimpleOperator::NotEqual => Comparison::NotEqual,
                    SimpleOperator::LessThan => Comparison::LessThan,
                    SimpleOperator::LessOrEqual => Comparison::LessOrEqual,
                    SimpleOperator::GreaterThan => Comparison::GreaterThan,
                    SimpleOperator::GreaterOrEqual => Comparison::GreaterOrEqual,
                };
                let literal = value.as_deref().ok_or_else(|| {
                    Error::malformed(format!("{:?} on '{}' has no value", operator, field))
                })?;
                let ordering = !matches!(op, Comparison::Equal | Comparison::NotEqual);
                if ordering && !dt.is_numeric() {
                    return Err(Error::unsupported(format!(
                        "{:?} on non-numeric field '{}' is not implemented",
                        operator, field
                    )));
                }
                // split points on integer fields are often midpoints like "30.5"
                let literal_type = if dt.is_numeric() { DataType::Double } else { dt };
                let operand = FieldValue::parse(literal, literal_type)?
                    .coerce(dt)
                    .ok_or_else(|| Error::malformed(format!("invalid operand '{}'", literal)))?;
                Condition::Compare {
                    field: field.clone(),
                    op,
                    operand,
                }
            }
            Predicate::SimpleSetPredicate { field, boolean_operator, array } => {
                let dt = data_type(field)?;
                let members = array
                    .iter()
                    .map(|v| FieldValue::from(v.as_str()).category_key(dt))
                    .collect();
                Condition::InSet {
                    field: field.clone(),
                    data_type: dt,
                    members,
                    negate: *boolean_operator == SetOperator::IsNotIn,
                }
            }
            Predicate::CompoundPredicate { boolean_operator, predicates } => {
                let children = predicates
                    .iter()
                    .map(|p| Self::compile(p, fields))
                    .collect::<Result<Vec<_>>>()?;
                match boolean_operator {
                    CompoundOperator::And => Condition::And(children),
                    CompoundOperator::Or => Condition::Or(children),
                    CompoundOperator::Xor => Condition::Xor(children),
                    CompoundOperator::Surrogate => Condition::Surrogate(children),
                }
            }
        })
    }

    /// `Some(true)`, `Some(false)`, or `None` when the answer is unknown
    /// because a tested field is missing.
    pub fn evaluate(&self, input: &FieldInput) -> Option<bool> {
        match self {
            Condition::True => Some(true),
            Condition::False => Some(false),
            Condition::IsMissing { field } => Some(input.get(field).is_none()),
            Condition::IsNotMissing { field } => Some(input.get(field).is_some()),
            Condition::Compare { field, op, operand } => {
                let value = input.get(field)?;
                compare(value, *op, operand)
            }
            Condition::InSet { field, data_type, members, negate } => {
                let value = input.get(field)?;
                Some(members.contains(&value.category_key(*data_type)) != *negate)
            }
            Condition::And(children) => {
                let mut unknown = false;
                for child in children {
                    match child.evaluate(input) {
                        Some(false) => return Some(false),
                        None => unknown = true,
                        Some(true) => {}
                    }
                }
                if unknown { None } else { Some(true) }
            }
            Condition::Or(children) => {
                let mut unknown = false;
                for child in children {
                    match child.evaluate(input) {
                        Some(true) => return Some(true),
                        None => unknown = true,
                        Some(false) => {}
                    }
                }
                if unknown { None } else { Some(false) }
            }
            Condition::Xor(children) => {
                let mut result = false;
                for child in children {
                    result ^= child.evaluate(input)?;
                }
                Some(result)
            }
            Condition::Surrogate(children) => children.iter().find_map(|c| c.evaluate(input)),
        }
    }
}

fn compare(value: &FieldValue, op: Comparison, operand: &FieldValue) -> Option<bool> {
    if let (Some(a), Some(b)) = (value.as_f64(), operand.as_f64()) {
        return Some(match op {
            Comparison::Equal => a == b,
            Comparison::NotEqual => a != b,
            Comparison::LessThan => a < b,
            Comparison::LessOrEqual => a <= b,
            Comparison::GreaterThan => a > b,
            Comparison::GreaterOrEqual => a >= b,
        });
    }
    let (a, b) = (value.as_str()?, operand.as_str()?);
    match op {
        Comparison::Equal => Some(a == b),
        Comparison::NotEqual => Some(a != b),
        _ => None,
    }
}

/// Collect every field a predicate tests.
pub fn referenced_fields<'a>(predicate: &'a Predicate, out: &mut BTreeSet<&'a str>) {
    match predicate {
        Predicate::True | Predicate::False => {}
        Predicate::SimplePredicate { field, .. } | Predicate::SimpleSetPredicate { field, .. } => {
            out.insert(field.as_str());
        }
        Predicate::CompoundPredicate { predicates, .. } => {
            for p in predicates {
                referenced_fields(p, out);
            }
        }
    }
}
