//! # pmmlx Schema
//!
//! Turns a model's fields into an aligned feature-vector layout.
//!
//! ## Overview
//!
//! Regression-style models multiply a coefficient list against a feature
//! vector. Both sides must agree on which index means what, so the layout
//! is computed once, at compile time, and then reused read-only:
//!
//! 1. [`FieldResolver`] traces every model field back to its raw input and
//!    collects the preprocessing steps on the way
//! 2. [`VectorRange`] gives each field a contiguous slice of the vector and
//!    the rule for filling it
//! 3. [`order_parameters`] walks the fields in sorted name order, places
//!    their ranges and lines the parameter names up against the indices
//! 4. [`Vectorizer`] applies the range list to a live document
//!
//! ```rust
//! use pmmlx_core::{DataDictionary, DataField, DataType, MapDataSource};
//! use pmmlx_schema::{order_parameters, CoefficientCell, FieldResolver, ParameterDeclarations};
//!
//! let dictionary = DataDictionary::new(vec![
//!     DataField::continuous("age", DataType::Double),
//!     DataField::categorical("grade", DataType::String, ["A", "B", "C"]),
//! ]);
//! let resolver = FieldResolver::new(&dictionary, std::iter::empty());
//! let declarations = ParameterDeclarations {
//!     parameters: vec!["p0".into(), "p1".into(), "p2".into()],
//!     cells: vec![
//!         CoefficientCell::continuous("age", "p1"),
//!         CoefficientCell::categorical("grade", "B", "p2"),
//!     ],
//! };
//! let (vectorizer, parameters) = order_parameters(&declarations, &resolver)
//!     .unwrap()
//!     .into_vectorizer()
//!     .unwrap();
//! assert_eq!(vectorizer.size(), parameters.len());
//!
//! let doc = MapDataSource::new().with("age", 40.0).with("grade", "B");
//! let vector = vectorizer.vectorize(&doc).unwrap();
//! assert_eq!(vector.indices(), &[0, 2, 4]);
//! ```
//!
//! ## Layout
//!
//! ```text
//! index:   0      1   2   3      4
//!        ┌─────┬───────────────┬────┐
//!        │ age │ grade (1-of-3)│ p0 │
//!        └─────┴───────────────┴────┘
//!         field ranges, sorted   intercepts, declaration order
//! ```

pub mod resolve;
pub mod range;
pub mod order;
pub mod vectorizer;
pub mod fields;

pub use resolve::{resolve_field, FieldResolver, PreprocessingStep, ResolvedField};
pub use range::{RangeKind, VectorRange};
pub use order::{
    order_parameters, resolve_target_categories, CoefficientCell, OrderedLayout,
    OrderedParameterList, ParameterDeclarations, TargetClasses,
};
pub use vectorizer::Vectorizer;
pub use fields::{FieldExtractor, FieldInput};
