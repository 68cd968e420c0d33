//! # pmmlx Core
//!
//! Core types shared by the compiler and the evaluators.
//!
//! - [`Pmml`] - The in-memory model-spec tree (data dictionary,
//!   transformation dictionary, model descriptions)
//! - [`ModelSpec`] - Closed set of model-family descriptions
//! - [`FieldValue`] - A typed field value or spec literal
//! - [`FeatureVector`] - Sparse feature vector with strictly ascending indices
//! - [`DataSource`] - Per-document field access
//! - [`Error`] - The three-way failure taxonomy
//!
//! ## Example
//!
//! ```rust
//! use pmmlx_core::{FeatureVector, FieldValue, MapDataSource, DataSource};
//!
//! let vector = FeatureVector::from_parts(4, vec![1, 3], vec![1.0, 0.5]).unwrap();
//! assert_eq!(vector.get(3), 0.5);
//!
//! let doc = MapDataSource::new().with("age", 39.0);
//! assert_eq!(doc.get("age"), vec![FieldValue::Double(39.0)]);
//! ```

pub mod error;
pub mod value;
pub mod vector;
pub mod source;
pub mod spec;
pub mod model_spec;

pub use error::{Error, Result};
pub use value::FieldValue;
pub use vector::{FeatureVector, FeatureVectorBuilder};
pub use source::{DataSource, MapDataSource};
pub use spec::{
    DataDictionary, DataField, DataType, DerivedField, Expression, MiningField,
    MiningFunction, MiningSchema, OpType, Pmml, TransformationDictionary, UsageType,
};
pub use model_spec::{
    BayesInput, BayesOutput, CategoricalPredictor, CompoundOperator, ContinuousDistribution,
    Distribution, GeneralModelType, GeneralRegressionModel, LinkFunction, ModelSpec,
    NaiveBayesModel, NoTrueChildStrategy,
    NumericPredictor, PCell, PPCell, PairCounts, Parameter, Predicate, Predictor,
    RegressionModel, RegressionNormalization, RegressionTable, ScoreDistribution,
    SetOperator, SimpleOperator, TargetValueCount, TargetValueStat, TreeModel, TreeNode,
};
