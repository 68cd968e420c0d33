//! # pmmlx
//!
//! Compiles declarative predictive-model documents into scoring pipelines
//! that run once per input document.
//!
//! A document describes its input fields, optional derived fields and one
//! model. Compilation validates everything up front: the field graph is
//! resolved, regression coefficients are aligned against a feature-vector
//! layout, and tree and Bayes inputs are typed. The compiled model is
//! immutable and can be shared across threads.
//!
//! ## Quick Start
//!
//! ```rust
//! use pmmlx::prelude::*;
//! use serde_json::json;
//!
//! let source = json!({
//!     "dataDictionary": {"dataFields": [
//!         {"name": "age", "optype": "continuous", "dataType": "double"},
//!         {"name": "risk", "optype": "categorical", "dataType": "string", "values": ["low", "high"]}
//!     ]},
//!     "models": [{"TreeModel": {
//!         "functionName": "classification",
//!         "miningSchema": {"miningFields": [
//!             {"name": "age"}, {"name": "risk", "usageType": "target"}
//!         ]},
//!         "node": {"predicate": "True", "score": "low", "nodes": [
//!             {"predicate": {"SimplePredicate": {"field": "age", "operator": "greaterThan", "value": "65"}},
//!              "score": "high"}
//!         ]}
//!     }}]
//! })
//! .to_string();
//!
//! let model = ScriptEngine::new().compile_str(&source).unwrap();
//! assert_eq!(model.score(&json!({"age": 70})).unwrap(), "high");
//! ```
//!
//! ## Crate Structure
//!
//! - [`pmmlx-core`](https://docs.rs/pmmlx-core) - Model-spec tree, field values, sparse vectors, errors
//! - [`pmmlx-schema`](https://docs.rs/pmmlx-schema) - Field resolution, vector layout, parameter ordering
//! - [`pmmlx-models`](https://docs.rs/pmmlx-models) - Per-family compilers, evaluators, engine and registry

// Re-export core types
pub use pmmlx_core::{
    DataSource, Error, FeatureVector, FieldValue, MapDataSource, ModelSpec, Pmml, Result,
};

// Re-export schema
pub use pmmlx_schema::{
    order_parameters, resolve_target_categories, FieldExtractor, FieldInput, FieldResolver,
    OrderedParameterList, TargetClasses, VectorRange, Vectorizer,
};

// Re-export models
pub use pmmlx_models::{
    CompiledModel, Explanation, Model, ModelEvaluator, ModelRegistry, ScriptEngine, ScriptOutput,
    ScriptParams,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        CompiledModel, DataSource, Error, Explanation, FeatureVector, MapDataSource,
        ModelRegistry, Pmml, Result, ScriptEngine, ScriptOutput, ScriptParams,
    };
}
