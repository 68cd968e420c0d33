//! # pmmlx Models
//!
//! Compilers and evaluators for the supported model families.
//!
//! ## Families
//!
//! - **Logistic regression**: from a general regression model
//!   (`multinomialLogistic`, or `generalizedLinear` with a binomial
//!   distribution and logit link) or a regression model with `logit`
//!   normalization
//! - **Linear SVM**: a regression model without normalization
//! - **Decision tree**: classification trees over simple, set and compound
//!   predicates
//! - **Naive Bayes**: categorical pair counts and Gaussian continuous inputs
//!
//! ## Example
//!
//! ```rust
//! use pmmlx_models::{ScriptEngine, ScriptParams, ScriptOutput};
//! use serde_json::json;
//!
//! let source = json!({
//!     "dataDictionary": {"dataFields": [
//!         {"name": "x", "optype": "continuous", "dataType": "double"},
//!         {"name": "y", "optype": "categorical", "dataType": "string", "values": ["lo", "hi"]}
//!     ]},
//!     "models": [{"RegressionModel": {
//!         "functionName": "classification",
//!         "normalizationMethod": "logit",
//!         "miningSchema": {"miningFields": [{"name": "x"}, {"name": "y", "usageType": "target"}]},
//!         "regressionTables": [
//!             {"intercept": -1.0, "targetCategory": "hi",
//!              "numericPredictors": [{"name": "x", "coefficient": 1.0}]},
//!             {"intercept": 0.0}
//!         ]
//!     }}]
//! })
//! .to_string();
//!
//! let model = ScriptEngine::new().compile_str(&source).unwrap();
//! let output = model.run(&json!({"x": 3.0}), &ScriptParams::label_only()).unwrap();
//! assert_eq!(output, ScriptOutput::Label("hi".to_string()));
//! ```

pub mod link;
pub mod explain;
pub mod evaluator;
pub mod regression;
pub mod predicate;
pub mod tree;
pub mod naive_bayes;
pub mod compile;
pub mod script;
pub mod engine;
pub mod registry;

pub use explain::Explanation;
pub use evaluator::ModelEvaluator;
pub use regression::{LinearModel, LinearSvm, LogisticRegression};
pub use predicate::{Comparison, Condition};
pub use tree::{tree_fields, DecisionTree};
pub use naive_bayes::NaiveBayes;
pub use compile::{
    compile_general_regression, compile_naive_bayes, compile_regression,
    compile_regression_precomputed, compile_spec, compile_tree, INTERCEPT_PARAMETER,
};
pub use script::{CompiledModel, Model, Pipeline, ScriptOutput, ScriptParams};
pub use engine::ScriptEngine;
pub use registry::ModelRegistry;
