//! Script engine entry point
//!
//! [`ScriptEngine`] is the value a host registers under [`ScriptEngine::NAME`]
//! to turn model documents into [`CompiledModel`]s.

use pmmlx_core::{Error, ModelSpec, Pmml, Result};
use tracing::debug;
use crate::compile::{compile_regression_precomputed, compile_spec};
use crate::script::CompiledModel;

#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptEngine;

impl ScriptEngine {
    /// Language name a host selects this engine by.
    pub const NAME: &'static str = "pmml_model";

    pub fn new() -> Self {
        Self
    }

    pub fn name(&self) -> &'static str {
        Self::NAME
    }

    pub fn parse(&self, source: &str) -> Result<Pmml> {
        Pmml::from_json_str(source)
    }

    /// Compile the document's only model.
    pub fn compile(&self, pmml: &Pmml) -> Result<CompiledModel> {
        match pmml.models.len() {
            0 => Err(Error::malformed("document contains no model")),
            1 => self.compile_model(pmml, 0),
            n => Err(Error::unsupported(format!(
                "document contains {} models; only single-model documents are implemented",
                n
            ))),
        }
    }

    /// Compile one model of a multi-model document.
    pub fn compile_model(&self, pmml: &Pmml, index: usize) -> Result<CompiledModel> {
        let spec = pmml.models.get(index).ok_or_else(|| {
            Error::malformed(format!(
                "model index {} out of range for {} models",
                index,
                pmml.models.len()
            ))
        })?;
        debug!(index, family = spec.family(), "Compiling model");
        compile_spec(pmml, spec)
    }

    /// Compile the document's regression model for pre-computed vectors.
    pub fn compile_precomputed(&self, pmml: &Pmml, index: usize) -> Result<CompiledModel> {
        match pmml.models.get(index) {
            Some(ModelSpec::RegressionModel(model)) => compile_regression_precomputed(pmml, model),
            Some(other) => Err(Error::unsupported(format!(
                "pre-computed vectors are only implemented for RegressionModel, not {}",
                other.family()
            ))),
            None => Err(Error::malformed(format!("no model at index {}", index))),
        }
    }

    pub fn compile_str(&self, source: &str) -> Result<CompiledModel> {
        let pmml = self.parse(source)?;
        self.compile(&pmml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree_document(models: usize) -> Pmml {
        let tree = json!({"TreeModel": {
            "functionName": "classification",
            "miningSchema": {"miningFields": [{"name": "x"}, {"name": "y", "usageType": "target"}]},
            "node": {"predicate": "True", "score": "a", "nodes": [
                {"predicate": {"SimplePredicate": {"field": "x", "operator": "lessThan", "value": "0"}},
                 "score": "b"}
            ]}
        }});
        let models = vec![tree; models];
        serde_json::from_value(json!({
            "dataDictionary": {"dataFields": [
                {"name": "x", "optype": "continuous", "dataType": "double"},
                {"name": "y", "optype": "categorical", "dataType": "string", "values": ["a", "b"]}
            ]},
            "models": models
        }))
        .unwrap()
    }

    #[test]
    fn test_single_model_only() {
        let engine = ScriptEngine::new();
        assert!(engine.compile(&tree_document(1)).is_ok());
        assert!(matches!(engine.compile(&tree_document(2)), Err(Error::UnsupportedSpec(_))));
        assert!(matches!(engine.compile(&tree_document(0)), Err(Error::MalformedSpec(_))));
        assert!(engine.compile_model(&tree_document(2), 1).is_ok());
        assert!(engine.compile_model(&tree_document(2), 2).is_err());
    }

    #[test]
    fn test_precomputed_requires_regression() {
        let engine = ScriptEngine::new();
        assert!(matches!(
            engine.compile_precomputed(&tree_document(1), 0),
            Err(Error::UnsupportedSpec(_))
        ));
    }

    #[test]
    fn test_compile_str() {
        let engine = ScriptEngine::new();
        assert_eq!(engine.name(), "pmml_model");
        let source = serde_json::to_string(&tree_document(1)).unwrap();
        let model = engine.compile_str(&source).unwrap();
        assert_eq!(model.score(&json!({"x": -1.0})).unwrap(), "b");
        assert!(matches!(engine.compile_str("{"), Err(Error::Serialization(_))));
    }
}
