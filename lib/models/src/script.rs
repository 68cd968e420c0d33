//! Runtime evaluation façade
//!
//! A [`CompiledModel`] pairs an input pipeline (vectorizer, field extractor,
//! or a pre-computed vector) with the evaluator that consumes it. It is
//! built once and then only read, so a single instance can be shared
//! across scoring threads behind an `Arc`.

use pmmlx_core::{DataSource, Error, FeatureVector, Result};
use pmmlx_schema::{FieldExtractor, FieldInput, Vectorizer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::evaluator::ModelEvaluator;
use crate::explain::Explanation;
use crate::naive_bayes::NaiveBayes;
use crate::regression::{LinearSvm, LogisticRegression};
use crate::tree::DecisionTree;

/// The closed set of model families.
#[derive(Debug, Clone)]
pub enum Model {
    LogisticRegression(LogisticRegression),
    LinearSvm(LinearSvm),
    DecisionTree(DecisionTree),
    NaiveBayes(NaiveBayes),
}

impl Model {
    pub fn kind(&self) -> &'static str {
        match self {
            Model::LogisticRegression(_) => "logistic_regression",
            Model::LinearSvm(_) => "linear_svm",
            Model::DecisionTree(_) => "decision_tree",
            Model::NaiveBayes(_) => "naive_bayes",
        }
    }
}

/// How a document becomes model input.
#[derive(Debug, Clone)]
pub enum Pipeline {
    Vector(Vectorizer),
    Fields(FieldExtractor),
    /// The caller supplies the vector; only its size is known.
    Precomputed { size: usize },
}

enum Prepared {
    Vector(FeatureVector),
    Fields(FieldInput),
}

/// Per-request script variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptParams {
    /// Return the debug record instead of the bare label.
    #[serde(default = "default_debug")]
    pub debug: bool,
}

fn default_debug() -> bool {
    true
}

impl Default for ScriptParams {
    fn default() -> Self {
        Self { debug: default_debug() }
    }
}

impl ScriptParams {
    pub fn label_only() -> Self {
        Self { debug: false }
    }

    /// Read the host's variables map; an absent map gives the defaults.
    pub fn from_vars(vars: &Value) -> Result<Self> {
        if vars.is_null() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_value(vars.clone())?)
    }
}

/// A label, or the debug record when requested.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScriptOutput {
    Label(String),
    Debug(Explanation),
}

impl ScriptOutput {
    pub fn class(&self) -> &str {
        match self {
            ScriptOutput::Label(label) => label,
            ScriptOutput::Debug(explanation) => &explanation.class,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompiledModel {
    name: Option<String>,
    pipeline: Pipeline,
    model: Model,
}

impl CompiledModel {
    pub fn new(name: Option<String>, pipeline: Pipeline, model: Model) -> Self {
        Self { name, pipeline, model }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Feature vector size for vector-consuming models.
    pub fn vector_size(&self) -> Option<usize> {
        match &self.pipeline {
            Pipeline::Vector(vectorizer) => Some(vectorizer.size()),
            Pipeline::Precomputed { size } => Some(*size),
            Pipeline::Fields(_) => None,
        }
    }

    pub fn is_precomputed(&self) -> bool {
        matches!(self.pipeline, Pipeline::Precomputed { .. })
    }

    fn prepare<S: DataSource + ?Sized>(&self, source: &S) -> Result<Prepared> {
        match &self.pipeline {
            Pipeline::Vector(vectorizer) => Ok(Prepared::Vector(vectorizer.vectorize(source)?)),
            Pipeline::Fields(extractor) => Ok(Prepared::Fields(extractor.extract(source)?)),
            Pipeline::Precomputed { .. } => Err(Error::mismatch(
                "model scores pre-computed vectors, not document fields",
            )),
        }
    }

    fn evaluate(&self, input: &Prepared) -> Result<String> {
        match (&self.model, input) {
            (Model::LogisticRegression(m), Prepared::Vector(v)) => m.evaluate(v),
            (Model::LinearSvm(m), Prepared::Vector(v)) => m.evaluate(v),
            (Model::DecisionTree(m), Prepared::Fields(f)) => m.evaluate(f),
            (Model::NaiveBayes(m), Prepared::Fields(f)) => m.evaluate(f),
            _ => Err(self.wrong_input()),
        }
    }

    fn evaluate_debug(&self, input: &Prepared) -> Result<Explanation> {
        match (&self.model, input) {
            (Model::LogisticRegression(m), Prepared::Vector(v)) => m.evaluate_debug(v),
            (Model::LinearSvm(m), Prepared::Vector(v)) => m.evaluate_debug(v),
            (Model::DecisionTree(m), Prepared::Fields(f)) => m.evaluate_debug(f),
            (Model::NaiveBayes(m), Prepared::Fields(f)) => m.evaluate_debug(f),
            _ => Err(self.wrong_input()),
        }
    }

    fn wrong_input(&self) -> Error {
        Error::mismatch(format!("input kind does not fit a {} model", self.model.kind()))
    }

    /// Label for one document.
    pub fn score<S: DataSource + ?Sized>(&self, source: &S) -> Result<String> {
        let input = self.prepare(source)?;
        self.evaluate(&input)
    }

    pub fn score_debug<S: DataSource + ?Sized>(&self, source: &S) -> Result<Explanation> {
        let input = self.prepare(source)?;
        self.evaluate_debug(&input)
    }

    /// Label for a vector built elsewhere.
    pub fn score_vector(&self, vector: &FeatureVector) -> Result<String> {
        self.evaluate(&Prepared::Vector(vector.clone()))
    }

    pub fn score_vector_debug(&self, vector: &FeatureVector) -> Result<Explanation> {
        self.evaluate_debug(&Prepared::Vector(vector.clone()))
    }

    /// Score a JSON document the way a host script call does. Pre-computed
    /// models read it as an `{"indices", "values"}` payload.
    pub fn run(&self, document: &Value, params: &ScriptParams) -> Result<ScriptOutput> {
        let input = match &self.pipeline {
            Pipeline::Precomputed { size } => {
                Prepared::Vector(FeatureVector::from_payload(document, *size)?)
            }
            _ => self.prepare(document)?,
        };
        if params.debug {
            Ok(ScriptOutput::Debug(self.evaluate_debug(&input)?))
        } else {
            Ok(ScriptOutput::Label(self.evaluate(&input)?))
        }
    }
}
