//! Model-family descriptions
//!
//! The model families form a closed set of variants. Families that can show
//! up in a document but have no compiler are kept as opaque payloads so they
//! are rejected at compile time instead of failing to parse.

use serde::{Deserialize, Serialize};
use crate::spec::{DerivedField, MiningFunction, MiningSchema, TransformationDictionary};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ModelSpec {
    GeneralRegressionModel(GeneralRegressionModel),
    RegressionModel(RegressionModel),
    TreeModel(TreeModel),
    NaiveBayesModel(NaiveBayesModel),
    MiningModel(serde_json::Value),
    NeuralNetwork(serde_json::Value),
    SupportVectorMachineModel(serde_json::Value),
    ClusteringModel(serde_json::Value),
}

impl ModelSpec {
    pub fn family(&self) -> &'static str {
        match self {
            ModelSpec::GeneralRegressionModel(_) => "GeneralRegressionModel",
            ModelSpec::RegressionModel(_) => "RegressionModel",
            ModelSpec::TreeModel(_) => "TreeModel",
            ModelSpec::NaiveBayesModel(_) => "NaiveBayesModel",
            ModelSpec::MiningModel(_) => "MiningModel",
            ModelSpec::NeuralNetwork(_) => "NeuralNetwork",
            ModelSpec::SupportVectorMachineModel(_) => "SupportVectorMachineModel",
            ModelSpec::ClusteringModel(_) => "ClusteringModel",
        }
    }

    pub fn model_name(&self) -> Option<&str> {
        match self {
            ModelSpec::GeneralRegressionModel(m) => m.model_name.as_deref(),
            ModelSpec::RegressionModel(m) => m.model_name.as_deref(),
            ModelSpec::TreeModel(m) => m.model_name.as_deref(),
            ModelSpec::NaiveBayesModel(m) => m.model_name.as_deref(),
            _ => None,
        }
    }

    pub fn mining_schema(&self) -> Option<&MiningSchema> {
        match self {
            ModelSpec::GeneralRegressionModel(m) => Some(&m.mining_schema),
            ModelSpec::RegressionModel(m) => Some(&m.mining_schema),
            ModelSpec::TreeModel(m) => Some(&m.mining_schema),
            ModelSpec::NaiveBayesModel(m) => Some(&m.mining_schema),
            _ => None,
        }
    }

    /// Derived fields declared inside the model itself.
    pub fn local_derived_fields(&self) -> &[DerivedField] {
        match self {
            ModelSpec::GeneralRegressionModel(m) => &m.local_transformations.derived_fields,
            ModelSpec::RegressionModel(m) => &m.local_transformations.derived_fields,
            ModelSpec::TreeModel(m) => &m.local_transformations.derived_fields,
            ModelSpec::NaiveBayesModel(m) => &m.local_transformations.derived_fields,
            _ => &[],
        }
    }
}

// ==================== General regression ====================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeneralRegressionModel {
    #[serde(default)]
    pub model_name: Option<String>,
    pub function_name: MiningFunction,
    pub model_type: GeneralModelType,
    #[serde(default)]
    pub distribution: Option<Distribution>,
    #[serde(default)]
    pub link_function: Option<LinkFunction>,
    pub mining_schema: MiningSchema,
    #[serde(default)]
    pub local_transformations: TransformationDictionary,
    /// Declared parameters, in declaration order.
    #[serde(default)]
    pub parameter_list: Vec<Parameter>,
    /// Categorical predictors.
    #[serde(default)]
    pub factor_list: Vec<Predictor>,
    /// Continuous predictors.
    #[serde(default)]
    pub covariate_list: Vec<Predictor>,
    /// Parameter-to-predictor cells.
    #[serde(default)]
    pub pp_matrix: Vec<PPCell>,
    /// Coefficient cells.
    #[serde(default)]
    pub param_matrix: Vec<PCell>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum GeneralModelType {
    Regression,
    GeneralLinear,
    MultinomialLogistic,
    OrdinalMultinomial,
    GeneralizedLinear,
    #[serde(rename = "CoxRegression")]
    CoxRegression,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Distribution {
    Binomial,
    Gamma,
    Igauss,
    Negbin,
    Normal,
    Poisson,
    Tweedie,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LinkFunction {
    Cloglog,
    Identity,
    Log,
    Logc,
    Logit,
    Loglog,
    Negbin,
    Oddspower,
    Power,
    Probit,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Predictor {
    pub name: String,
}

/// Links a parameter to a predictor. For factors `value` is the category,
/// for covariates it is the exponent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PPCell {
    #[serde(default)]
    pub value: Option<String>,
    pub predictor_name: String,
    pub parameter_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PCell {
    #[serde(default)]
    pub target_category: Option<String>,
    pub parameter_name: String,
    pub beta: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub df: Option<f64>,
}

// ==================== Regression ====================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegressionModel {
    #[serde(default)]
    pub model_name: Option<String>,
    pub function_name: MiningFunction,
    #[serde(default)]
    pub normalization_method: RegressionNormalization,
    pub mining_schema: MiningSchema,
    #[serde(default)]
    pub local_transformations: TransformationDictionary,
    #[serde(default)]
    pub regression_tables: Vec<RegressionTable>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RegressionNormalization {
    #[default]
    None,
    Simplemax,
    Softmax,
    Logit,
    Probit,
    Cloglog,
    Exp,
    Loglog,
    Cauchit,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegressionTable {
    #[serde(default)]
    pub intercept: f64,
    #[serde(default)]
    pub target_category: Option<String>,
    #[serde(default)]
    pub numeric_predictors: Vec<NumericPredictor>,
    #[serde(default)]
    pub categorical_predictors: Vec<CategoricalPredictor>,
}

impl RegressionTable {
    pub fn is_empty(&self) -> bool {
        self.numeric_predictors.is_empty() && self.categorical_predictors.is_empty()
    }
}

fn default_exponent() -> i32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NumericPredictor {
    pub name: String,
    #[serde(default = "default_exponent")]
    pub exponent: i32,
    pub coefficient: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoricalPredictor {
    pub name: String,
    pub value: String,
    pub coefficient: f64,
}

// ==================== Tree ====================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TreeModel {
    #[serde(default)]
    pub model_name: Option<String>,
    pub function_name: MiningFunction,
    pub mining_schema: MiningSchema,
    #[serde(default)]
    pub local_transformations: TransformationDictionary,
    #[serde(default)]
    pub no_true_child_strategy: NoTrueChildStrategy,
    pub node: TreeNode,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum NoTrueChildStrategy {
    #[default]
    ReturnNullPrediction,
    ReturnLastPrediction,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub score: Option<String>,
    #[serde(default)]
    pub record_count: Option<f64>,
    pub predicate: Predicate,
    #[serde(default)]
    pub nodes: Vec<TreeNode>,
    #[serde(default)]
    pub score_distributions: Vec<ScoreDistribution>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreDistribution {
    pub value: String,
    pub record_count: f64,
    #[serde(default)]
    pub probability: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Predicate {
    True,
    False,
    SimplePredicate {
        field: String,
        operator: SimpleOperator,
        #[serde(default)]
        value: Option<String>,
    },
    SimpleSetPredicate {
        field: String,
        #[serde(rename = "booleanOperator")]
        boolean_operator: SetOperator,
        array: Vec<String>,
    },
    CompoundPredicate {
        #[serde(rename = "booleanOperator")]
        boolean_operator: CompoundOperator,
        predicates: Vec<Predicate>,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SimpleOperator {
    Equal,
    NotEqual,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
    IsMissing,
    IsNotMissing,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SetOperator {
    IsIn,
    IsNotIn,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CompoundOperator {
    And,
    Or,
    Xor,
    Surrogate,
}

// ==================== Naive Bayes ====================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NaiveBayesModel {
    #[serde(default)]
    pub model_name: Option<String>,
    pub function_name: MiningFunction,
    /// Floor applied to zero or tiny conditional probabilities.
    #[serde(default)]
    pub threshold: f64,
    pub mining_schema: MiningSchema,
    #[serde(default)]
    pub local_transformations: TransformationDictionary,
    #[serde(default)]
    pub bayes_inputs: Vec<BayesInput>,
    pub bayes_output: BayesOutput,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BayesInput {
    pub field_name: String,
    #[serde(default)]
    pub pair_counts: Vec<PairCounts>,
    #[serde(default)]
    pub target_value_stats: Vec<TargetValueStat>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PairCounts {
    pub value: String,
    pub target_value_counts: Vec<TargetValueCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TargetValueCount {
    pub value: String,
    pub count: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TargetValueStat {
    pub value: String,
    pub distribution: ContinuousDistribution,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ContinuousDistribution {
    GaussianDistribution { mean: f64, variance: f64 },
    PoissonDistribution { mean: f64 },
    UniformDistribution { lower: f64, upper: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BayesOutput {
    pub field_name: String,
    pub target_value_counts: Vec<TargetValueCount>,
}
