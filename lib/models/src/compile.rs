//! Per-family model compilers
//!
//! Each compiler validates the family's description, builds the input
//! pipeline through the shared field resolver, and hands back a ready
//! [`CompiledModel`]. All failures here are `UnsupportedSpec` or
//! `MalformedSpec`; nothing is deferred to scoring time.

use ahash::{AHashMap, AHashSet};
use pmmlx_core::{
    DataField, Distribution, Error, FieldValue, GeneralModelType, GeneralRegressionModel, LinkFunction,
    MiningFunction, MiningSchema, ModelSpec, NaiveBayesModel, Pmml, RegressionModel,
    RegressionNormalization, RegressionTable, Result, TransformationDictionary, TreeModel,
};
use pmmlx_schema::{
    order_parameters, resolve_target_categories, CoefficientCell, FieldExtractor, FieldResolver,
    ParameterDeclarations, TargetClasses,
};
use tracing::{info, warn};
use crate::naive_bayes::NaiveBayes;
use crate::regression::{LinearModel, LinearSvm, LogisticRegression};
use crate::script::{CompiledModel, Model, Pipeline};
use crate::tree::{tree_fields, DecisionTree};

/// Parameter name given to the intercept of a regression table.
pub const INTERCEPT_PARAMETER: &str = "(intercept)";

/// Compile whichever family `spec` describes.
pub fn compile_spec(pmml: &Pmml, spec: &ModelSpec) -> Result<CompiledModel> {
    match spec {
        ModelSpec::GeneralRegressionModel(model) => compile_general_regression(pmml, model),
        ModelSpec::RegressionModel(model) => compile_regression(pmml, model),
        ModelSpec::TreeModel(model) => compile_tree(pmml, model),
        ModelSpec::NaiveBayesModel(model) => compile_naive_bayes(pmml, model),
        other => Err(Error::unsupported(format!(
            "model family {} is not implemented",
            other.family()
        ))),
    }
}

fn resolver<'a>(
    pmml: &'a Pmml,
    mining_schema: &'a MiningSchema,
    local: &'a TransformationDictionary,
) -> FieldResolver<'a> {
    // Local derived fields shadow global ones of the same name.
    let derived = pmml
        .transformation_dictionary
        .derived_fields
        .iter()
        .chain(local.derived_fields.iter());
    FieldResolver::new(&pmml.data_dictionary, derived).with_mining_schema(mining_schema)
}

fn target_field<'a>(pmml: &'a Pmml, mining_schema: &MiningSchema) -> Result<&'a DataField> {
    let name = mining_schema
        .target_field()
        .ok_or_else(|| Error::malformed("mining schema declares no target field"))?;
    pmml.data_dictionary
        .field(name)
        .ok_or_else(|| Error::malformed(format!("target field '{}' is not in the data dictionary", name)))
}

fn require_classification(function: MiningFunction, family: &str) -> Result<()> {
    if function != MiningFunction::Classification {
        return Err(Error::unsupported(format!(
            "{} with function {:?} is not implemented; only classification is",
            family, function
        )));
    }
    Ok(())
}

/// Binary logistic regression from a general regression model.
pub fn compile_general_regression(
    pmml: &Pmml,
    model: &GeneralRegressionModel,
) -> Result<CompiledModel> {
    require_classification(model.function_name, "GeneralRegressionModel")?;
    let logistic = match model.model_type {
        GeneralModelType::MultinomialLogistic => true,
        GeneralModelType::GeneralizedLinear => {
            model.distribution == Some(Distribution::Binomial)
                && model.link_function == Some(LinkFunction::Logit)
        }
        _ => false,
    };
    if !logistic {
        return Err(Error::unsupported(format!(
            "general regression of type {:?} (distribution {:?}, link {:?}) is not implemented",
            model.model_type, model.distribution, model.link_function
        )));
    }

    let factors: AHashSet<&str> = model.factor_list.iter().map(|p| p.name.as_str()).collect();
    let covariates: AHashSet<&str> = model.covariate_list.iter().map(|p| p.name.as_str()).collect();

    let mut cells = Vec::with_capacity(model.pp_matrix.len());
    for cell in &model.pp_matrix {
        let predictor = cell.predictor_name.as_str();
        if factors.contains(predictor) {
            let value = cell.value.as_deref().ok_or_else(|| {
                Error::malformed(format!(
                    "cell for factor '{}' names no category",
                    predictor
                ))
            })?;
            cells.push(CoefficientCell::categorical(predictor, value, cell.parameter_name.as_str()));
        } else if covariates.contains(predictor) {
            if let Some(exponent) = cell.value.as_deref() {
                if exponent.trim().parse::<f64>().ok() != Some(1.0) {
                    return Err(Error::unsupported(format!(
                        "covariate '{}' raised to power '{}'; only linear terms are implemented",
                        predictor, exponent
                    )));
                }
            }
            cells.push(CoefficientCell::continuous(predictor, cell.parameter_name.as_str()));
        } else {
            return Err(Error::malformed(format!(
                "cell names '{}', which is neither a factor nor a covariate",
                predictor
            )));
        }
    }

    for predictor in model.factor_list.iter().chain(&model.covariate_list) {
        if !model.pp_matrix.iter().any(|c| c.predictor_name == predictor.name) {
            warn!(predictor = %predictor.name, "Predictor has no coefficient cells, skipping");
        }
    }

    let declarations = ParameterDeclarations {
        parameters: model.parameter_list.iter().map(|p| p.name.clone()).collect(),
        cells,
    };
    let resolver = resolver(pmml, &model.mining_schema, &model.local_transformations);
    let layout = order_parameters(&declarations, &resolver)?;

    let mut betas: AHashMap<String, f64> = AHashMap::with_capacity(model.param_matrix.len());
    for cell in &model.param_matrix {
        if cell.target_category.is_none() {
            return Err(Error::malformed(format!(
                "coefficient for '{}' names no target category",
                cell.parameter_name
            )));
        }
        if !declarations.parameters.contains(&cell.parameter_name) {
            return Err(Error::malformed(format!(
                "coefficient names undeclared parameter '{}'",
                cell.parameter_name
            )));
        }
        if betas.insert(cell.parameter_name.clone(), cell.beta).is_some() {
            return Err(Error::unsupported(format!(
                "parameter '{}' has more than one coefficient; only binary classification is implemented",
                cell.parameter_name
            )));
        }
    }

    let target = target_field(pmml, &model.mining_schema)?;
    let classes = resolve_target_categories(
        model.param_matrix.iter().filter_map(|c| c.target_category.as_deref()),
        target,
    )?;

    let coefficients = layout.parameters.coefficients(&betas);
    let (vectorizer, parameters) = layout.into_vectorizer()?;
    info!(
        model = model.model_name.as_deref().unwrap_or("-"),
        size = vectorizer.size(),
        positive = %classes.positive,
        "Compiled logistic regression"
    );

    let linear = LinearModel::new(coefficients, 0.0, classes).with_parameters(parameters);
    Ok(CompiledModel::new(
        model.model_name.clone(),
        Pipeline::Vector(vectorizer),
        Model::LogisticRegression(LogisticRegression::new(linear)),
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinearKind {
    Logistic,
    Svm,
}

/// Validate the table pair and pick the classes. Returns the modeled table.
fn regression_table<'a>(
    pmml: &Pmml,
    model: &'a RegressionModel,
) -> Result<(LinearKind, &'a RegressionTable, TargetClasses)> {
    require_classification(model.function_name, "RegressionModel")?;
    let kind = match model.normalization_method {
        RegressionNormalization::Logit => LinearKind::Logistic,
        RegressionNormalization::None => LinearKind::Svm,
        other => {
            return Err(Error::unsupported(format!(
                "regression normalization {:?} is not implemented",
                other
            )))
        }
    };

    let [table, rest] = model.regression_tables.as_slice() else {
        return Err(Error::unsupported(format!(
            "{} regression tables; only binary classification is implemented",
            model.regression_tables.len()
        )));
    };
    if !rest.is_empty() || rest.intercept != 0.0 {
        return Err(Error::unsupported(
            "second regression table carries terms; only one modeled class is implemented",
        ));
    }
    let positive = table
        .target_category
        .clone()
        .ok_or_else(|| Error::malformed("regression table names no target category"))?;

    let target = target_field(pmml, &model.mining_schema)?;
    if let Some(negative) = &rest.target_category {
        if *negative == positive {
            return Err(Error::malformed(format!(
                "both regression tables model category '{}'",
                positive
            )));
        }
    }
    let classes = resolve_target_categories([positive.as_str()], target)?;
    if let Some(negative) = &rest.target_category {
        let key = |value: &str| FieldValue::from(value).category_key(target.data_type);
        if key(negative) != key(&classes.negative) {
            return Err(Error::malformed(format!(
                "second regression table names '{}', which is not the complement of '{}' on '{}'",
                negative, positive, target.name
            )));
        }
    }
    Ok((kind, table, classes))
}

fn linear_model(kind: LinearKind, linear: LinearModel) -> Model {
    match kind {
        LinearKind::Logistic => Model::LogisticRegression(LogisticRegression::new(linear)),
        LinearKind::Svm => Model::LinearSvm(LinearSvm::new(linear)),
    }
}

fn check_exponents(table: &RegressionTable) -> Result<()> {
    if let Some(p) = table.numeric_predictors.iter().find(|p| p.exponent != 1) {
        return Err(Error::unsupported(format!(
            "predictor '{}' has exponent {}; only linear terms are implemented",
            p.name, p.exponent
        )));
    }
    Ok(())
}

/// Logistic regression or linear SVM from a regression model whose inputs
/// come from document fields.
pub fn compile_regression(pmml: &Pmml, model: &RegressionModel) -> Result<CompiledModel> {
    let (kind, table, classes) = regression_table(pmml, model)?;
    check_exponents(table)?;

    let mut parameters = Vec::new();
    let mut cells = Vec::new();
    let mut betas = AHashMap::new();
    for predictor in &table.numeric_predictors {
        let parameter = predictor.name.clone();
        cells.push(CoefficientCell::continuous(predictor.name.as_str(), parameter.as_str()));
        betas.insert(parameter.clone(), predictor.coefficient);
        parameters.push(parameter);
    }
    for predictor in &table.categorical_predictors {
        let parameter = format!("{}={}", predictor.name, predictor.value);
        cells.push(CoefficientCell::categorical(
            predictor.name.as_str(),
            predictor.value.as_str(),
            parameter.as_str(),
        ));
        betas.insert(parameter.clone(), predictor.coefficient);
        parameters.push(parameter);
    }
    parameters.push(INTERCEPT_PARAMETER.to_string());
    betas.insert(INTERCEPT_PARAMETER.to_string(), table.intercept);

    let resolver = resolver(pmml, &model.mining_schema, &model.local_transformations);
    let layout = order_parameters(&ParameterDeclarations { parameters, cells }, &resolver)?;
    let coefficients = layout.parameters.coefficients(&betas);
    let (vectorizer, parameters) = layout.into_vectorizer()?;
    info!(
        model = model.model_name.as_deref().unwrap_or("-"),
        kind = ?kind,
        size = vectorizer.size(),
        "Compiled regression model"
    );

    let linear = LinearModel::new(coefficients, 0.0, classes).with_parameters(parameters);
    Ok(CompiledModel::new(
        model.model_name.clone(),
        Pipeline::Vector(vectorizer),
        linear_model(kind, linear),
    ))
}

/// A regression model scored against vectors the caller builds.
///
/// Coefficients follow the declaration order of the numeric predictors and
/// the intercept is kept apart from the vector.
pub fn compile_regression_precomputed(pmml: &Pmml, model: &RegressionModel) -> Result<CompiledModel> {
    let (kind, table, classes) = regression_table(pmml, model)?;
    if !table.categorical_predictors.is_empty() {
        return Err(Error::unsupported(
            "categorical predictors cannot be scored against a pre-computed vector",
        ));
    }
    check_exponents(table)?;

    let coefficients: Vec<f64> = table.numeric_predictors.iter().map(|p| p.coefficient).collect();
    let size = coefficients.len();
    info!(
        model = model.model_name.as_deref().unwrap_or("-"),
        kind = ?kind,
        size,
        "Compiled pre-computed regression model"
    );

    let linear = LinearModel::new(coefficients, table.intercept, classes);
    Ok(CompiledModel::new(
        model.model_name.clone(),
        Pipeline::Precomputed { size },
        linear_model(kind, linear),
    ))
}

pub fn compile_tree(pmml: &Pmml, model: &TreeModel) -> Result<CompiledModel> {
    require_classification(model.function_name, "TreeModel")?;
    let resolver = resolver(pmml, &model.mining_schema, &model.local_transformations);
    let extractor = FieldExtractor::new(tree_fields(&model.node), &resolver)?;
    let tree = DecisionTree::compile(&model.node, &extractor, model.no_true_child_strategy)?;
    info!(
        model = model.model_name.as_deref().unwrap_or("-"),
        nodes = tree.node_count(),
        fields = extractor.fields().len(),
        "Compiled decision tree"
    );
    Ok(CompiledModel::new(
        model.model_name.clone(),
        Pipeline::Fields(extractor),
        Model::DecisionTree(tree),
    ))
}

pub fn compile_naive_bayes(pmml: &Pmml, model: &NaiveBayesModel) -> Result<CompiledModel> {
    require_classification(model.function_name, "NaiveBayesModel")?;
    let resolver = resolver(pmml, &model.mining_schema, &model.local_transformations);
    let extractor = FieldExtractor::new(
        model.bayes_inputs.iter().map(|input| input.field_name.as_str()),
        &resolver,
    )?;
    let bayes = NaiveBayes::compile(model, &extractor)?;
    info!(
        model = model.model_name.as_deref().unwrap_or("-"),
        classes = bayes.classes().len(),
        fields = extractor.fields().len(),
        "Compiled naive bayes"
    );
    Ok(CompiledModel::new(
        model.model_name.clone(),
        Pipeline::Fields(extractor),
        Model::NaiveBayes(bayes),
    ))
}
