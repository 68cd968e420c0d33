//! Naive Bayes evaluator
//!
//! Per-class log-likelihood is the log-prior plus one log-conditional per
//! observed input. Conditionals below the model threshold are floored at it.

use std::collections::BTreeMap;
use ahash::AHashMap;
use ordered_float::OrderedFloat;
use pmmlx_core::{
    BayesInput, ContinuousDistribution, DataType, Error, FieldValue, NaiveBayesModel, OpType,
    Result,
};
use pmmlx_schema::{FieldExtractor, FieldInput};
use crate::evaluator::ModelEvaluator;
use crate::explain::Explanation;
use crate::link::{gaussian_log_pdf, softmax_log};

#[derive(Debug, Clone)]
enum Feature {
    Categorical {
        field: String,
        data_type: DataType,
        /// Category key to per-class log-probability.
        log_probs: AHashMap<String, Vec<f64>>,
    },
    Gaussian {
        field: String,
        /// (mean, variance) per class.
        stats: Vec<(f64, f64)>,
    },
}

#[derive(Debug, Clone)]
pub struct NaiveBayes {
    classes: Vec<String>,
    log_priors: Vec<f64>,
    threshold: f64,
    features: Vec<Feature>,
    fields: Vec<String>,
}

impl NaiveBayes {
    pub fn compile(model: &NaiveBayesModel, fields: &FieldExtractor) -> Result<Self> {
        let output = &model.bayes_output;
        if output.target_value_counts.is_empty() {
            return Err(Error::malformed(format!(
                "output '{}' declares no target values",
                output.field_name
            )));
        }
        let classes: Vec<String> = output.target_value_counts.iter().map(|c| c.value.clone()).collect();
        let class_index: AHashMap<&str, usize> = classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect();
        if class_index.len() != classes.len() {
            return Err(Error::malformed("target values are declared more than once"));
        }

        let total: f64 = output.target_value_counts.iter().map(|c| c.count).sum();
        if total <= 0.0 {
            return Err(Error::malformed("target value counts sum to zero"));
        }
        let log_priors = output
            .target_value_counts
            .iter()
            .map(|c| (c.count / total).ln())
            .collect();

        let threshold = model.threshold;
        let features = model
            .bayes_inputs
            .iter()
            .map(|input| compile_feature(input, fields, &class_index, threshold))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            classes,
            log_priors,
            threshold,
            features,
            fields: fields.fields().iter().map(|f| f.name.clone()).collect(),
        })
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Log-likelihood per class, in class declaration order.
    pub fn log_likelihoods(&self, input: &FieldInput) -> Result<Vec<f64>> {
        input.check_fields(self.fields.iter().map(String::as_str))?;

        let mut totals = self.log_priors.clone();
        let floor = self.threshold.ln();
        for feature in &self.features {
            match feature {
                Feature::Categorical { field, data_type, log_probs } => {
                    let Some(value) = input.get(field) else { continue };
                    let per_class = log_probs.get(&value.category_key(*data_type)).ok_or_else(|| {
                        Error::mismatch(format!("'{}' is not a known value of '{}'", value, field))
                    })?;
                    for (total, lp) in totals.iter_mut().zip(per_class) {
                        *total += lp;
                    }
                }
                Feature::Gaussian { field, stats } => {
                    let Some(value) = input.get(field) else { continue };
                    let x = value.as_f64().ok_or_else(|| {
                        Error::mismatch(format!("'{}' is not numeric for '{}'", value, field))
                    })?;
                    for (total, (mean, variance)) in totals.iter_mut().zip(stats) {
                        *total += gaussian_log_pdf(x, *mean, *variance).max(floor);
                    }
                }
            }
        }
        Ok(totals)
    }

    fn argmax(&self, totals: &[f64]) -> usize {
        totals
            .iter()
            .enumerate()
            .max_by(|a, b| OrderedFloat(*a.1).cmp(&OrderedFloat(*b.1)).then(b.0.cmp(&a.0)))
            .map(|(i, _)| i)
            .unwrap_or(0)
    }
}

fn compile_feature(
    input: &BayesInput,
    fields: &FieldExtractor,
    class_index: &AHashMap<&str, usize>,
    threshold: f64,
) -> Result<Feature> {
    let field = fields.field(&input.field_name).ok_or_else(|| {
        Error::malformed(format!("bayes input '{}' is not a resolved field", input.field_name))
    })?;
    let class_of = |value: &str| {
        class_index.get(value).copied().ok_or_else(|| {
            Error::malformed(format!(
                "bayes input '{}' refers to undeclared target value '{}'",
                input.field_name, value
            ))
        })
    };
    let floor = |p: f64| if p < threshold { threshold } else { p };

    if !input.pair_counts.is_empty() {
        let key = |v: &str| FieldValue::from(v).category_key(field.data_type);
        let mut counts: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for pair in &input.pair_counts {
            let per_class = counts
                .entry(key(pair.value.as_str()))
                .or_insert_with(|| vec![0.0; class_index.len()]);
            for tvc in &pair.target_value_counts {
                per_class[class_of(tvc.value.as_str())?] += tvc.count;
            }
        }

        let declared: Vec<String> = if field.optype == OpType::Categorical && !field.categories().is_empty() {
            field.categories().iter().map(|c| key(c.as_str())).collect()
        } else {
            counts.keys().cloned().collect()
        };
        if let Some(unknown) = counts.keys().find(|k| !declared.contains(*k)) {
            return Err(Error::malformed(format!(
                "bayes input '{}' counts undeclared value '{}'",
                input.field_name, unknown
            )));
        }

        let mut class_totals = vec![0.0; class_index.len()];
        for per_class in counts.values() {
            for (total, c) in class_totals.iter_mut().zip(per_class) {
                *total += c;
            }
        }

        let mut log_probs = AHashMap::with_capacity(declared.len());
        for value in declared {
            let per_class = counts.get(&value);
            let probs: Vec<f64> = class_totals
                .iter()
                .enumerate()
                .map(|(class, &total)| {
                    let count = per_class.map(|c| c[class]).unwrap_or(0.0);
                    let p = if total > 0.0 { count / total } else { 0.0 };
                    floor(p).ln()
                })
                .collect();
            log_probs.insert(value, probs);
        }
        return Ok(Feature::Categorical {
            field: field.name.clone(),
            data_type: field.data_type,
            log_probs,
        });
    }

    if !input.target_value_stats.is_empty() {
        let mut stats: Vec<Option<(f64, f64)>> = vec![None; class_index.len()];
        for stat in &input.target_value_stats {
            let class = class_of(stat.value.as_str())?;
            match &stat.distribution {
                ContinuousDistribution::GaussianDistribution { mean, variance } => {
                    if *variance <= 0.0 {
                        return Err(Error::malformed(format!(
                            "bayes input '{}' has non-positive variance for '{}'",
                            input.field_name, stat.value
                        )));
                    }
                    stats[class] = Some((*mean, *variance));
                }
                other => {
                    return Err(Error::unsupported(format!(
                        "bayes input '{}': only gaussian distributions are implemented, got {:?}",
                        input.field_name, other
                    )))
                }
            }
        }
        let stats = stats
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| {
                Error::malformed(format!(
                    "bayes input '{}' lacks statistics for some target values",
                    input.field_name
                ))
            })?;
        return Ok(Feature::Gaussian {
            field: field.name.clone(),
            stats,
        });
    }

    Err(Error::malformed(format!(
        "bayes input '{}' has neither pair counts nor target value statistics",
        input.field_name
    )))
}

impl ModelEvaluator for NaiveBayes {
    type Input = FieldInput;

    fn evaluate(&self, input: &FieldInput) -> Result<String> {
        let totals = self.log_likelihoods(input)?;
        Ok(self.classes[self.argmax(&totals)].clone())
    }

    fn evaluate_debug(&self, input: &FieldInput) -> Result<Explanation> {
        let totals = self.log_likelihoods(input)?;
        let best = self.argmax(&totals);
        let mut explanation = Explanation::new(self.classes[best].clone());
        for (class, ll) in self.classes.iter().zip(&totals) {
            explanation = explanation.with_score(class.clone(), *ll);
        }
        explanation.probs = softmax_log(&explanation.scores);
        Ok(explanation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmmlx_core::{
        BayesOutput, DataDictionary, DataField, MiningField, MiningFunction, MiningSchema,
        PairCounts, TargetValueCount, TargetValueStat,
    };
    use pmmlx_schema::FieldResolver;

    fn tvc(value: &str, count: f64) -> TargetValueCount {
        TargetValueCount { value: value.to_string(), count }
    }

    fn model() -> NaiveBayesModel {
        NaiveBayesModel {
            model_name: None,
            function_name: MiningFunction::Classification,
            threshold: 0.001,
            mining_schema: MiningSchema::new(vec![
                MiningField::active("color"),
                MiningField::active("size"),
                MiningField::target("label"),
            ]),
            local_transformations: Default::default(),
            bayes_inputs: vec![
                BayesInput {
                    field_name: "color".to_string(),
                    pair_counts: vec![
                        PairCounts { value: "red".to_string(), target_value_counts: vec![tvc("a", 8.0), tvc("b", 2.0)] },
                        PairCounts { value: "blue".to_string(), target_value_counts: vec![tvc("a", 2.0), tvc("b", 8.0)] },
                    ],
                    target_value_stats: Vec::new(),
                },
                BayesInput {
                    field_name: "size".to_string(),
                    pair_counts: Vec::new(),
                    target_value_stats: vec![
                        TargetValueStat {
                            value: "a".to_string(),
                            distribution: ContinuousDistribution::GaussianDistribution { mean: 0.0, variance: 1.0 },
                        },
                        TargetValueStat {
                            value: "b".to_string(),
                            distribution: ContinuousDistribution::GaussianDistribution { mean: 10.0, variance: 1.0 },
                        },
                    ],
                },
            ],
            bayes_output: BayesOutput {
                field_name: "label".to_string(),
                target_value_counts: vec![tvc("a", 10.0), tvc("b", 10.0)],
            },
        }
    }

    fn compile(model: &NaiveBayesModel) -> Result<NaiveBayes> {
        let dictionary = DataDictionary::new(vec![
            DataField::categorical("color", DataType::String, ["red", "blue", "green"]),
            DataField::continuous("size", DataType::Double),
        ]);
        let resolver = FieldResolver::new(&dictionary, std::iter::empty());
        let extractor = FieldExtractor::new(
            model.bayes_inputs.iter().map(|i| i.field_name.as_str()),
            &resolver,
        )?;
        NaiveBayes::compile(model, &extractor)
    }

    #[test]
    fn test_categorical_evidence() {
        let nb = compile(&model()).unwrap();
        let input = FieldInput::new().with("color", "red").with_missing("size");
        assert_eq!(nb.evaluate(&input).unwrap(), "a");
        let input = FieldInput::new().with("color", "blue").with_missing("size");
        assert_eq!(nb.evaluate(&input).unwrap(), "b");
    }

    #[test]
    fn test_gaussian_evidence_outweighs() {
        let nb = compile(&model()).unwrap();
        let input = FieldInput::new().with("color", "red").with("size", 9.5);
        assert_eq!(nb.evaluate(&input).unwrap(), "b");
    }

    #[test]
    fn test_debug_probabilities() {
        let nb = compile(&model()).unwrap();
        let input = FieldInput::new().with("color", "red").with_missing("size");
        let explanation = nb.evaluate_debug(&input).unwrap();
        assert!((explanation.probs["a"] - 0.8).abs() < 1e-9);
        assert!((explanation.probs["b"] - 0.2).abs() < 1e-9);
        assert!((explanation.scores["a"] - (0.5f64.ln() + 0.8f64.ln())).abs() < 1e-9);
    }

    #[test]
    fn test_declared_value_without_counts_uses_threshold() {
        let nb = compile(&model()).unwrap();
        let input = FieldInput::new().with("color", "green").with_missing("size");
        let totals = nb.log_likelihoods(&input).unwrap();
        assert!((totals[0] - (0.5f64.ln() + 0.001f64.ln())).abs() < 1e-9);
        // Equal evidence, the first class wins.
        assert_eq!(nb.evaluate(&input).unwrap(), "a");
    }

    #[test]
    fn test_unknown_value_is_mismatch() {
        let nb = compile(&model()).unwrap();
        let input = FieldInput::new().with("color", "purple").with_missing("size");
        assert!(matches!(nb.evaluate(&input), Err(Error::EvaluationMismatch(_))));
    }

    #[test]
    fn test_compile_errors() {
        let mut bad = model();
        bad.bayes_inputs[0].pair_counts[0].target_value_counts[0].value = "z".to_string();
        assert!(matches!(compile(&bad), Err(Error::MalformedSpec(_))));

        let mut bad = model();
        bad.bayes_inputs[1].target_value_stats[0].distribution =
            ContinuousDistribution::PoissonDistribution { mean: 1.0 };
        assert!(matches!(compile(&bad), Err(Error::UnsupportedSpec(_))));

        let mut bad = model();
        bad.bayes_inputs[1].target_value_stats.pop();
        assert!(matches!(compile(&bad), Err(Error::MalformedSpec(_))));
    }
}
