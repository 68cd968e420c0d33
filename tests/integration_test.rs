// Integration tests for pmmlx
use pmmlx::prelude::*;
use pmmlx_core::{
    DataDictionary, DataField, DataType, DerivedField, MiningField, OpType, TransformationDictionary,
};
use pmmlx_models::Pipeline;
use rand::Rng;
use rayon::prelude::*;
use serde_json::{json, Value};
use std::io::Write;
use std::sync::Arc;

fn fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("cannot read {}: {}", path, e))
}

fn rows(name: &str) -> Vec<Value> {
    fixture(name)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn logistic_document(covariates: &[(&str, f64)], intercept: f64) -> Value {
    let mut fields: Vec<Value> = covariates
        .iter()
        .map(|(name, _)| json!({"name": name, "optype": "continuous", "dataType": "double"}))
        .collect();
    fields.push(json!({"name": "y", "optype": "categorical", "dataType": "string", "values": ["no", "yes"]}));

    let mut mining: Vec<Value> = covariates.iter().map(|(name, _)| json!({"name": name})).collect();
    mining.push(json!({"name": "y", "usageType": "target"}));

    let mut parameters = vec![json!({"name": "p0"})];
    let mut pp = Vec::new();
    let mut betas = vec![json!({"targetCategory": "yes", "parameterName": "p0", "beta": intercept})];
    for (i, (name, beta)) in covariates.iter().enumerate() {
        let parameter = format!("p{}", i + 1);
        parameters.push(json!({"name": parameter}));
        pp.push(json!({"predictorName": name, "parameterName": parameter, "value": "1"}));
        betas.push(json!({"targetCategory": "yes", "parameterName": parameter, "beta": beta}));
    }

    json!({
        "dataDictionary": {"dataFields": fields},
        "models": [{"GeneralRegressionModel": {
            "functionName": "classification",
            "modelType": "multinomialLogistic",
            "miningSchema": {"miningFields": mining},
            "parameterList": parameters,
            "covariateList": covariates.iter().map(|(name, _)| json!({"name": name})).collect::<Vec<_>>(),
            "ppMatrix": pp,
            "paramMatrix": betas
        }}]
    })
}

fn compile(document: &Value) -> CompiledModel {
    let pmml: Pmml = serde_json::from_value(document.clone()).unwrap();
    ScriptEngine::new().compile(&pmml).unwrap()
}

#[test]
fn test_tree_reference_dataset() {
    let model = ScriptEngine::new().compile_str(&fixture("income_tree.json")).unwrap();
    let expected: Vec<String> = fixture("income_expected.txt").lines().map(str::to_string).collect();
    let documents = rows("income_rows.jsonl");
    assert_eq!(documents.len(), expected.len());

    for (i, (document, label)) in documents.iter().zip(&expected).enumerate() {
        let scored = model.score(document).unwrap();
        assert_eq!(&scored, label, "row {} scored {} instead of {}", i, scored, label);
    }
}

#[test]
fn test_tree_debug_path() {
    let model = ScriptEngine::new().compile_str(&fixture("income_tree.json")).unwrap();
    let documents = rows("income_rows.jsonl");
    let ScriptOutput::Debug(explanation) = model.run(&documents[1], &ScriptParams::default()).unwrap() else {
        panic!("debug output expected");
    };
    assert_eq!(explanation.path, vec!["root", "educated", "short_hours"]);
    assert!((explanation.probs["<=50K"] - 0.55).abs() < 1e-12);
}

#[test]
fn test_logistic_matches_sigmoid() {
    let mut rng = rand::rng();
    let names = ["x0", "x1", "x2", "x3", "x4", "x5", "x6", "x7"];
    for _ in 0..20 {
        let covariates: Vec<(&str, f64)> =
            names.iter().map(|&n| (n, rng.random_range(-2.0..2.0))).collect();
        let intercept = rng.random_range(-1.0..1.0);
        let model = compile(&logistic_document(&covariates, intercept));

        let mut document = serde_json::Map::new();
        let mut score = intercept;
        for (name, beta) in &covariates {
            let x: f64 = rng.random_range(-3.0..3.0);
            document.insert(name.to_string(), json!(x));
            score += beta * x;
        }
        let expected = 1.0 / (1.0 + (-score).exp());
        let explanation = model.score_debug(&Value::Object(document)).unwrap();
        assert!((explanation.probs["yes"] - expected).abs() < 1e-7);
        assert_eq!(explanation.class, if expected >= 0.5 { "yes" } else { "no" });
    }
}

#[test]
fn test_unit_vectors_match_sigmoid() {
    let mut rng = rand::rng();
    let names = ["x0", "x1", "x2", "x3", "x4", "x5"];
    let covariates: Vec<(&str, f64)> =
        names.iter().map(|&n| (n, rng.random_range(-2.0..2.0))).collect();
    let intercept = rng.random_range(-1.0..1.0);
    let model = compile(&logistic_document(&covariates, intercept));
    // one slot per covariate, sorted by name, then the intercept
    assert_eq!(model.vector_size(), Some(names.len() + 1));

    for (i, (name, beta)) in covariates.iter().enumerate() {
        let expected = 1.0 / (1.0 + (-(beta + intercept)).exp());

        let document: serde_json::Map<String, Value> = names
            .iter()
            .map(|&n| (n.to_string(), json!(if n == *name { 1.0 } else { 0.0 })))
            .collect();
        let explanation = model.score_debug(&Value::Object(document)).unwrap();
        assert!((explanation.probs["yes"] - expected).abs() < 1e-7);

        let vector =
            FeatureVector::from_parts(names.len() + 1, vec![i, names.len()], vec![1.0, 1.0]).unwrap();
        let explanation = model.score_vector_debug(&vector).unwrap();
        assert!((explanation.probs["yes"] - expected).abs() < 1e-7);
    }
}

#[test]
fn test_categorical_slot_follows_continuous_field() {
    let document = json!({
        "dataDictionary": {"dataFields": [
            {"name": "age", "optype": "continuous", "dataType": "double"},
            {"name": "grade", "optype": "categorical", "dataType": "string", "values": ["A", "B", "C"]},
            {"name": "y", "optype": "categorical", "dataType": "string", "values": ["0", "1"]}
        ]},
        "models": [{"GeneralRegressionModel": {
            "functionName": "classification",
            "modelType": "multinomialLogistic",
            "miningSchema": {"miningFields": [
                {"name": "age"}, {"name": "grade"}, {"name": "y", "usageType": "target"}
            ]},
            "parameterList": [{"name": "p0"}, {"name": "p1"}, {"name": "p2"}, {"name": "p3"}],
            "factorList": [{"name": "grade"}],
            "covariateList": [{"name": "age"}],
            "ppMatrix": [
                {"predictorName": "age", "parameterName": "p1"},
                {"predictorName": "grade", "parameterName": "p2", "value": "A"},
                {"predictorName": "grade", "parameterName": "p3", "value": "B"}
            ],
            "paramMatrix": [
                {"targetCategory": "1", "parameterName": "p0", "beta": 0.1},
                {"targetCategory": "1", "parameterName": "p1", "beta": 0.2},
                {"targetCategory": "1", "parameterName": "p2", "beta": 0.3},
                {"targetCategory": "1", "parameterName": "p3", "beta": 0.4}
            ]
        }}]
    });
    let model = compile(&document);
    let Pipeline::Vector(vectorizer) = model.pipeline() else {
        panic!("vector pipeline expected");
    };
    assert_eq!(vectorizer.size(), 5);

    for (k, grade) in ["A", "B", "C"].iter().enumerate() {
        let vector = vectorizer
            .vectorize(&MapDataSource::new().with("age", 1.0).with("grade", *grade))
            .unwrap();
        assert_eq!(vector.indices(), &[0, k + 1, 4]);
    }

    // The unclaimed reference category contributes nothing.
    let explanation = model
        .score_debug(&MapDataSource::new().with("age", 0.0).with("grade", "C"))
        .unwrap();
    assert!((explanation.scores["1"] - 0.1).abs() < 1e-12);
    assert_eq!(explanation.class, "1");
}

#[test]
fn test_missing_value_substitution() {
    let pmml = Pmml {
        version: None,
        data_dictionary: DataDictionary::new(vec![
            DataField::continuous("income", DataType::Double),
            DataField::categorical("label", DataType::String, ["bad", "good"]),
        ]),
        transformation_dictionary: TransformationDictionary::new(vec![DerivedField::missing_value(
            "income_filled",
            "income",
            OpType::Continuous,
            DataType::Double,
            "1000",
        )]),
        models: Vec::new(),
    };
    let mut document = serde_json::to_value(&pmml).unwrap();
    document["models"] = json!([{"RegressionModel": {
        "functionName": "classification",
        "normalizationMethod": "none",
        "miningSchema": {"miningFields": [
            {"name": "income_filled"}, {"name": "label", "usageType": "target"}
        ]},
        "regressionTables": [
            {"intercept": -500.0, "targetCategory": "good",
             "numericPredictors": [{"name": "income_filled", "coefficient": 1.0}]},
            {}
        ]
    }}]);
    let model = compile(&document);

    assert_eq!(model.score(&json!({"income": null})).unwrap(), "good");
    assert_eq!(model.score(&json!({})).unwrap(), "good");
    assert_eq!(model.score(&json!({"income": 100.0})).unwrap(), "bad");
}

#[test]
fn test_mining_replacement_types_raw_field() {
    let mut pmml = Pmml {
        version: None,
        data_dictionary: DataDictionary::new(vec![
            DataField::continuous("x", DataType::Integer),
            DataField::categorical("y", DataType::String, ["n", "p"]),
        ]),
        transformation_dictionary: TransformationDictionary::default(),
        models: Vec::new(),
    };
    let mut document = serde_json::to_value(&pmml).unwrap();
    document["models"] = json!([{"RegressionModel": {
        "functionName": "classification",
        "normalizationMethod": "logit",
        "miningSchema": {"miningFields": [
            serde_json::to_value(MiningField::active("x").with_replacement("3")).unwrap(),
            serde_json::to_value(MiningField::target("y")).unwrap()
        ]},
        "regressionTables": [
            {"intercept": -2.0, "targetCategory": "p",
             "numericPredictors": [{"name": "x", "coefficient": 1.0}]},
            {}
        ]
    }}]);
    pmml = serde_json::from_value(document).unwrap();
    let model = ScriptEngine::new().compile(&pmml).unwrap();
    assert_eq!(model.score(&json!({})).unwrap(), "p");
    assert_eq!(model.score(&json!({"x": 1})).unwrap(), "n");
}

#[test]
fn test_binary_complement_and_extreme_scores() {
    let model = compile(&logistic_document(&[("x", 1.0)], 0.0));
    let high = model.score_debug(&json!({"x": 1000.0})).unwrap();
    assert_eq!(high.class, "yes");
    assert_eq!(high.probs["yes"], 1.0);
    assert_eq!(high.probs["no"], 0.0);

    let low = model.score_debug(&json!({"x": -1000.0})).unwrap();
    assert_eq!(low.class, "no");
    assert!(low.probs["yes"].is_finite());
    assert!(low.probs["yes"] >= 0.0 && low.probs["yes"] < 1e-300);
}

#[test]
fn test_three_class_target_rejected() {
    let mut document = logistic_document(&[("x", 1.0)], 0.0);
    document["dataDictionary"]["dataFields"][1]["values"] = json!(["no", "yes", "maybe"]);
    let pmml: Pmml = serde_json::from_value(document).unwrap();
    assert!(matches!(ScriptEngine::new().compile(&pmml), Err(Error::UnsupportedSpec(_))));
}

#[test]
fn test_multi_model_document_rejected() {
    let mut document = logistic_document(&[("x", 1.0)], 0.0);
    let model = document["models"][0].clone();
    document["models"] = json!([model.clone(), model]);
    let pmml: Pmml = serde_json::from_value(document).unwrap();

    let engine = ScriptEngine::new();
    assert!(matches!(engine.compile(&pmml), Err(Error::UnsupportedSpec(_))));
    assert!(engine.compile_model(&pmml, 1).is_ok());
}

#[test]
fn test_unimplemented_family_rejected() {
    let document = json!({
        "dataDictionary": {"dataFields": []},
        "models": [{"NeuralNetwork": {"layers": []}}]
    });
    let pmml: Pmml = serde_json::from_value(document).unwrap();
    let err = ScriptEngine::new().compile(&pmml).unwrap_err();
    assert!(err.is_compile_error());
}

#[test]
fn test_concurrent_scoring_is_deterministic() {
    let model = Arc::new(ScriptEngine::new().compile_str(&fixture("income_tree.json")).unwrap());
    let documents: Vec<Value> = rows("income_rows.jsonl").into_iter().cycle().take(2000).collect();
    let params = ScriptParams::default();

    let sequential: Vec<Value> = documents
        .iter()
        .map(|d| serde_json::to_value(model.run(d, &params).unwrap()).unwrap())
        .collect();
    let parallel: Vec<Value> = documents
        .par_iter()
        .map(|d| serde_json::to_value(model.run(d, &params).unwrap()).unwrap())
        .collect();
    assert_eq!(sequential, parallel);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let model = Arc::clone(&model);
            let documents = documents.clone();
            std::thread::spawn(move || {
                documents
                    .iter()
                    .map(|d| model.score(d).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();
    for handle in handles {
        let labels = handle.join().unwrap();
        let expected: Vec<&str> = sequential
            .iter()
            .map(|v| v["class"].as_str().unwrap())
            .collect();
        assert_eq!(labels, expected);
    }
}

#[test]
fn test_naive_bayes_document() {
    let document = json!({
        "dataDictionary": {"dataFields": [
            {"name": "color", "optype": "categorical", "dataType": "string", "values": ["red", "blue"]},
            {"name": "weight", "optype": "continuous", "dataType": "double"},
            {"name": "fruit", "optype": "categorical", "dataType": "string", "values": ["apple", "plum"]}
        ]},
        "models": [{"NaiveBayesModel": {
            "functionName": "classification",
            "threshold": 0.001,
            "miningSchema": {"miningFields": [
                {"name": "color"}, {"name": "weight"}, {"name": "fruit", "usageType": "target"}
            ]},
            "bayesInputs": [
                {"fieldName": "color", "pairCounts": [
                    {"value": "red", "targetValueCounts": [{"value": "apple", "count": 8}, {"value": "plum", "count": 1}]},
                    {"value": "blue", "targetValueCounts": [{"value": "apple", "count": 2}, {"value": "plum", "count": 9}]}
                ]},
                {"fieldName": "weight", "targetValueStats": [
                    {"value": "apple", "distribution": {"GaussianDistribution": {"mean": 150.0, "variance": 100.0}}},
                    {"value": "plum", "distribution": {"GaussianDistribution": {"mean": 60.0, "variance": 100.0}}}
                ]}
            ],
            "bayesOutput": {"fieldName": "fruit", "targetValueCounts": [
                {"value": "apple", "count": 10}, {"value": "plum", "count": 10}
            ]}
        }}]
    });
    let model = compile(&document);
    assert_eq!(model.score(&json!({"color": "red", "weight": 145.0})).unwrap(), "apple");
    assert_eq!(model.score(&json!({"color": "blue", "weight": 55.0})).unwrap(), "plum");
    // Missing inputs are skipped.
    assert_eq!(model.score(&json!({"color": "blue"})).unwrap(), "plum");
    assert!(matches!(
        model.score(&json!({"color": "green", "weight": 100.0})),
        Err(Error::EvaluationMismatch(_))
    ));

    let explanation = model.score_debug(&json!({"color": "red", "weight": 100.0})).unwrap();
    let total: f64 = explanation.probs.values().sum();
    assert!((total - 1.0).abs() < 1e-9);
    assert_eq!(explanation.scores.len(), 2);
}

#[test]
fn test_precomputed_vectors() {
    let document = json!({
        "dataDictionary": {"dataFields": [
            {"name": "a", "optype": "continuous", "dataType": "double"},
            {"name": "b", "optype": "continuous", "dataType": "double"},
            {"name": "label", "optype": "categorical", "dataType": "string", "values": ["neg", "pos"]}
        ]},
        "models": [{"RegressionModel": {
            "functionName": "classification",
            "miningSchema": {"miningFields": [
                {"name": "a"}, {"name": "b"}, {"name": "label", "usageType": "target"}
            ]},
            "regressionTables": [
                {"intercept": 0.5, "targetCategory": "pos", "numericPredictors": [
                    {"name": "b", "coefficient": -1.0},
                    {"name": "a", "coefficient": 2.0}
                ]},
                {"targetCategory": "neg"}
            ]
        }}]
    });
    let pmml: Pmml = serde_json::from_value(document).unwrap();
    let model = ScriptEngine::new().compile_precomputed(&pmml, 0).unwrap();
    assert_eq!(model.vector_size(), Some(2));

    // Declaration order: index 0 is b, index 1 is a.
    let payload = json!({"indices": [0], "values": [1.0]});
    assert_eq!(model.run(&payload, &ScriptParams::label_only()).unwrap().class(), "neg");
    let payload = json!({"indices": [1], "values": [1.0]});
    assert_eq!(model.run(&payload, &ScriptParams::label_only()).unwrap().class(), "pos");

    let vector = FeatureVector::from_parts(2, vec![0, 1], vec![1.0, 0.25]).unwrap();
    assert_eq!(model.score_vector(&vector).unwrap(), "neg");
    assert!(model.score_vector(&FeatureVector::new(3)).is_err());
}

#[test]
fn test_registry_shares_models() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(fixture("income_tree.json").as_bytes()).unwrap();

    let registry = Arc::new(ModelRegistry::new());
    registry.load_file("income", file.path()).unwrap();
    registry
        .load("linear", &logistic_document(&[("x", 1.0)], 0.0).to_string())
        .unwrap();
    assert_eq!(registry.names(), vec!["income", "linear"]);

    let documents = rows("income_rows.jsonl");
    let labels: Vec<String> = documents
        .par_iter()
        .map(|d| registry.get("income").unwrap().score(d).unwrap())
        .collect();
    assert_eq!(labels[0], ">50K");

    assert!(registry.unload("linear"));
    assert!(registry.get("linear").is_none());
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_script_params_from_vars() {
    let model = compile(&logistic_document(&[("x", 1.0)], 0.0));
    let params = ScriptParams::from_vars(&json!({"debug": false})).unwrap();
    assert_eq!(model.run(&json!({"x": 2.0}), &params).unwrap(), ScriptOutput::Label("yes".to_string()));

    let params = ScriptParams::from_vars(&Value::Null).unwrap();
    let output = serde_json::to_value(model.run(&json!({"x": 2.0}), &params).unwrap()).unwrap();
    assert_eq!(output["class"], "yes");
    assert!(output["probs"]["no"].as_f64().unwrap() < 0.5);
}
