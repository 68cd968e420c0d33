//! Linear classifiers over feature vectors
//!
//! Both models compute `score = Σ w[i]·x[i] + b` against a vector whose
//! layout matches the coefficient order. Logistic regression turns the
//! score into a probability; the SVM only looks at its sign.

use pmmlx_core::{FeatureVector, Result};
use pmmlx_schema::{OrderedParameterList, TargetClasses};
use crate::evaluator::ModelEvaluator;
use crate::explain::Explanation;
use crate::link::sigmoid;

/// Coefficients, intercept and labels shared by the linear models.
#[derive(Debug, Clone)]
pub struct LinearModel {
    coefficients: Vec<f64>,
    intercept: f64,
    classes: TargetClasses,
    parameters: Option<OrderedParameterList>,
}

impl LinearModel {
    pub fn new(coefficients: Vec<f64>, intercept: f64, classes: TargetClasses) -> Self {
        Self {
            coefficients,
            intercept,
            classes,
            parameters: None,
        }
    }

    /// Name debug terms after the parameters instead of vector indices.
    #[must_use]
    pub fn with_parameters(mut self, parameters: OrderedParameterList) -> Self {
        self.parameters = Some(parameters);
        self
    }

    #[inline]
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    #[inline]
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    #[inline]
    pub fn classes(&self) -> &TargetClasses {
        &self.classes
    }

    /// Expected vector size.
    #[inline]
    pub fn size(&self) -> usize {
        self.coefficients.len()
    }

    /// The linear score; fails when the vector size differs from the
    /// coefficient count.
    pub fn score(&self, vector: &FeatureVector) -> Result<f64> {
        Ok(vector.dot(&self.coefficients)? + self.intercept)
    }

    /// Per-entry contributions `w[i]·x[i]` for the stored entries.
    fn terms(&self, vector: &FeatureVector) -> Explanation {
        let mut explanation = Explanation::default();
        for (index, value) in vector.iter() {
            let name = self
                .parameters
                .as_ref()
                .and_then(|p| p.get(index))
                .map(str::to_string)
                .unwrap_or_else(|| format!("[{}]", index));
            explanation = explanation.with_term(name, self.coefficients[index] * value);
        }
        if self.intercept != 0.0 {
            explanation = explanation.with_term("intercept", self.intercept);
        }
        explanation
    }
}

#[derive(Debug, Clone)]
pub struct LogisticRegression {
    linear: LinearModel,
}

impl LogisticRegression {
    pub fn new(linear: LinearModel) -> Self {
        Self { linear }
    }

    pub fn linear(&self) -> &LinearModel {
        &self.linear
    }

    /// Probability of the modeled (positive) class.
    pub fn probability(&self, vector: &FeatureVector) -> Result<f64> {
        Ok(sigmoid(self.linear.score(vector)?))
    }

    fn label(&self, p: f64) -> &str {
        let classes = self.linear.classes();
        if p >= 0.5 {
            &classes.positive
        } else {
            &classes.negative
        }
    }
}

impl ModelEvaluator for LogisticRegression {
    type Input = FeatureVector;

    fn evaluate(&self, input: &FeatureVector) -> Result<String> {
        let p = self.probability(input)?;
        Ok(self.label(p).to_string())
    }

    fn evaluate_debug(&self, input: &FeatureVector) -> Result<Explanation> {
        let score = self.linear.score(input)?;
        let p = sigmoid(score);
        let classes = self.linear.classes();
        let mut explanation = self.linear.terms(input);
        explanation.class = self.label(p).to_string();
        Ok(explanation
            .with_prob(classes.positive.clone(), p)
            .with_prob(classes.negative.clone(), 1.0 - p)
            .with_score(classes.positive.clone(), score))
    }
}

#[derive(Debug, Clone)]
pub struct LinearSvm {
    linear: LinearModel,
}

impl LinearSvm {
    pub fn new(linear: LinearModel) -> Self {
        Self { linear }
    }

    pub fn linear(&self) -> &LinearModel {
        &self.linear
    }

    fn label(&self, margin: f64) -> &str {
        let classes = self.linear.classes();
        if margin > 0.0 {
            &classes.positive
        } else {
            &classes.negative
        }
    }
}

impl ModelEvaluator for LinearSvm {
    type Input = FeatureVector;

    fn evaluate(&self, input: &FeatureVector) -> Result<String> {
        let margin = self.linear.score(input)?;
        Ok(self.label(margin).to_string())
    }

    fn evaluate_debug(&self, input: &FeatureVector) -> Result<Explanation> {
        let margin = self.linear.score(input)?;
        let mut explanation = self.linear.terms(input);
        explanation.class = self.label(margin).to_string();
        Ok(explanation.with_score(self.linear.classes().positive.clone(), margin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmmlx_core::Error;

    fn classes() -> TargetClasses {
        TargetClasses {
            positive: "1".to_string(),
            negative: "0".to_string(),
        }
    }

    #[test]
    fn test_logistic_tie_goes_positive() {
        let model = LogisticRegression::new(LinearModel::new(vec![1.0, -1.0], 0.0, classes()));
        let vector = FeatureVector::from_dense(&[2.0, 2.0]);
        assert_eq!(model.evaluate(&vector).unwrap(), "1");
        assert_eq!(model.probability(&vector).unwrap(), 0.5);
    }

    #[test]
    fn test_logistic_debug() {
        let model = LogisticRegression::new(LinearModel::new(vec![2.0, 0.0], -1.0, classes()));
        let vector = FeatureVector::from_dense(&[0.0, 3.0]);
        let explanation = model.evaluate_debug(&vector).unwrap();
        assert_eq!(explanation.class, "0");
        assert!((explanation.probs["1"] - sigmoid(-1.0)).abs() < 1e-12);
        assert!((explanation.probs["0"] - (1.0 - sigmoid(-1.0))).abs() < 1e-12);
        assert_eq!(explanation.terms["[1]"], 0.0);
        assert_eq!(explanation.terms["intercept"], -1.0);
    }

    #[test]
    fn test_svm_zero_margin_goes_negative() {
        let model = LinearSvm::new(LinearModel::new(vec![1.0], -1.0, classes()));
        assert_eq!(model.evaluate(&FeatureVector::from_dense(&[1.0])).unwrap(), "0");
        assert_eq!(model.evaluate(&FeatureVector::from_dense(&[1.5])).unwrap(), "1");
        let explanation = model.evaluate_debug(&FeatureVector::from_dense(&[3.0])).unwrap();
        assert!(explanation.probs.is_empty());
        assert_eq!(explanation.scores["1"], 2.0);
    }

    #[test]
    fn test_size_mismatch() {
        let model = LinearSvm::new(LinearModel::new(vec![1.0, 2.0], 0.0, classes()));
        let result = model.evaluate(&FeatureVector::new(3));
        assert!(matches!(result, Err(Error::EvaluationMismatch(_))));
    }

    #[test]
    fn test_named_terms() {
        let parameters: OrderedParameterList =
            vec![Some("p1".to_string()), None].into_iter().collect();
        let model = LogisticRegression::new(
            LinearModel::new(vec![0.5, 0.0], 0.0, classes()).with_parameters(parameters),
        );
        let explanation = model.evaluate_debug(&FeatureVector::from_dense(&[2.0, 0.0])).unwrap();
        assert_eq!(explanation.terms["p1"], 1.0);
        assert_eq!(explanation.terms.len(), 1);
    }
}
