//! Debug output for a single evaluation
//!
//! Shows which class won, the per-class probabilities or scores it was
//! chosen from, and the terms that went into them.

use ordered_float::OrderedFloat;
use serde::Serialize;
use std::collections::BTreeMap;

/// A predicted class plus the numbers behind it.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Explanation {
    /// The predicted class label
    pub class: String,
    /// Per-class probabilities
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub probs: BTreeMap<String, f64>,
    /// Per-class raw scores: linear scores, margins or log-likelihoods
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub scores: BTreeMap<String, f64>,
    /// Individual contributions, keyed by parameter or field
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub terms: BTreeMap<String, f64>,
    /// Nodes visited, for tree models
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<String>,
}

impl Explanation {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_prob(mut self, class: impl Into<String>, p: f64) -> Self {
        self.probs.insert(class.into(), p);
        self
    }

    #[must_use]
    pub fn with_score(mut self, class: impl Into<String>, score: f64) -> Self {
        self.scores.insert(class.into(), score);
        self
    }

    #[must_use]
    pub fn with_term(mut self, name: impl Into<String>, value: f64) -> Self {
        self.terms.insert(name.into(), value);
        self
    }

    /// Term with the largest absolute contribution.
    pub fn top_term(&self) -> Option<(&str, f64)> {
        self.terms
            .iter()
            .max_by_key(|(_, v)| OrderedFloat(v.abs()))
            .map(|(k, v)| (k.as_str(), *v))
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
