//! Decision tree evaluator
//!
//! The tree is flattened into an arena at compile time; traversal is a loop
//! over node indices.

use std::collections::BTreeSet;
use pmmlx_core::{Error, NoTrueChildStrategy, Result, TreeNode};
use pmmlx_schema::{FieldExtractor, FieldInput};
use crate::evaluator::ModelEvaluator;
use crate::explain::Explanation;
use crate::predicate::{referenced_fields, Condition};

#[derive(Debug, Clone)]
struct Node {
    id: String,
    condition: Condition,
    class: Option<String>,
    /// Class probabilities at this node, in declaration order.
    distribution: Vec<(String, f64)>,
    children: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    fields: Vec<String>,
    strategy: NoTrueChildStrategy,
}

/// Every field any predicate in the tree tests, sorted.
pub fn tree_fields(root: &TreeNode) -> BTreeSet<&str> {
    let mut fields = BTreeSet::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        referenced_fields(&node.predicate, &mut fields);
        stack.extend(node.nodes.iter());
    }
    fields
}

impl DecisionTree {
    pub fn compile(
        root: &TreeNode,
        fields: &FieldExtractor,
        strategy: NoTrueChildStrategy,
    ) -> Result<Self> {
        let mut nodes: Vec<Node> = Vec::new();
        let mut stack: Vec<(&TreeNode, Option<usize>)> = vec![(root, None)];

        while let Some((spec, parent)) = stack.pop() {
            let index = nodes.len();
            let distribution = distribution(spec)?;
            let class = match &spec.score {
                Some(score) => Some(score.clone()),
                None => distribution
                    .iter()
                    .fold(None::<&(String, f64)>, |best, entry| match best {
                        Some(b) if b.1 >= entry.1 => Some(b),
                        _ => Some(entry),
                    })
                    .map(|(class, _)| class.clone()),
            };
            let id = spec.id.clone().unwrap_or_else(|| index.to_string());
            if spec.nodes.is_empty() && class.is_none() {
                return Err(Error::malformed(format!(
                    "leaf node '{}' has neither a score nor a score distribution",
                    id
                )));
            }

            nodes.push(Node {
                id,
                condition: Condition::compile(&spec.predicate, fields)?,
                class,
                distribution,
                children: Vec::with_capacity(spec.nodes.len()),
            });
            if let Some(parent) = parent {
                nodes[parent].children.push(index);
            }
            for child in spec.nodes.iter().rev() {
                stack.push((child, Some(index)));
            }
        }

        Ok(Self {
            nodes,
            fields: fields.fields().iter().map(|f| f.name.clone()).collect(),
            strategy,
        })
    }

    /// Fields the input must carry, sorted.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Indices of the nodes visited, root first, ending at the deciding node.
    fn traverse(&self, input: &FieldInput) -> Result<Vec<usize>> {
        input.check_fields(self.fields.iter().map(String::as_str))?;

        if self.nodes[0].condition.evaluate(input) != Some(true) {
            return Err(Error::mismatch("root predicate does not hold for this input"));
        }
        let mut path = vec![0];
        let mut current = 0;
        loop {
            let node = &self.nodes[current];
            if node.children.is_empty() {
                return Ok(path);
            }
            let next = node
                .children
                .iter()
                .copied()
                .find(|&child| self.nodes[child].condition.evaluate(input) == Some(true));
            match next {
                Some(child) => {
                    path.push(child);
                    current = child;
                }
                None if self.strategy == NoTrueChildStrategy::ReturnLastPrediction
                    && node.class.is_some() =>
                {
                    return Ok(path);
                }
                None => {
                    return Err(Error::mismatch(format!(
                        "no child predicate of node '{}' holds and no prediction is available",
                        node.id
                    )))
                }
            }
        }
    }

    fn decide(&self, path: &[usize]) -> Result<&Node> {
        let node = path
            .last()
            .map(|&i| &self.nodes[i])
            .ok_or_else(|| Error::mismatch("empty tree path"))?;
        if node.class.is_none() {
            return Err(Error::mismatch(format!("node '{}' carries no prediction", node.id)));
        }
        Ok(node)
    }
}

fn distribution(spec: &TreeNode) -> Result<Vec<(String, f64)>> {
    let entries = &spec.score_distributions;
    if entries.is_empty() {
        return Ok(Vec::new());
    }
    if entries.iter().all(|e| e.probability.is_some()) {
        return Ok(entries
            .iter()
            .map(|e| (e.value.clone(), e.probability.unwrap_or(0.0)))
            .collect());
    }
    let total: f64 = entries.iter().map(|e| e.record_count).sum();
    if total <= 0.0 {
        return Err(Error::malformed(format!(
            "node '{}' has a score distribution with no records",
            spec.id.as_deref().unwrap_or("?")
        )));
    }
    Ok(entries
        .iter()
        .map(|e| (e.value.clone(), e.record_count / total))
        .collect())
}

impl ModelEvaluator for DecisionTree {
    type Input = FieldInput;

    fn evaluate(&self, input: &FieldInput) -> Result<String> {
        let path = self.traverse(input)?;
        let node = self.decide(&path)?;
        Ok(node.class.clone().unwrap_or_default())
    }

    fn evaluate_debug(&self, input: &FieldInput) -> Result<Explanation> {
        let path = self.traverse(input)?;
        let node = self.decide(&path)?;
        let mut explanation = Explanation::new(node.class.clone().unwrap_or_default());
        for (class, p) in &node.distribution {
            explanation = explanation.with_prob(class.clone(), *p);
        }
        explanation.path = path.iter().map(|&i| self.nodes[i].id.clone()).collect();
        Ok(explanation)
    }
}
