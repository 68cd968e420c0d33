use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};

/// Sparse feature vector as parallel (index, value) arrays.
///
/// Indices are strictly ascending, unique, and lie in `[0, size)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureVector {
    size: usize,
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl FeatureVector {
    /// An all-zero vector of the given size.
    #[inline]
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            size,
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build from parallel arrays, checking every invariant.
    pub fn from_parts(size: usize, indices: Vec<usize>, values: Vec<f64>) -> Result<Self> {
        if indices.len() != values.len() {
            return Err(Error::mismatch(format!(
                "vector has {} indices but {} values",
                indices.len(),
                values.len()
            )));
        }
        for (pos, &index) in indices.iter().enumerate() {
            if index >= size {
                return Err(Error::mismatch(format!(
                    "vector index {} out of range for size {}",
                    index, size
                )));
            }
            if pos > 0 && indices[pos - 1] >= index {
                return Err(Error::mismatch(format!(
                    "vector indices must be strictly ascending, found {} after {}",
                    index,
                    indices[pos - 1]
                )));
            }
        }
        Ok(Self { size, indices, values })
    }

    /// Build from a dense slice, keeping only non-zero entries.
    #[must_use]
    pub fn from_dense(dense: &[f64]) -> Self {
        let mut indices = Vec::new();
        let mut values = Vec::new();
        for (i, &v) in dense.iter().enumerate() {
            if v != 0.0 {
                indices.push(i);
                values.push(v);
            }
        }
        Self {
            size: dense.len(),
            indices,
            values,
        }
    }

    /// Parse a pre-computed `{"indices": [...], "values": [...]}` payload.
    pub fn from_payload(payload: &serde_json::Value, size: usize) -> Result<Self> {
        let indices = payload
            .get("indices")
            .and_then(|v| v.as_array())
            .ok_or_else(|| Error::mismatch("vector payload has no 'indices' array"))?
            .iter()
            .map(|v| {
                v.as_u64()
                    .map(|i| i as usize)
                    .ok_or_else(|| Error::mismatch(format!("invalid vector index {}", v)))
            })
            .collect::<Result<Vec<_>>>()?;
        let values = payload
            .get("values")
            .and_then(|v| v.as_array())
            .ok_or_else(|| Error::mismatch("vector payload has no 'values' array"))?
            .iter()
            .map(|v| {
                v.as_f64()
                    .ok_or_else(|| Error::mismatch(format!("invalid vector value {}", v)))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_parts(size, indices, values)
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of stored (non-implicit) entries.
    #[inline]
    #[must_use]
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    #[inline]
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Value at `index`, zero when not stored.
    pub fn get(&self, index: usize) -> f64 {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Dot product against a dense weight vector of exactly `size` entries.
    pub fn dot(&self, weights: &[f64]) -> Result<f64> {
        if weights.len() != self.size {
            return Err(Error::mismatch(format!(
                "vector size {} does not match {} model coefficients",
                self.size,
                weights.len()
            )));
        }
        Ok(self.iter().map(|(i, v)| weights[i] * v).sum())
    }

    #[must_use]
    pub fn to_dense(&self) -> Vec<f64> {
        let mut dense = vec![0.0; self.size];
        for (i, v) in self.iter() {
            dense[i] = v;
        }
        dense
    }

    #[must_use]
    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "indices": self.indices,
            "values": self.values,
        })
    }
}

/// Accumulates entries in any order and produces a valid [`FeatureVector`].
#[derive(Debug, Clone)]
pub struct FeatureVectorBuilder {
    size: usize,
    entries: Vec<(usize, f64)>,
}

impl FeatureVectorBuilder {
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            size,
            entries: Vec::new(),
        }
    }

    #[inline]
    pub fn push(&mut self, index: usize, value: f64) {
        self.entries.push((index, value));
    }

    /// Sort the entries and check the vector invariants; a repeated index
    /// means two fill rules claimed the same slot.
    pub fn build(mut self) -> Result<FeatureVector> {
        self.entries.sort_by_key(|(i, _)| *i);
        let (indices, values): (Vec<usize>, Vec<f64>) = self.entries.into_iter().unzip();
        FeatureVector::from_parts(self.size, indices, values)
    }
}
