//! Applies a compiled range list to a document.

use pmmlx_core::{DataSource, Error, FeatureVector, FeatureVectorBuilder, Result};
use crate::range::VectorRange;

/// Builds feature vectors from documents.
///
/// Ranges are disjoint and contiguous from index 0; [`Vectorizer::new`]
/// refuses any list that is not.
#[derive(Debug, Clone)]
pub struct Vectorizer {
    ranges: Vec<VectorRange>,
    size: usize,
}

impl Vectorizer {
    pub fn new(ranges: Vec<VectorRange>) -> Result<Self> {
        let mut size = 0;
        for range in &ranges {
            if range.offset() != size {
                return Err(Error::malformed(format!(
                    "range '{}' starts at {} but the previous range ends at {}",
                    range.name(),
                    range.offset(),
                    size
                )));
            }
            size = range.end();
        }
        Ok(Self { ranges, size })
    }

    /// Total vector size.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn ranges(&self) -> &[VectorRange] {
        &self.ranges
    }

    /// Fill every range from `source`. Allocates only per-call state.
    pub fn vectorize<S: DataSource + ?Sized>(&self, source: &S) -> Result<FeatureVector> {
        let mut builder = FeatureVectorBuilder::new(self.size);
        for range in &self.ranges {
            range.fill(source, &mut builder)?;
        }
        builder.build()
    }
}
