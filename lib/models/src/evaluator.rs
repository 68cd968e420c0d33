use pmmlx_core::Result;
use crate::explain::Explanation;

/// Common capability of every model family.
///
/// Implementations are immutable after construction; evaluation takes
/// `&self` and allocates its own working state, so one evaluator can serve
/// any number of threads.
pub trait ModelEvaluator: Send + Sync {
    /// What the model consumes: a feature vector or a named-field map.
    type Input: ?Sized;

    /// Predicted class label.
    fn evaluate(&self, input: &Self::Input) -> Result<String>;

    /// Predicted class label with per-class numbers and terms.
    fn evaluate_debug(&self, input: &Self::Input) -> Result<Explanation>;
}
