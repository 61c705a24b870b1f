//! Gradient estimation strategies.

use crate::policy::evaluator;
use crate::task::ExperienceBatch;
use crate::Result;

/// Strategy for estimating the loss gradient with respect to the parameters.
///
/// The engine ships with the numeric finite-difference fallback; a policy
/// representation with an analytic gradient can implement this trait and be
/// plugged into the engine to skip the `O(dimensions)` loss evaluations per
/// estimate.
pub trait GradientEstimator {
    fn estimate(&self, params: &[f64], batch: &ExperienceBatch) -> Result<Vec<f64>>;
}

/// Symmetric finite-difference estimator.
///
/// Each component costs two loss evaluations at `±epsilon`, so one estimate
/// is `O(params.len())` loss evaluations over the batch. This is the
/// dominant cost of every adaptation run.
#[derive(Debug, Clone)]
pub struct FiniteDifferenceGradient {
    epsilon: f64,
}

impl FiniteDifferenceGradient {
    pub fn new() -> Self {
        Self { epsilon: 1e-5 }
    }

    pub fn with_epsilon(epsilon: f64) -> Self {
        Self { epsilon }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }
}

impl Default for FiniteDifferenceGradient {
    fn default() -> Self {
        Self::new()
    }
}

impl GradientEstimator for FiniteDifferenceGradient {
    fn estimate(&self, params: &[f64], batch: &ExperienceBatch) -> Result<Vec<f64>> {
        let mut gradient = vec![0.0; params.len()];
        let mut perturbed = params.to_vec();

        for i in 0..params.len() {
            let original = perturbed[i];

            perturbed[i] = original + self.epsilon;
            let loss_plus = evaluator::loss(&perturbed, batch);

            perturbed[i] = original - self.epsilon;
            let loss_minus = evaluator::loss(&perturbed, batch);

            perturbed[i] = original;
            gradient[i] = (loss_plus - loss_minus) / (2.0 * self.epsilon);
        }

        Ok(gradient)
    }
}

/// Euclidean norm of a vector.
pub fn l2_norm(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum::<f64>().sqrt()
}
