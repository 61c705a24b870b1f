//! Bounded gradient-descent adaptation on a task's support set.

use tracing::trace;

use crate::adaptation::ConvergenceMetrics;
use crate::policy::{self, l2_norm, GradientEstimator};
use crate::task::AdaptationContext;
use crate::Result;

/// Gradient norm below which the loop is considered converged.
pub(crate) const GRAD_NORM_TOLERANCE: f64 = 1e-4;
/// Loss improvement below which the loop is considered converged.
pub(crate) const LOSS_DELTA_TOLERANCE: f64 = 1e-5;

/// Adapted parameters plus the recorded trace.
#[derive(Debug, Clone)]
pub struct InnerLoopOutcome {
    pub adapted: Vec<f64>,
    pub metrics: ConvergenceMetrics,
}

impl InnerLoopOutcome {
    /// Steps actually executed, one history entry each.
    pub fn steps_taken(&self) -> usize {
        self.metrics.loss_history.len()
    }
}

/// Run up to `steps` gradient-descent updates on the support set, scoring
/// each step on the query set.
///
/// Each step: estimate the support gradient at the current parameters,
/// record its norm, apply `adapted -= learning_rate * gradient`, then record
/// query loss and reward. Convergence is declared when the gradient norm
/// falls below tolerance, or (from the second step on) when the loss stops
/// improving; with `early_stop` unset the loop still runs the full step
/// count and only records where the condition first held.
pub fn run(
    start: &[f64],
    context: &AdaptationContext,
    steps: usize,
    learning_rate: f64,
    estimator: &dyn GradientEstimator,
    early_stop: bool,
) -> Result<InnerLoopOutcome> {
    let mut adapted = start.to_vec();
    let mut metrics = ConvergenceMetrics::default();

    for step in 0..steps {
        let gradient = estimator.estimate(&adapted, &context.support_set)?;
        let gradient_norm = l2_norm(&gradient);
        metrics.gradient_norm_history.push(gradient_norm);

        for (p, g) in adapted.iter_mut().zip(&gradient) {
            *p -= learning_rate * g;
        }

        let query_loss = policy::loss(&adapted, &context.query_set);
        let query_reward = policy::evaluate(&adapted, &context.query_set);
        metrics.loss_history.push(query_loss);
        metrics.reward_history.push(query_reward);

        trace!(step, gradient_norm, query_loss, "inner-loop step");

        let loss_settled = step > 0
            && (metrics.loss_history[step] - metrics.loss_history[step - 1]).abs()
                < LOSS_DELTA_TOLERANCE;
        if !metrics.converged && (gradient_norm < GRAD_NORM_TOLERANCE || loss_settled) {
            metrics.converged = true;
            metrics.convergence_step = Some(step);
            if early_stop {
                break;
            }
        }
    }

    metrics.parameter_change_magnitude = start
        .iter()
        .zip(&adapted)
        .map(|(a, b)| (a - b) * (a - b))
        .sum::<f64>()
        .sqrt();

    Ok(InnerLoopOutcome { adapted, metrics })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::FiniteDifferenceGradient;
    use crate::task::ExperienceBatch;
    use crate::MetaRLError;

    fn context() -> AdaptationContext {
        let batch = ExperienceBatch::new(
            vec![vec![1.0, 0.5]],
            vec![0],
            vec![1.0],
            vec![vec![0.9, 0.4]],
            vec![true],
        )
        .unwrap();
        AdaptationContext::new(batch.clone(), batch)
    }

    #[test]
    fn test_histories_align() {
        let estimator = FiniteDifferenceGradient::new();
        let outcome = run(&[0.5, -0.3], &context(), 4, 0.05, &estimator, true).unwrap();

        let n = outcome.steps_taken();
        assert!(n >= 1 && n <= 4);
        assert_eq!(outcome.metrics.loss_history.len(), n);
        assert_eq!(outcome.metrics.reward_history.len(), n);
        assert_eq!(outcome.metrics.gradient_norm_history.len(), n);
    }

    #[test]
    fn test_fixed_step_count_without_early_stop() {
        // Zero gradient converges immediately, but early_stop = false keeps
        // the loop running the full budget.
        struct Zero;
        impl GradientEstimator for Zero {
            fn estimate(&self, params: &[f64], _batch: &ExperienceBatch) -> Result<Vec<f64>> {
                Ok(vec![0.0; params.len()])
            }
        }

        let outcome = run(&[0.5, -0.3], &context(), 6, 0.05, &Zero, false).unwrap();
        assert_eq!(outcome.steps_taken(), 6);
        assert!(outcome.metrics.converged);
        assert_eq!(outcome.metrics.convergence_step, Some(0));
        assert_eq!(outcome.metrics.parameter_change_magnitude, 0.0);
    }

    #[test]
    fn test_converges_on_small_gradient() {
        struct Zero;
        impl GradientEstimator for Zero {
            fn estimate(&self, params: &[f64], _batch: &ExperienceBatch) -> Result<Vec<f64>> {
                Ok(vec![0.0; params.len()])
            }
        }

        let outcome = run(&[0.5, -0.3], &context(), 6, 0.05, &Zero, true).unwrap();
        assert_eq!(outcome.steps_taken(), 1);
        assert_eq!(outcome.metrics.convergence_step, Some(0));
    }

    #[test]
    fn test_parameter_change_magnitude() {
        // Constant gradient [1, 0], lr 0.1, 1 step: parameters move by 0.1.
        struct Constant;
        impl GradientEstimator for Constant {
            fn estimate(&self, _params: &[f64], _batch: &ExperienceBatch) -> Result<Vec<f64>> {
                Ok(vec![1.0, 0.0])
            }
        }

        let outcome = run(&[0.5, -0.3], &context(), 1, 0.1, &Constant, true).unwrap();
        assert!((outcome.metrics.parameter_change_magnitude - 0.1).abs() < 1e-12);
        assert!((outcome.adapted[0] - 0.4).abs() < 1e-12);
        assert!((outcome.adapted[1] + 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_estimator_failure_propagates() {
        struct Failing;
        impl GradientEstimator for Failing {
            fn estimate(&self, _params: &[f64], _batch: &ExperienceBatch) -> Result<Vec<f64>> {
                Err(MetaRLError::InvalidArgument("no gradient".to_string()))
            }
        }

        let err = run(&[0.5], &context(), 3, 0.1, &Failing, true);
        assert!(matches!(err, Err(MetaRLError::InvalidArgument(_))));
    }
}
