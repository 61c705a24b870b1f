//! Reduced-budget adaptation for online few-shot use.

use crate::policy::GradientEstimator;
use crate::task::ExperienceBatch;
use crate::Result;

/// Run exactly `max_steps` unconditional gradient-descent updates on the
/// few-shot batch, starting from the meta-parameters.
///
/// No convergence check and no query-set scoring; `max_steps = 0` returns a
/// vector equal to the meta-parameters.
pub fn adapt(
    meta_parameters: &[f64],
    batch: &ExperienceBatch,
    max_steps: usize,
    learning_rate: f64,
    estimator: &dyn GradientEstimator,
) -> Result<Vec<f64>> {
    let mut adapted = meta_parameters.to_vec();
    for _ in 0..max_steps {
        let gradient = estimator.estimate(&adapted, batch)?;
        for (p, g) in adapted.iter_mut().zip(&gradient) {
            *p -= learning_rate * g;
        }
    }
    Ok(adapted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::FiniteDifferenceGradient;

    fn batch() -> ExperienceBatch {
        ExperienceBatch::new(
            vec![vec![1.0, 0.5]; 2],
            vec![0; 2],
            vec![1.0; 2],
            vec![vec![0.9, 0.4]; 2],
            vec![true; 2],
        )
        .unwrap()
    }

    #[test]
    fn test_zero_steps_returns_meta_parameters() {
        let meta = vec![0.5, -0.3];
        let estimator = FiniteDifferenceGradient::new();
        let adapted = adapt(&meta, &batch(), 0, 0.1, &estimator).unwrap();
        assert_eq!(adapted, meta);
    }

    #[test]
    fn test_steps_move_parameters() {
        let meta = vec![0.5, -0.3];
        let estimator = FiniteDifferenceGradient::new();
        let adapted = adapt(&meta, &batch(), 3, 0.1, &estimator).unwrap();
        assert_ne!(adapted, meta);
        assert_eq!(adapted.len(), meta.len());
    }

    #[test]
    fn test_runs_every_step_without_convergence_exit() {
        use std::cell::Cell;

        struct Counting(Cell<usize>);
        impl GradientEstimator for Counting {
            fn estimate(&self, params: &[f64], _batch: &ExperienceBatch) -> Result<Vec<f64>> {
                self.0.set(self.0.get() + 1);
                Ok(vec![0.0; params.len()]) // zero gradient would early-exit the inner loop
            }
        }

        let counting = Counting(Cell::new(0));
        let _ = adapt(&[0.5, -0.3], &batch(), 5, 0.1, &counting).unwrap();
        assert_eq!(counting.0.get(), 5);
    }
}
