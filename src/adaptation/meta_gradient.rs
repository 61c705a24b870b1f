//! Batched meta-gradient aggregation with norm clipping.

use tracing::debug;

use crate::adaptation::{inner_loop, MetaGradient};
use crate::config::MetaRLConfig;
use crate::policy::{self, l2_norm, GradientEstimator};
use crate::task::{AdaptationContext, MetaRLTask};
use crate::{MetaRLError, Result};

/// Aggregate per-task inner-loop results into one meta-gradient.
///
/// Each task's inner loop runs the full configured step count from the
/// current meta-parameters (no early stop). The per-task contribution is the
/// query gradient at the adapted parameters; without the first-order switch
/// it becomes `g_query[i] - inner_learning_rate * g_support[i]`, a finite
/// stand-in for the MAML Hessian term. Contributions are averaged over the
/// batch and the result is clipped to `max_gradient_norm` in L2 norm. The
/// meta-parameters themselves are not mutated; the caller applies the
/// gradient.
pub fn compute(
    config: &MetaRLConfig,
    meta_parameters: &[f64],
    estimator: &dyn GradientEstimator,
    tasks: &[MetaRLTask],
    contexts: &[AdaptationContext],
) -> Result<MetaGradient> {
    if tasks.len() != contexts.len() {
        return Err(MetaRLError::InvalidArgument(format!(
            "task batch length {} does not match context batch length {}",
            tasks.len(),
            contexts.len()
        )));
    }

    let mut policy_gradient = vec![0.0; meta_parameters.len()];
    let mut inner_loop_losses = Vec::with_capacity(tasks.len());
    let mut query_loss_total = 0.0;

    for (task, context) in tasks.iter().zip(contexts) {
        let outcome = inner_loop::run(
            meta_parameters,
            context,
            config.adaptation_steps,
            config.inner_learning_rate,
            estimator,
            false,
        )?;
        let adapted = outcome.adapted;

        inner_loop_losses.push(policy::loss(&adapted, &context.support_set));
        query_loss_total += policy::loss(&adapted, &context.query_set);

        let query_gradient = estimator.estimate(&adapted, &context.query_set)?;
        let contribution = if config.first_order_approximation {
            query_gradient
        } else {
            let support_gradient = estimator.estimate(&adapted, &context.support_set)?;
            query_gradient
                .iter()
                .zip(&support_gradient)
                .map(|(q, s)| q - config.inner_learning_rate * s)
                .collect()
        };

        for (accumulated, c) in policy_gradient.iter_mut().zip(&contribution) {
            *accumulated += c / tasks.len() as f64;
        }

        debug!(task = %task.task_id, "meta-gradient contribution accumulated");
    }

    let norm = l2_norm(&policy_gradient);
    if norm > config.max_gradient_norm {
        let scale = config.max_gradient_norm / norm;
        for g in policy_gradient.iter_mut() {
            *g *= scale;
        }
        debug!(
            norm,
            max_gradient_norm = config.max_gradient_norm,
            "meta-gradient clipped"
        );
    }

    let dimensions = policy_gradient.len();
    Ok(MetaGradient {
        policy_gradient,
        value_gradient: vec![0.0; dimensions],
        outer_loop_loss: query_loss_total / tasks.len() as f64,
        inner_loop_losses,
    })
}
