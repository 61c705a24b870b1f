//! Reptile outer-loop strategy.
//!
//! Reference: Nichol, A., Achiam, J., & Schulman, J. (2018).
//! "On First-Order Meta-Learning Algorithms." arXiv:1803.02999

use tracing::debug;

use crate::adaptation::{adaptation_score, inner_loop, MetaRLResult};
use crate::config::MetaRLConfig;
use crate::policy::{self, GradientEstimator};
use crate::task::{AdaptationContext, MetaRLTask};
use crate::Result;

/// Adapt to one task and nudge the shared meta-parameters toward the adapted
/// solution.
///
/// After the inner loop, each meta-parameter moves by
/// `-outer_learning_rate * (meta - adapted)`. Both reward evaluations happen
/// after the meta-update: the pre-adaptation reward scores the updated
/// meta-parameters on the support set.
pub fn adapt(
    config: &MetaRLConfig,
    meta_parameters: &mut [f64],
    estimator: &dyn GradientEstimator,
    task: &MetaRLTask,
    context: &AdaptationContext,
) -> Result<MetaRLResult> {
    let outcome = inner_loop::run(
        meta_parameters,
        context,
        config.adaptation_steps,
        config.inner_learning_rate,
        estimator,
        true,
    )?;

    for (meta, adapted) in meta_parameters.iter_mut().zip(&outcome.adapted) {
        let meta_gradient = *meta - *adapted;
        *meta -= config.outer_learning_rate * meta_gradient;
    }

    let pre_adaptation_reward = policy::evaluate(meta_parameters, &context.support_set);
    let post_adaptation_reward = policy::evaluate(&outcome.adapted, &context.query_set);
    let score = adaptation_score(pre_adaptation_reward, post_adaptation_reward);

    debug!(
        task = %task.task_id,
        score,
        steps = outcome.steps_taken(),
        converged = outcome.metrics.converged,
        "Reptile adaptation finished"
    );

    Ok(MetaRLResult {
        task_id: task.task_id.clone(),
        steps_taken: outcome.steps_taken(),
        adapted_parameters: outcome.adapted,
        adaptation_score: score,
        pre_adaptation_reward,
        post_adaptation_reward,
        convergence: outcome.metrics,
    })
}
