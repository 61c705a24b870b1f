//! MAML outer-loop strategy.
//!
//! Reference: Finn, C., Abbeel, P., & Levine, S. (2017).
//! "Model-Agnostic Meta-Learning for Fast Adaptation of Deep Networks." ICML.

use tracing::debug;

use crate::adaptation::{adaptation_score, inner_loop, MetaRLResult};
use crate::config::MetaRLConfig;
use crate::policy::{self, GradientEstimator};
use crate::task::{AdaptationContext, MetaRLTask};
use crate::Result;

/// Adapt the meta-parameters to one task without mutating them.
///
/// The inner loop starts from the shared meta-parameters; the pre-adaptation
/// reward is scored with the meta-parameters on the support set and the
/// post-adaptation reward with the adapted parameters on the query set.
pub fn adapt(
    config: &MetaRLConfig,
    meta_parameters: &[f64],
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

    let pre_adaptation_reward = policy::evaluate(meta_parameters, &context.support_set);
    let post_adaptation_reward = policy::evaluate(&outcome.adapted, &context.query_set);
    let score = adaptation_score(pre_adaptation_reward, post_adaptation_reward);

    debug!(
        task = %task.task_id,
        score,
        steps = outcome.steps_taken(),
        converged = outcome.metrics.converged,
        "MAML adaptation finished"
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
