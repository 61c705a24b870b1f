//! Meta-batch sampling over a task distribution.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::info;

use crate::history::AdaptationHistoryStore;
use crate::task::{MetaRLTask, SamplingStrategy, TaskDistribution};
use crate::{MetaRLError, Result};

/// Draws meta-batches from a configured [`TaskDistribution`].
///
/// Prioritized sampling consults the adaptation history: tasks that adapted
/// poorly (low score) come back with higher priority.
#[derive(Debug, Default)]
pub struct TaskSampler {
    distribution: Option<TaskDistribution>,
}

impl TaskSampler {
    pub fn new() -> Self {
        Self { distribution: None }
    }

    /// Install the task distribution to sample from.
    ///
    /// Fails with [`MetaRLError::EmptyTaskDistribution`] when the family has
    /// no tasks.
    pub fn set_distribution(&mut self, distribution: TaskDistribution) -> Result<()> {
        if distribution.tasks.is_empty() {
            return Err(MetaRLError::EmptyTaskDistribution(format!(
                "distribution '{}' has no tasks",
                distribution.family
            )));
        }
        info!(
            family = %distribution.family,
            tasks = distribution.tasks.len(),
            strategy = ?distribution.strategy,
            "task distribution configured"
        );
        self.distribution = Some(distribution);
        Ok(())
    }

    /// Currently configured distribution, if any.
    pub fn distribution(&self) -> Option<&TaskDistribution> {
        self.distribution.as_ref()
    }

    /// Draw one meta-batch of up to `batch_size` tasks.
    pub fn sample_batch(
        &self,
        batch_size: usize,
        history: &AdaptationHistoryStore,
        rng: &mut StdRng,
    ) -> Result<Vec<MetaRLTask>> {
        let distribution = self.distribution.as_ref().ok_or_else(|| {
            MetaRLError::SamplerNotInitialized(
                "no task distribution configured; call setup_task_distribution first".to_string(),
            )
        })?;

        let batch = match distribution.strategy {
            SamplingStrategy::Uniform => Self::sample_uniform(distribution, batch_size, rng),
            SamplingStrategy::Prioritized => {
                Self::sample_prioritized(distribution, batch_size, history, rng)
            }
            SamplingStrategy::Curriculum => Self::sample_curriculum(distribution, batch_size),
        };

        Ok(batch)
    }

    fn sample_uniform(
        distribution: &TaskDistribution,
        batch_size: usize,
        rng: &mut StdRng,
    ) -> Vec<MetaRLTask> {
        let mut tasks = distribution.tasks.clone();
        tasks.shuffle(rng);
        tasks.truncate(batch_size.min(distribution.tasks.len()));
        tasks
    }

    /// Roulette-wheel draws with replacement, weighted by
    /// `1.0 - last adaptation score` (1.0 for tasks with no history).
    fn sample_prioritized(
        distribution: &TaskDistribution,
        batch_size: usize,
        history: &AdaptationHistoryStore,
        rng: &mut StdRng,
    ) -> Vec<MetaRLTask> {
        let priorities: Vec<f64> = distribution
            .tasks
            .iter()
            .map(|task| match history.last_result(&task.task_id) {
                Some(result) => 1.0 - result.adaptation_score,
                None => 1.0,
            })
            .collect();
        let total: f64 = priorities.iter().sum();

        let mut batch = Vec::with_capacity(batch_size);
        for _ in 0..batch_size {
            let mut threshold = rng.gen::<f64>() * total;
            let mut chosen = distribution.tasks.len() - 1;
            for (idx, priority) in priorities.iter().enumerate() {
                threshold -= priority;
                if threshold <= 0.0 {
                    chosen = idx;
                    break;
                }
            }
            batch.push(distribution.tasks[chosen].clone());
        }
        batch
    }

    /// Ascending episode length, first `batch_size` tasks, no randomness.
    fn sample_curriculum(distribution: &TaskDistribution, batch_size: usize) -> Vec<MetaRLTask> {
        let mut tasks = distribution.tasks.clone();
        tasks.sort_by_key(|task| task.episode_length);
        tasks.truncate(batch_size.min(distribution.tasks.len()));
        tasks
    }
}
