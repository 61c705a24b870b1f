//! Task descriptions and experience data supplied by callers.

mod sampler;

pub use sampler::TaskSampler;

use serde::{Deserialize, Serialize};

use crate::{MetaRLError, Result};

/// A single task instance drawn from a task distribution.
///
/// Immutable once created; the engine never retains it beyond producing a
/// result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaRLTask {
    /// Unique identifier, also the adaptation-history key
    pub task_id: String,
    /// Environment this task belongs to
    pub environment: String,
    /// Numeric parameters describing the task instance
    pub task_parameters: Vec<f64>,
    /// Dimensionality of the state space
    pub state_size: usize,
    /// Number of discrete actions
    pub action_size: usize,
    /// Episode length, used by curriculum sampling as the difficulty ordering
    pub episode_length: usize,
    /// Scale applied by the environment to raw rewards
    pub reward_scale: f64,
}

impl MetaRLTask {
    /// Create a task with default space sizes.
    pub fn new(task_id: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            environment: environment.into(),
            task_parameters: Vec::new(),
            state_size: 4,
            action_size: 2,
            episode_length: 100,
            reward_scale: 1.0,
        }
    }

    /// Builder: set the task parameter vector
    pub fn with_task_parameters(mut self, parameters: Vec<f64>) -> Self {
        self.task_parameters = parameters;
        self
    }

    /// Builder: set the state-space size
    pub fn with_state_size(mut self, size: usize) -> Self {
        self.state_size = size;
        self
    }

    /// Builder: set the action-space size
    pub fn with_action_size(mut self, size: usize) -> Self {
        self.action_size = size;
        self
    }

    /// Builder: set the episode length
    pub fn with_episode_length(mut self, length: usize) -> Self {
        self.episode_length = length;
        self
    }

    /// Builder: set the reward scale
    pub fn with_reward_scale(mut self, scale: f64) -> Self {
        self.reward_scale = scale;
        self
    }
}

/// A batch of logged transitions as parallel sequences.
///
/// All sequences have the same length N >= 1 and every state vector is
/// non-empty; `new` enforces this. `actions[i]` indexes into the output of
/// the forward model for `states[i]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperienceBatch {
    pub states: Vec<Vec<f64>>,
    pub actions: Vec<usize>,
    pub rewards: Vec<f64>,
    pub next_states: Vec<Vec<f64>>,
    pub dones: Vec<bool>,
    /// Optional per-transition advantage estimates
    pub advantages: Option<Vec<f64>>,
}

impl ExperienceBatch {
    /// Create a batch, validating the parallel-sequence invariant.
    pub fn new(
        states: Vec<Vec<f64>>,
        actions: Vec<usize>,
        rewards: Vec<f64>,
        next_states: Vec<Vec<f64>>,
        dones: Vec<bool>,
    ) -> Result<Self> {
        let n = states.len();
        if n == 0 {
            return Err(MetaRLError::InvalidArgument(
                "experience batch must contain at least one transition".to_string(),
            ));
        }
        if actions.len() != n || rewards.len() != n || next_states.len() != n || dones.len() != n {
            return Err(MetaRLError::InvalidArgument(format!(
                "experience batch sequences differ in length: states={}, actions={}, rewards={}, next_states={}, dones={}",
                n,
                actions.len(),
                rewards.len(),
                next_states.len(),
                dones.len()
            )));
        }
        if states.iter().chain(next_states.iter()).any(|s| s.is_empty()) {
            return Err(MetaRLError::InvalidArgument(
                "experience batch state vectors must be non-empty".to_string(),
            ));
        }

        Ok(Self {
            states,
            actions,
            rewards,
            next_states,
            dones,
            advantages: None,
        })
    }

    /// Attach advantage estimates; the sequence must match the batch length.
    pub fn with_advantages(mut self, advantages: Vec<f64>) -> Result<Self> {
        if advantages.len() != self.len() {
            return Err(MetaRLError::InvalidArgument(format!(
                "advantages length {} does not match batch length {}",
                advantages.len(),
                self.len()
            )));
        }
        self.advantages = Some(advantages);
        Ok(self)
    }

    /// Number of transitions in the batch
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }
}

/// Support and query data for one adaptation run.
///
/// The performance fields and step budget describe the caller's expectations
/// for the run; the adaptation loop itself is bounded by
/// [`MetaRLConfig::adaptation_steps`](crate::MetaRLConfig). Support and query
/// sets may share transitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptationContext {
    /// Few-shot batch used for gradient steps
    pub support_set: ExperienceBatch,
    /// Held-out batch used to score each step
    pub query_set: ExperienceBatch,
    /// Performance before adaptation, as reported by the caller
    pub baseline_performance: f64,
    /// Performance the caller hopes to reach
    pub target_performance: f64,
    /// Step budget the caller has allotted for this run
    pub step_budget: usize,
}

impl AdaptationContext {
    pub fn new(support_set: ExperienceBatch, query_set: ExperienceBatch) -> Self {
        Self {
            support_set,
            query_set,
            baseline_performance: 0.0,
            target_performance: 0.0,
            step_budget: 0,
        }
    }

    /// Builder: set the reported baseline performance
    pub fn with_baseline_performance(mut self, baseline: f64) -> Self {
        self.baseline_performance = baseline;
        self
    }

    /// Builder: set the target performance
    pub fn with_target_performance(mut self, target: f64) -> Self {
        self.target_performance = target;
        self
    }

    /// Builder: set the caller-allotted step budget
    pub fn with_step_budget(mut self, budget: usize) -> Self {
        self.step_budget = budget;
        self
    }
}

/// Strategy used to draw meta-batches from a task distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplingStrategy {
    /// Shuffle and take the first `meta_batch_size` tasks
    Uniform,
    /// Roulette-wheel draws weighted by past adaptation outcomes
    Prioritized,
    /// Ascending episode length, no randomness
    Curriculum,
}

impl Default for SamplingStrategy {
    fn default() -> Self {
        Self::Uniform
    }
}

/// A family of tasks and the strategy used to sample from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDistribution {
    /// Family name, used in log and error messages
    pub family: String,
    pub tasks: Vec<MetaRLTask>,
    pub strategy: SamplingStrategy,
    /// Declared difficulty span of the family
    pub difficulty_range: (f64, f64),
    /// Informational only; sampling does not enforce it
    pub diversity_metric: f64,
}

impl TaskDistribution {
    pub fn new(
        family: impl Into<String>,
        tasks: Vec<MetaRLTask>,
        strategy: SamplingStrategy,
    ) -> Self {
        Self {
            family: family.into(),
            tasks,
            strategy,
            difficulty_range: (0.0, 1.0),
            diversity_metric: 0.0,
        }
    }

    /// Builder: set the declared difficulty range
    pub fn with_difficulty_range(mut self, range: (f64, f64)) -> Self {
        self.difficulty_range = range;
        self
    }

    /// Builder: set the diversity metric
    pub fn with_diversity_metric(mut self, metric: f64) -> Self {
        self.diversity_metric = metric;
        self
    }
}
