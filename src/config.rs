//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Meta-learning algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetaAlgorithm {
    /// Model-Agnostic Meta-Learning (Finn et al., 2017)
    MAML,
    /// First-order Reptile (Nichol et al., 2018)
    Reptile,
    /// Prototypical networks. Recognized in configuration but carries no
    /// adaptation path; dispatching on it fails with
    /// [`MetaRLError::UnsupportedAlgorithm`](crate::MetaRLError).
    ProtoNet,
}

impl Default for MetaAlgorithm {
    fn default() -> Self {
        Self::MAML
    }
}

/// Initialization scheme for the meta-parameter vector.
///
/// Each entry is drawn as `(U(0,1) - 0.5) * sqrt(variance)` with the variance
/// set by the scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitMethod {
    /// Variance `2 / dimensions`
    Xavier,
    /// Variance `2 / sqrt(dimensions)`
    He,
    /// Fixed variance `0.1`
    Uniform,
}

impl Default for InitMethod {
    fn default() -> Self {
        Self::Xavier
    }
}

/// Configuration for the meta-RL engine.
///
/// Set once at construction; the engine never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaRLConfig {
    /// Outer-loop strategy used by `adapt_to_task`
    pub algorithm: MetaAlgorithm,

    /// Learning rate for per-task adaptation (alpha)
    pub inner_learning_rate: f64,

    /// Meta-learning rate for outer updates (beta)
    pub outer_learning_rate: f64,

    /// Gradient steps per inner-loop adaptation
    pub adaptation_steps: usize,

    /// Number of tasks drawn per meta-batch
    pub meta_batch_size: usize,

    /// Transitions callers should gather per experience batch
    pub task_samples_per_batch: usize,

    /// Use the first-order meta-gradient approximation (FOMAML-style)
    pub first_order_approximation: bool,

    /// Global L2 clipping threshold for aggregated meta-gradients
    pub max_gradient_norm: f64,
}

impl Default for MetaRLConfig {
    fn default() -> Self {
        Self {
            algorithm: MetaAlgorithm::MAML,
            inner_learning_rate: 0.01,
            outer_learning_rate: 0.001,
            adaptation_steps: 5,
            meta_batch_size: 8,
            task_samples_per_batch: 10,
            first_order_approximation: false,
            max_gradient_norm: 10.0,
        }
    }
}

impl MetaRLConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the algorithm
    pub fn with_algorithm(mut self, algorithm: MetaAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Builder: set the inner-loop learning rate
    pub fn with_inner_learning_rate(mut self, rate: f64) -> Self {
        self.inner_learning_rate = rate;
        self
    }

    /// Builder: set the outer-loop learning rate
    pub fn with_outer_learning_rate(mut self, rate: f64) -> Self {
        self.outer_learning_rate = rate;
        self
    }

    /// Builder: set the inner-loop step count
    pub fn with_adaptation_steps(mut self, steps: usize) -> Self {
        self.adaptation_steps = steps;
        self
    }

    /// Builder: set the meta-batch size
    pub fn with_meta_batch_size(mut self, size: usize) -> Self {
        self.meta_batch_size = size;
        self
    }

    /// Builder: set the per-batch sample count
    pub fn with_task_samples_per_batch(mut self, samples: usize) -> Self {
        self.task_samples_per_batch = samples;
        self
    }

    /// Builder: toggle the first-order approximation
    pub fn with_first_order_approximation(mut self, first_order: bool) -> Self {
        self.first_order_approximation = first_order;
        self
    }

    /// Builder: set the gradient clipping threshold
    pub fn with_max_gradient_norm(mut self, norm: f64) -> Self {
        self.max_gradient_norm = norm;
        self
    }
}
