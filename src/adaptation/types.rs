//! Outcome types produced by adaptation runs.

use serde::{Deserialize, Serialize};

/// Per-step trace of one inner-loop run.
///
/// The three histories are the same length, one entry per executed step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConvergenceMetrics {
    /// Query-set loss after each step
    pub loss_history: Vec<f64>,
    /// Query-set reward estimate after each step
    pub reward_history: Vec<f64>,
    /// Support-set gradient norm at each step, before the update
    pub gradient_norm_history: Vec<f64>,
    /// Euclidean distance between the parameters at loop start and loop end
    pub parameter_change_magnitude: f64,
    /// Whether the convergence condition held before the budget ran out
    pub converged: bool,
    /// Step index at which convergence was declared; `None` when the loop
    /// exhausted its budget first
    pub convergence_step: Option<usize>,
}

/// Outcome of one adaptation call. Immutable once produced; a copy is
/// appended to the adaptation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaRLResult {
    pub task_id: String,
    /// Parameters after the inner loop finished
    pub adapted_parameters: Vec<f64>,
    /// Normalized reward delta between pre- and post-adaptation evaluation
    pub adaptation_score: f64,
    /// Inner-loop steps actually executed
    pub steps_taken: usize,
    pub pre_adaptation_reward: f64,
    pub post_adaptation_reward: f64,
    pub convergence: ConvergenceMetrics,
}

/// Aggregated meta-gradient over one batch of tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaGradient {
    /// Clipped, per-task-averaged policy gradient
    pub policy_gradient: Vec<f64>,
    /// Reserved; currently always a zero vector
    pub value_gradient: Vec<f64>,
    /// Mean query-set loss across the batch
    pub outer_loop_loss: f64,
    /// Support-set loss of each task's adapted parameters
    pub inner_loop_losses: Vec<f64>,
}
