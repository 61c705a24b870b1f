//! Stateless scoring functions mapping `(parameters, data)` to values.

use crate::task::ExperienceBatch;

/// Discount factor applied to the bootstrap term of the TD target.
pub const DISCOUNT: f64 = 0.99;

/// Action-value output for `state` under `params`.
///
/// The output width is `max(1, params.len() / state.len())`; unit `i` is the
/// tanh of a strided dot product, indexing the parameter vector modulo its
/// length.
pub fn forward(params: &[f64], state: &[f64]) -> Vec<f64> {
    assert!(!params.is_empty(), "parameter vector must be non-empty");
    assert!(!state.is_empty(), "state vector must be non-empty");

    let width = (params.len() / state.len()).max(1);
    let mut output = Vec::with_capacity(width);
    for i in 0..width {
        let mut sum = 0.0;
        for (j, s) in state.iter().enumerate() {
            sum += params[(i * state.len() + j) % params.len()] * s;
        }
        output.push(sum.tanh());
    }
    output
}

/// Mean squared TD-error of `params` over a batch.
///
/// The discounted bootstrap term is the maximum of the *same* state's value
/// estimate; `next_states` ride along in the batch but do not enter this
/// loss.
pub fn loss(params: &[f64], batch: &ExperienceBatch) -> f64 {
    let mut total = 0.0;
    for i in 0..batch.len() {
        let values = forward(params, &batch.states[i]);
        let predicted = values[batch.actions[i]];
        let bootstrap = if batch.dones[i] {
            0.0
        } else {
            DISCOUNT * values.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
        };
        let target = batch.rewards[i] + bootstrap;
        total += (predicted - target).powi(2);
    }
    total / batch.len() as f64
}

/// Mean logged reward of the batch.
///
/// Neither the parameter vector nor the recorded actions influence the
/// estimate.
pub fn evaluate(_params: &[f64], batch: &ExperienceBatch) -> f64 {
    batch.rewards.iter().sum::<f64>() / batch.len() as f64
}
