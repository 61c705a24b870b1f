//! Full meta-training loop: sample task batches, aggregate meta-gradients,
//! apply them, and round-trip the learned parameters through JSON the way a
//! persistence layer would.

use meta_rl_engine::prelude::*;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const STATE_SIZE: usize = 4;
const ACTION_SIZE: usize = 4;

fn synthetic_batch(rng: &mut StdRng, samples: usize, reward_level: f64) -> ExperienceBatch {
    let states: Vec<Vec<f64>> = (0..samples)
        .map(|_| (0..STATE_SIZE).map(|_| rng.gen::<f64>() - 0.5).collect())
        .collect();
    let next_states = states.clone();
    let actions: Vec<usize> = (0..samples).map(|_| rng.gen_range(0..ACTION_SIZE)).collect();
    let rewards: Vec<f64> = (0..samples)
        .map(|_| reward_level + rng.gen::<f64>() * 0.2)
        .collect();
    let dones: Vec<bool> = (0..samples).map(|i| i == samples - 1).collect();

    ExperienceBatch::new(states, actions, rewards, next_states, dones)
        .expect("synthetic batch is well-formed")
}

fn main() {
    println!("=== Meta-Training Loop Example ===\n");

    let config = MetaRLConfig::default()
        .with_inner_learning_rate(0.05)
        .with_outer_learning_rate(0.01)
        .with_adaptation_steps(3)
        .with_meta_batch_size(4)
        .with_first_order_approximation(true);
    let samples = config.task_samples_per_batch;
    let mut engine = MetaRLEngine::with_seed(config, 42);

    engine
        .initialize_meta_parameters(STATE_SIZE * ACTION_SIZE, InitMethod::Xavier)
        .expect("positive dimensions");

    // A curriculum family: episode length doubles as the difficulty axis.
    let tasks: Vec<MetaRLTask> = (0..8)
        .map(|i| {
            MetaRLTask::new(format!("task-{i}"), "synthetic")
                .with_state_size(STATE_SIZE)
                .with_action_size(ACTION_SIZE)
                .with_episode_length(25 * (i + 1))
                .with_task_parameters(vec![i as f64 * 0.1])
        })
        .collect();
    engine
        .setup_task_distribution(
            TaskDistribution::new("synthetic-family", tasks, SamplingStrategy::Curriculum)
                .with_difficulty_range((0.1, 0.8)),
        )
        .expect("distribution is non-empty");

    println!("Meta-training for 5 epochs...");
    let mut rng = StdRng::seed_from_u64(7);
    for epoch in 0..5 {
        let batch = engine.sample_task_batch().expect("distribution configured");

        let contexts: Vec<AdaptationContext> = batch
            .iter()
            .map(|task| {
                let reward_level = 0.5 + task.task_parameters[0];
                AdaptationContext::new(
                    synthetic_batch(&mut rng, samples, reward_level),
                    synthetic_batch(&mut rng, samples, reward_level),
                )
            })
            .collect();

        let gradient = engine
            .compute_meta_gradients(&batch, &contexts)
            .expect("batch and contexts align");
        engine
            .apply_meta_gradient(&gradient)
            .expect("parameters initialized");

        println!(
            "  Epoch {}: outer loss = {:.6}, mean inner loss = {:.6}",
            epoch + 1,
            gradient.outer_loop_loss,
            gradient.inner_loop_losses.iter().sum::<f64>() / gradient.inner_loop_losses.len() as f64
        );
    }
    println!();

    // Persist the learned parameters and restore them, as an external
    // storage layer would across process restarts.
    println!("Persistence round-trip...");
    let exported = engine.export_meta_parameters();
    let serialized = serde_json::to_string(&exported).expect("parameters serialize");
    println!("  Serialized {} parameters ({} bytes)", exported.len(), serialized.len());

    let restored: Vec<f64> = serde_json::from_str(&serialized).expect("parameters deserialize");
    engine.import_meta_parameters(&restored);
    assert_eq!(engine.export_meta_parameters(), exported);
    println!("  Restored parameters match the exported ones");

    println!("\n=== Example Complete ===");
}
