//! Integration tests for the meta-RL adaptation engine.
//!
//! These tests verify the end-to-end behavior of the library, using
//! engineered gradient estimators where a property calls for a known loss
//! surface.

use meta_rl_engine::prelude::*;
use meta_rl_engine::policy;
use meta_rl_engine::{MetaRLError, Result};

/// Gradient of the quadratic loss `sum_i (p_i - optimum)^2`.
struct QuadraticPull {
    optimum: f64,
}

impl GradientEstimator for QuadraticPull {
    fn estimate(&self, params: &[f64], _batch: &ExperienceBatch) -> Result<Vec<f64>> {
        Ok(params.iter().map(|p| 2.0 * (p - self.optimum)).collect())
    }
}

/// Always returns the same engineered gradient.
struct ConstantGradient(Vec<f64>);

impl GradientEstimator for ConstantGradient {
    fn estimate(&self, _params: &[f64], _batch: &ExperienceBatch) -> Result<Vec<f64>> {
        Ok(self.0.clone())
    }
}

fn scalar_batch(reward: f64) -> ExperienceBatch {
    ExperienceBatch::new(
        vec![vec![1.0]; 3],
        vec![0; 3],
        vec![reward; 3],
        vec![vec![1.0]; 3],
        vec![true; 3],
    )
    .unwrap()
}

fn planar_batch() -> ExperienceBatch {
    ExperienceBatch::new(
        vec![vec![1.0, 0.5]; 4],
        vec![0; 4],
        vec![1.0; 4],
        vec![vec![0.9, 0.4]; 4],
        vec![true; 4],
    )
    .unwrap()
}

fn context_from(batch: ExperienceBatch) -> AdaptationContext {
    AdaptationContext::new(batch.clone(), batch)
}

#[test]
fn monotonic_descent_on_query_loss() {
    // Gradient descent with the finite-difference estimator on a smooth
    // terminal-transition loss: successive query losses never increase.
    let config = MetaRLConfig::default()
        .with_adaptation_steps(10)
        .with_inner_learning_rate(0.05);
    let mut engine = MetaRLEngine::with_seed(config, 11);
    engine.import_meta_parameters(&[0.5, -0.3]);

    let task = MetaRLTask::new("descent", "env");
    let result = engine
        .adapt_to_task_maml(&task, &context_from(planar_batch()))
        .unwrap();

    let losses = &result.convergence.loss_history;
    assert!(!losses.is_empty());
    for pair in losses.windows(2) {
        assert!(
            pair[1] <= pair[0] + 1e-9,
            "loss increased from {} to {}",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn reptile_contracts_toward_adapted_parameters() {
    let config = MetaRLConfig::default()
        .with_algorithm(MetaAlgorithm::Reptile)
        .with_inner_learning_rate(0.1)
        .with_outer_learning_rate(0.5);
    let mut engine = MetaRLEngine::with_seed(config, 11);
    engine.import_meta_parameters(&[0.5, -0.3]);

    let before = engine.export_meta_parameters();
    let task = MetaRLTask::new("contract", "env");
    let result = engine
        .adapt_to_task_reptile(&task, &context_from(planar_batch()))
        .unwrap();
    let after = engine.export_meta_parameters();

    let dist = |v: &[f64]| -> f64 {
        v.iter()
            .zip(&result.adapted_parameters)
            .map(|(m, a)| (m - a) * (m - a))
            .sum::<f64>()
            .sqrt()
    };
    assert!(dist(&after) <= dist(&before));
}

#[test]
fn gradient_clipping_preserves_direction_exactly() {
    let config = MetaRLConfig::default()
        .with_first_order_approximation(true)
        .with_adaptation_steps(1)
        .with_max_gradient_norm(10.0);
    let mut engine = MetaRLEngine::with_seed(config, 11)
        .with_gradient_estimator(Box::new(ConstantGradient(vec![30.0, 40.0])));
    engine.import_meta_parameters(&[0.0, 0.0]);

    let gradient = engine
        .compute_meta_gradients(
            &[MetaRLTask::new("clip", "env")],
            &[context_from(planar_batch())],
        )
        .unwrap();

    // Engineered norm 50 clips to exactly 10 along the same direction.
    let clipped = &gradient.policy_gradient;
    assert!((policy::l2_norm(clipped) - 10.0).abs() < 1e-9);
    assert!((clipped[0] - 6.0).abs() < 1e-9);
    assert!((clipped[1] - 8.0).abs() < 1e-9);
}

#[test]
fn fast_adaptation_zero_steps_is_identity() {
    let mut engine = MetaRLEngine::with_seed(MetaRLConfig::default(), 11);
    engine
        .initialize_meta_parameters(8, InitMethod::Xavier)
        .unwrap();

    let task = MetaRLTask::new("idempotent", "env");
    let adapted = engine
        .fast_adaptation(&task, &planar_batch(), Some(0))
        .unwrap();

    assert_eq!(adapted, engine.export_meta_parameters());
}

#[test]
fn export_import_round_trip_preserves_outputs() {
    let mut engine = MetaRLEngine::with_seed(MetaRLConfig::default(), 11);
    engine
        .initialize_meta_parameters(8, InitMethod::He)
        .unwrap();

    let state = vec![0.3, -0.2, 0.7, 0.1];
    let batch = planar_batch();
    let exported = engine.export_meta_parameters();
    let forward_before = policy::forward(&exported, &state);
    let loss_before = policy::loss(&exported, &batch);

    engine.import_meta_parameters(&exported);
    let round_tripped = engine.export_meta_parameters();

    assert_eq!(round_tripped, exported);
    assert_eq!(policy::forward(&round_tripped, &state), forward_before);
    assert_eq!(policy::loss(&round_tripped, &batch), loss_before);
}

#[test]
fn sampler_returns_full_batches_from_the_distribution() {
    let tasks: Vec<MetaRLTask> = (0..5)
        .map(|i| MetaRLTask::new(format!("task-{i}"), "env"))
        .collect();
    let config = MetaRLConfig::default().with_meta_batch_size(3);
    let mut engine = MetaRLEngine::with_seed(config, 11);
    engine
        .setup_task_distribution(TaskDistribution::new(
            "family",
            tasks,
            SamplingStrategy::Uniform,
        ))
        .unwrap();

    for _ in 0..10 {
        let batch = engine.sample_task_batch().unwrap();
        assert_eq!(batch.len(), 3);
        for task in &batch {
            assert!(task.task_id.starts_with("task-"));
        }
    }
}

#[test]
fn sampler_caps_batches_at_distribution_size() {
    let tasks: Vec<MetaRLTask> = (0..2)
        .map(|i| MetaRLTask::new(format!("task-{i}"), "env"))
        .collect();
    let config = MetaRLConfig::default().with_meta_batch_size(8);
    let mut engine = MetaRLEngine::with_seed(config, 11);
    engine
        .setup_task_distribution(TaskDistribution::new(
            "small",
            tasks,
            SamplingStrategy::Uniform,
        ))
        .unwrap();

    assert_eq!(engine.sample_task_batch().unwrap().len(), 2);
}

#[test]
fn scenario_a_quadratic_pull_converges_to_optimum() {
    // 1-D parameter, loss (p - 3)^2, learning rate 0.1, 50 steps.
    let config = MetaRLConfig::default().with_inner_learning_rate(0.1);
    let mut engine = MetaRLEngine::with_seed(config, 11)
        .with_gradient_estimator(Box::new(QuadraticPull { optimum: 3.0 }));
    engine.import_meta_parameters(&[0.0]);

    let task = MetaRLTask::new("quadratic", "env");
    let adapted = engine
        .fast_adaptation(&task, &scalar_batch(0.0), Some(50))
        .unwrap();

    assert!(
        (adapted[0] - 3.0).abs() < 0.01,
        "adapted parameter {} did not reach the optimum",
        adapted[0]
    );
}

#[test]
fn scenario_b_reptile_meta_parameters_reach_shared_optimum() {
    // Two tasks sharing the optimum p = 5; twenty Reptile meta-iterations
    // alternating between them pull the meta-parameters to the optimum.
    let config = MetaRLConfig::default()
        .with_algorithm(MetaAlgorithm::Reptile)
        .with_inner_learning_rate(0.2)
        .with_adaptation_steps(5)
        .with_outer_learning_rate(0.5);
    let mut engine = MetaRLEngine::with_seed(config, 11)
        .with_gradient_estimator(Box::new(QuadraticPull { optimum: 5.0 }));
    engine.import_meta_parameters(&[0.0]);

    let task_a = MetaRLTask::new("shared-a", "env");
    let task_b = MetaRLTask::new("shared-b", "env");
    let context = context_from(scalar_batch(1.0));

    for i in 0..20 {
        let task = if i % 2 == 0 { &task_a } else { &task_b };
        engine.adapt_to_task_reptile(task, &context).unwrap();
    }

    let meta = engine.export_meta_parameters();
    assert!(
        (meta[0] - 5.0).abs() < 0.1,
        "meta-parameter {} did not reach the shared optimum",
        meta[0]
    );
}

#[test]
fn scenario_c_curriculum_always_picks_shortest_episode() {
    let task_a = MetaRLTask::new("short", "env").with_episode_length(10);
    let task_b = MetaRLTask::new("long", "env").with_episode_length(50);
    let config = MetaRLConfig::default().with_meta_batch_size(1);
    let mut engine = MetaRLEngine::with_seed(config, 11);
    engine
        .setup_task_distribution(TaskDistribution::new(
            "curriculum",
            vec![task_b, task_a],
            SamplingStrategy::Curriculum,
        ))
        .unwrap();

    for _ in 0..5 {
        let batch = engine.sample_task_batch().unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].task_id, "short");
    }
}

#[test]
fn scenario_d_zero_dimensions_fail_initialization() {
    let mut engine = MetaRLEngine::with_seed(MetaRLConfig::default(), 11);
    let err = engine.initialize_meta_parameters(0, InitMethod::Uniform);
    assert!(matches!(err, Err(MetaRLError::Initialization(_))));
}

#[test]
fn prioritized_sampling_consults_recorded_history() {
    let tasks: Vec<MetaRLTask> = (0..3)
        .map(|i| MetaRLTask::new(format!("task-{i}"), "env"))
        .collect();
    let config = MetaRLConfig::default()
        .with_meta_batch_size(30)
        .with_adaptation_steps(2);
    let mut engine = MetaRLEngine::with_seed(config, 11);
    engine
        .initialize_meta_parameters(4, InitMethod::Xavier)
        .unwrap();
    engine
        .setup_task_distribution(TaskDistribution::new(
            "prioritized",
            tasks.clone(),
            SamplingStrategy::Prioritized,
        ))
        .unwrap();

    // task-0 records a near-perfect run: support reward 1, query reward 2.
    let well_adapted = AdaptationContext::new(scalar_batch(1.0), scalar_batch(2.0));
    engine.adapt_to_task_maml(&tasks[0], &well_adapted).unwrap();

    let batch = engine.sample_task_batch().unwrap();
    assert_eq!(batch.len(), 30);
    let well_adapted_draws = batch.iter().filter(|t| t.task_id == "task-0").count();
    let fresh_draws = batch.len() - well_adapted_draws;
    assert!(
        fresh_draws > well_adapted_draws,
        "tasks without history should dominate the draw ({fresh_draws} vs {well_adapted_draws})"
    );
}

#[test]
fn adaptation_errors_carry_the_operation_name() {
    struct Failing;
    impl GradientEstimator for Failing {
        fn estimate(&self, _params: &[f64], _batch: &ExperienceBatch) -> Result<Vec<f64>> {
            Err(MetaRLError::UnsupportedAlgorithm(
                "analytic gradient unavailable".to_string(),
            ))
        }
    }

    let mut engine =
        MetaRLEngine::with_seed(MetaRLConfig::default(), 11).with_gradient_estimator(Box::new(Failing));
    engine.import_meta_parameters(&[0.1, 0.2]);

    let err = engine
        .adapt_to_task_maml(&MetaRLTask::new("t", "env"), &context_from(planar_batch()))
        .unwrap_err();
    match err {
        MetaRLError::Adaptation { operation, .. } => {
            assert_eq!(operation, "adapt_to_task_maml");
        }
        other => panic!("expected Adaptation error, got {other}"),
    }
}
