//! Engine facade owning the meta-parameters, history, and sampler.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::adaptation::{fast, maml, meta_gradient, reptile, MetaGradient, MetaRLResult};
use crate::config::{InitMethod, MetaAlgorithm, MetaRLConfig};
use crate::history::AdaptationHistoryStore;
use crate::policy::{self, FiniteDifferenceGradient, GradientEstimator};
use crate::task::{AdaptationContext, ExperienceBatch, MetaRLTask, TaskDistribution, TaskSampler};
use crate::{MetaRLError, Result};

/// Step budget used by fast adaptation when the caller does not pass one.
pub const DEFAULT_FAST_ADAPTATION_STEPS: usize = 3;

/// The meta-RL adaptation engine.
///
/// Owns the only long-lived mutable state: the shared meta-parameter vector,
/// the per-task adaptation history, the task sampler, and the RNG. All
/// mutation goes through `&mut self`, so a single writer is guaranteed by
/// construction; callers needing cross-task parallelism can snapshot the
/// parameters via [`export_meta_parameters`](Self::export_meta_parameters)
/// and drive the module-level adaptation functions on the copy.
pub struct MetaRLEngine {
    config: MetaRLConfig,
    meta_parameters: Vec<f64>,
    estimator: Box<dyn GradientEstimator>,
    history: AdaptationHistoryStore,
    sampler: TaskSampler,
    rng: StdRng,
}

impl MetaRLEngine {
    /// Create an engine with an entropy-seeded RNG and the finite-difference
    /// gradient estimator.
    pub fn new(config: MetaRLConfig) -> Self {
        Self::from_rng(config, StdRng::from_entropy())
    }

    /// Create an engine with a fixed seed for reproducible initialization
    /// and sampling.
    pub fn with_seed(config: MetaRLConfig, seed: u64) -> Self {
        Self::from_rng(config, StdRng::seed_from_u64(seed))
    }

    fn from_rng(config: MetaRLConfig, rng: StdRng) -> Self {
        Self {
            config,
            meta_parameters: Vec::new(),
            estimator: Box::new(FiniteDifferenceGradient::new()),
            history: AdaptationHistoryStore::new(),
            sampler: TaskSampler::new(),
            rng,
        }
    }

    /// Builder: replace the gradient estimation strategy.
    pub fn with_gradient_estimator(mut self, estimator: Box<dyn GradientEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn config(&self) -> &MetaRLConfig {
        &self.config
    }

    /// Whether a meta-parameter vector exists yet.
    pub fn is_initialized(&self) -> bool {
        !self.meta_parameters.is_empty()
    }

    /// Sample a fresh meta-parameter vector of length `dimensions`.
    ///
    /// Fails with [`MetaRLError::Initialization`] when `dimensions` is zero.
    pub fn initialize_meta_parameters(
        &mut self,
        dimensions: usize,
        method: InitMethod,
    ) -> Result<()> {
        self.meta_parameters = policy::initialize_parameters(dimensions, method, &mut self.rng)?;
        info!(dimensions, ?method, "meta-parameters initialized");
        Ok(())
    }

    /// Adapt to one task using the configured algorithm.
    ///
    /// The `ProtoNet` tag is recognized in configuration but has no
    /// adaptation path and fails with
    /// [`MetaRLError::UnsupportedAlgorithm`].
    pub fn adapt_to_task(
        &mut self,
        task: &MetaRLTask,
        context: &AdaptationContext,
    ) -> Result<MetaRLResult> {
        match self.config.algorithm {
            MetaAlgorithm::MAML => self.adapt_to_task_maml(task, context),
            MetaAlgorithm::Reptile => self.adapt_to_task_reptile(task, context),
            MetaAlgorithm::ProtoNet => Err(MetaRLError::UnsupportedAlgorithm(
                "ProtoNet is declared in the configuration but has no adaptation path".to_string(),
            )),
        }
    }

    /// MAML adaptation: meta-parameters are read but never mutated.
    pub fn adapt_to_task_maml(
        &mut self,
        task: &MetaRLTask,
        context: &AdaptationContext,
    ) -> Result<MetaRLResult> {
        self.ensure_initialized("adapt_to_task_maml")?;
        let result = maml::adapt(
            &self.config,
            &self.meta_parameters,
            self.estimator.as_ref(),
            task,
            context,
        )
        .map_err(|e| Self::tag("adapt_to_task_maml", e))?;
        self.history.record(result.clone());
        Ok(result)
    }

    /// Reptile adaptation: nudges the shared meta-parameters toward the
    /// adapted solution.
    pub fn adapt_to_task_reptile(
        &mut self,
        task: &MetaRLTask,
        context: &AdaptationContext,
    ) -> Result<MetaRLResult> {
        self.ensure_initialized("adapt_to_task_reptile")?;
        let result = reptile::adapt(
            &self.config,
            &mut self.meta_parameters,
            self.estimator.as_ref(),
            task,
            context,
        )
        .map_err(|e| Self::tag("adapt_to_task_reptile", e))?;
        self.history.record(result.clone());
        Ok(result)
    }

    /// Aggregate a meta-gradient over a batch of tasks and contexts.
    ///
    /// Does not mutate the meta-parameters; apply the result with
    /// [`apply_meta_gradient`](Self::apply_meta_gradient).
    pub fn compute_meta_gradients(
        &self,
        tasks: &[MetaRLTask],
        contexts: &[AdaptationContext],
    ) -> Result<MetaGradient> {
        self.ensure_initialized("compute_meta_gradients")?;
        meta_gradient::compute(
            &self.config,
            &self.meta_parameters,
            self.estimator.as_ref(),
            tasks,
            contexts,
        )
        .map_err(|e| Self::tag("compute_meta_gradients", e))
    }

    /// Apply a computed meta-gradient to the shared meta-parameters:
    /// `theta[i] -= outer_learning_rate * policy_gradient[i]`.
    pub fn apply_meta_gradient(&mut self, gradient: &MetaGradient) -> Result<()> {
        self.ensure_initialized("apply_meta_gradient")?;
        for (p, g) in self
            .meta_parameters
            .iter_mut()
            .zip(&gradient.policy_gradient)
        {
            *p -= self.config.outer_learning_rate * g;
        }
        debug!(
            outer_loop_loss = gradient.outer_loop_loss,
            "meta-gradient applied"
        );
        Ok(())
    }

    /// Few-shot adaptation with a reduced, unconditional step budget
    /// (default [`DEFAULT_FAST_ADAPTATION_STEPS`]). Returns the adapted
    /// vector without touching the meta-parameters or the history.
    pub fn fast_adaptation(
        &self,
        task: &MetaRLTask,
        few_shot_batch: &ExperienceBatch,
        max_steps: Option<usize>,
    ) -> Result<Vec<f64>> {
        self.ensure_initialized("fast_adaptation")?;
        let steps = max_steps.unwrap_or(DEFAULT_FAST_ADAPTATION_STEPS);
        let adapted = fast::adapt(
            &self.meta_parameters,
            few_shot_batch,
            steps,
            self.config.inner_learning_rate,
            self.estimator.as_ref(),
        )
        .map_err(|e| Self::tag("fast_adaptation", e))?;
        debug!(task = %task.task_id, steps, "fast adaptation finished");
        Ok(adapted)
    }

    /// Install the task distribution used by
    /// [`sample_task_batch`](Self::sample_task_batch).
    pub fn setup_task_distribution(&mut self, distribution: TaskDistribution) -> Result<()> {
        self.sampler.set_distribution(distribution)
    }

    /// Draw one meta-batch of up to `meta_batch_size` tasks using the
    /// distribution's strategy.
    pub fn sample_task_batch(&mut self) -> Result<Vec<MetaRLTask>> {
        self.sampler
            .sample_batch(self.config.meta_batch_size, &self.history, &mut self.rng)
    }

    /// All recorded adaptation results for a task, oldest first; empty for
    /// unknown ids.
    pub fn get_adaptation_history(&self, task_id: &str) -> &[MetaRLResult] {
        self.history.for_task(task_id)
    }

    /// Read access to the full adaptation history.
    pub fn history(&self) -> &AdaptationHistoryStore {
        &self.history
    }

    /// Defensive copy of the current meta-parameter vector (empty before
    /// initialization).
    pub fn export_meta_parameters(&self) -> Vec<f64> {
        self.meta_parameters.clone()
    }

    /// Replace the meta-parameter vector with a defensive copy of `params`.
    ///
    /// No dimension validation is performed; the imported length defines the
    /// parameter space from here on.
    pub fn import_meta_parameters(&mut self, params: &[f64]) {
        self.meta_parameters = params.to_vec();
        info!(dimensions = params.len(), "meta-parameters imported");
    }

    fn ensure_initialized(&self, operation: &str) -> Result<()> {
        if self.meta_parameters.is_empty() {
            return Err(MetaRLError::UninitializedParameters(format!(
                "{operation} requires initialize_meta_parameters or import_meta_parameters first"
            )));
        }
        Ok(())
    }

    /// Re-tag inner failures with the public operation name. Argument
    /// validation errors surface unchanged.
    fn tag(operation: &'static str, error: MetaRLError) -> MetaRLError {
        match error {
            e @ MetaRLError::InvalidArgument(_) => e,
            e => MetaRLError::adaptation(operation, e),
        }
    }
}
