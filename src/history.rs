//! Per-task log of past adaptation outcomes.

use std::collections::HashMap;

use crate::adaptation::MetaRLResult;

/// Append-only store of [`MetaRLResult`]s keyed by task id.
///
/// The engine records every MAML/Reptile adaptation here; the task sampler
/// reads it to prioritize tasks that adapted poorly, and callers can inspect
/// it for diagnostics.
#[derive(Debug, Default)]
pub struct AdaptationHistoryStore {
    entries: HashMap<String, Vec<MetaRLResult>>,
}

impl AdaptationHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a result under its task id.
    pub fn record(&mut self, result: MetaRLResult) {
        self.entries
            .entry(result.task_id.clone())
            .or_default()
            .push(result);
    }

    /// All recorded results for a task, oldest first. Unknown ids yield an
    /// empty slice.
    pub fn for_task(&self, task_id: &str) -> &[MetaRLResult] {
        self.entries
            .get(task_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Most recent result for a task, if any.
    pub fn last_result(&self, task_id: &str) -> Option<&MetaRLResult> {
        self.entries.get(task_id).and_then(|runs| runs.last())
    }

    /// Task ids with at least one recorded run, sorted for deterministic
    /// iteration.
    pub fn task_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Number of distinct tasks with history.
    pub fn num_tasks(&self) -> usize {
        self.entries.len()
    }

    /// Total recorded runs across all tasks.
    pub fn total_runs(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all recorded history.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Summary statistics over all recorded runs.
    pub fn stats(&self) -> HistoryStats {
        let total_runs = self.total_runs();
        let (score_sum, converged_runs) = self
            .entries
            .values()
            .flatten()
            .fold((0.0, 0usize), |(sum, converged), run| {
                (
                    sum + run.adaptation_score,
                    converged + usize::from(run.convergence.converged),
                )
            });

        let avg_adaptation_score = if total_runs == 0 {
            0.0
        } else {
            score_sum / total_runs as f64
        };
        let convergence_rate = if total_runs == 0 {
            0.0
        } else {
            converged_runs as f64 / total_runs as f64
        };

        HistoryStats {
            num_tasks: self.num_tasks(),
            total_runs,
            avg_adaptation_score,
            convergence_rate,
        }
    }
}

/// Aggregate view over the adaptation history.
#[derive(Debug, Clone)]
pub struct HistoryStats {
    /// Distinct tasks with at least one run
    pub num_tasks: usize,
    /// Runs recorded across all tasks
    pub total_runs: usize,
    /// Mean adaptation score over all runs
    pub avg_adaptation_score: f64,
    /// Fraction of runs whose inner loop converged
    pub convergence_rate: f64,
}
