//! Run tracking: one record per optimization call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::config::OptimizerConfig;
use crate::objective::Objective;
use crate::result::OptimizerResult;
use crate::space::ParameterSpace;

/// Unique optimization run identifier.
pub type RunId = Uuid;

/// Lifecycle state for an optimization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Record of a single optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRun {
    pub id: RunId,
    pub config: OptimizerConfig,
    pub space: ParameterSpace,
    pub state: RunState,
    pub result: Option<OptimizerResult>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl OptimizationRun {
    pub fn new(space: ParameterSpace, config: OptimizerConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            space,
            state: RunState::Pending,
            result: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    /// Create a run record and execute it immediately.
    pub fn execute(
        space: ParameterSpace,
        objective: &mut dyn Objective,
        config: OptimizerConfig,
    ) -> Self {
        let mut run = Self::new(space, config);
        run.start(objective);
        run
    }

    /// Run the configured strategy. Failures are recorded, not returned;
    /// a failed run keeps no partial result.
    pub fn start(&mut self, objective: &mut dyn Objective) {
        self.mark_running();
        match crate::optimize(&self.space, objective, &self.config) {
            Ok(result) => self.mark_completed(result),
            Err(e) => self.mark_failed(e.to_string()),
        }
    }

    pub fn mark_running(&mut self) {
        self.state = RunState::Running;
        self.started_at = Some(Utc::now());
        info!("Optimization run {} started ({})", self.id, self.config.strategy);
    }

    pub fn mark_completed(&mut self, result: OptimizerResult) {
        self.state = RunState::Completed;
        self.finished_at = Some(Utc::now());
        self.result = Some(result);
    }

    pub fn mark_failed(&mut self, error: String) {
        error!("Optimization run {} failed: {}", self.id, error);
        self.state = RunState::Failed;
        self.finished_at = Some(Utc::now());
        self.error = Some(error);
    }

    /// Wall-clock duration, once finished.
    pub fn duration(&self) -> Option<chrono::Duration> {
        Some(self.finished_at? - self.started_at?)
    }

    pub fn best_value(&self) -> Option<f64> {
        self.result.as_ref().map(|r| r.best_value)
    }
}
