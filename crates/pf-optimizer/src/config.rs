//! Run configuration.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::bayesian::BayesianSettings;
use crate::differential::DifferentialEvolutionSettings;
use crate::engine::Strategy;
use crate::error::PfResult;
use crate::objective::{EvaluationBudget, EvaluationPolicy};

/// Evaluation budget used when the caller does not set one.
pub const DEFAULT_MAX_EVALUATIONS: usize = 50;

/// Top-level configuration for an optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Which search strategy to use.
    pub strategy: Strategy,

    /// Maximum number of objective evaluations.
    pub max_evaluations: usize,

    /// RNG seed for reproducible runs; `None` seeds from the OS.
    pub seed: Option<u64>,

    /// How objective failures are handled.
    pub policy: EvaluationPolicy,

    /// Optional wall-clock limit; the run stops early once it passes.
    pub time_limit: Option<Duration>,

    pub bayesian: BayesianSettings,
    pub differential_evolution: DifferentialEvolutionSettings,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            max_evaluations: DEFAULT_MAX_EVALUATIONS,
            seed: None,
            policy: EvaluationPolicy::FailFast,
            time_limit: None,
            bayesian: BayesianSettings::default(),
            differential_evolution: DifferentialEvolutionSettings::default(),
        }
    }
}

impl OptimizerConfig {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    pub fn with_max_evaluations(mut self, n: usize) -> Self {
        self.max_evaluations = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Score failing evaluations with `value` instead of aborting.
    pub fn with_penalty(mut self, value: f64) -> Self {
        self.policy = EvaluationPolicy::Penalize { value };
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_bayesian(mut self, settings: BayesianSettings) -> Self {
        self.bayesian = settings;
        self
    }

    pub fn with_differential_evolution(mut self, settings: DifferentialEvolutionSettings) -> Self {
        self.differential_evolution = settings;
        self
    }

    pub fn budget(&self) -> EvaluationBudget {
        EvaluationBudget {
            max_evaluations: self.max_evaluations,
            policy: self.policy,
            time_limit: self.time_limit,
        }
    }

    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        }
    }

    pub fn validate(&self) -> PfResult<()> {
        self.budget().validate()?;
        self.bayesian.validate()?;
        self.differential_evolution.validate()
    }
}
