//! The capability interface shared by all search strategies.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

use crate::bayesian::BayesianOptimizer;
use crate::config::OptimizerConfig;
use crate::differential::DifferentialEvolution;
use crate::error::{PfError, PfResult};
use crate::grid::GridSearch;
use crate::objective::{EvaluationBudget, Evaluator, Objective};
use crate::random::RandomSearch;
use crate::result::OptimizerResult;
use crate::space::ParameterSpace;

/// Common trait for all search strategies.
///
/// Implementors only provide [`search`](Self::search); validation and
/// result assembly live in [`run`](Self::run).
pub trait SearchEngine {
    /// Human-readable strategy name.
    fn name(&self) -> &'static str;

    /// Drive `evaluator` until the strategy is done or the budget runs out.
    fn search(
        &self,
        space: &ParameterSpace,
        evaluator: &mut Evaluator<'_>,
        rng: &mut dyn RngCore,
    ) -> PfResult<()>;

    /// Validate inputs, run the search and collect the result.
    fn run(
        &self,
        space: &ParameterSpace,
        objective: &mut dyn Objective,
        budget: &EvaluationBudget,
        rng: &mut dyn RngCore,
    ) -> PfResult<OptimizerResult> {
        space.validate()?;
        budget.validate()?;
        info!(
            "Starting {} search over {} parameters with {} evaluations",
            self.name(),
            space.dimensions(),
            budget.max_evaluations
        );

        let mut evaluator = Evaluator::new(objective, budget);
        self.search(space, &mut evaluator, rng)?;
        let result = evaluator.finish();

        info!(
            "{} search finished: best value {} after {} evaluations",
            self.name(),
            result.best_value,
            result.total_evaluations
        );
        Ok(result)
    }
}

/// Strategy tag used to select an engine by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Grid,
    Random,
    #[default]
    Bayesian,
    DifferentialEvolution,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::Grid,
        Strategy::Random,
        Strategy::Bayesian,
        Strategy::DifferentialEvolution,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::Random => "random",
            Self::Bayesian => "bayesian",
            Self::DifferentialEvolution => "differential_evolution",
        }
    }

    /// Build the engine for this strategy with the settings in `config`.
    pub fn engine(&self, config: &OptimizerConfig) -> Box<dyn SearchEngine> {
        match self {
            Self::Grid => Box::new(GridSearch::new()),
            Self::Random => Box::new(RandomSearch::new()),
            Self::Bayesian => Box::new(BayesianOptimizer::new(config.bayesian.clone())),
            Self::DifferentialEvolution => Box::new(DifferentialEvolution::new(
                config.differential_evolution.clone(),
            )),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = PfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "grid" => Ok(Self::Grid),
            "random" => Ok(Self::Random),
            "bayesian" | "bayes" => Ok(Self::Bayesian),
            "differential_evolution" | "de" => Ok(Self::DifferentialEvolution),
            _ => Err(PfError::UnknownStrategy(s.to_string())),
        }
    }
}
