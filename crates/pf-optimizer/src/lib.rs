//! # pf-optimizer
//!
//! Black-box parameter optimization for ParamForge.
//!
//! Four interchangeable engines maximize a caller-supplied objective over a
//! box-bounded, optionally stepped parameter space: exhaustive grid search,
//! uniform random search, Bayesian optimization with a Gaussian-process
//! surrogate, and differential evolution. Every engine implements
//! [`SearchEngine`] and returns an [`OptimizerResult`]; the library performs
//! no I/O and keeps no state between runs.
//!
//! ```no_run
//! use pf_optimizer::{infallible, optimize, OptimizerConfig, ParameterSpace, Strategy};
//!
//! let space = ParameterSpace::new()
//!     .add_stepped("short_period", 5.0, 20.0, 1.0)
//!     .add_continuous("stop_loss", 0.01, 0.1);
//! let mut objective = infallible(|p| -(p["short_period"] - 12.0).powi(2) - p["stop_loss"]);
//! let config = OptimizerConfig::new(Strategy::Bayesian)
//!     .with_max_evaluations(60)
//!     .with_seed(7);
//! let result = optimize(&space, &mut objective, &config).unwrap();
//! println!("best {:?} -> {}", result.best_params, result.best_value);
//! ```

mod bayesian;
mod config;
mod differential;
mod engine;
mod error;
pub mod gp;
mod grid;
mod objective;
mod random;
mod result;
mod run;
mod space;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

pub use bayesian::{standardize, BayesianOptimizer, BayesianSettings};
pub use config::{OptimizerConfig, DEFAULT_MAX_EVALUATIONS};
pub use differential::{DifferentialEvolution, DifferentialEvolutionSettings};
pub use engine::{SearchEngine, Strategy};
pub use error::{BoxError, PfError, PfResult};
pub use grid::GridSearch;
pub use objective::{infallible, EvaluationBudget, EvaluationPolicy, Evaluator, Objective};
pub use random::RandomSearch;
pub use result::{EvaluatedPoint, OptimizerResult, ResultSummary};
pub use run::{OptimizationRun, RunId, RunState};
pub use space::{GridPoints, ParamMap, ParameterRange, ParameterSpace, DEFAULT_GRID_DIVISIONS};

/// Evaluate the grid in order, up to `max_evaluations` points.
pub fn grid_search(
    space: &ParameterSpace,
    objective: &mut dyn Objective,
    max_evaluations: usize,
) -> PfResult<OptimizerResult> {
    // Grid search ignores the generator.
    let mut rng = StdRng::seed_from_u64(0);
    let budget = EvaluationBudget::new(max_evaluations);
    GridSearch::new().run(space, objective, &budget, &mut rng)
}

/// Uniform random sampling over the unit hypercube.
pub fn random_search(
    space: &ParameterSpace,
    objective: &mut dyn Objective,
    max_evaluations: usize,
    rng: &mut dyn RngCore,
) -> PfResult<OptimizerResult> {
    let budget = EvaluationBudget::new(max_evaluations);
    RandomSearch::new().run(space, objective, &budget, rng)
}

/// GP-UCB Bayesian optimization with default settings.
pub fn bayesian_optimize(
    space: &ParameterSpace,
    objective: &mut dyn Objective,
    max_evaluations: usize,
    rng: &mut dyn RngCore,
) -> PfResult<OptimizerResult> {
    let budget = EvaluationBudget::new(max_evaluations);
    BayesianOptimizer::default().run(space, objective, &budget, rng)
}

/// DE/rand/1/bin with default settings. May stop short of
/// `max_evaluations` when the budget is not a multiple of the population.
pub fn differential_evolution(
    space: &ParameterSpace,
    objective: &mut dyn Objective,
    max_evaluations: usize,
    rng: &mut dyn RngCore,
) -> PfResult<OptimizerResult> {
    let budget = EvaluationBudget::new(max_evaluations);
    DifferentialEvolution::default().run(space, objective, &budget, rng)
}

/// Run the strategy selected in `config`.
pub fn optimize(
    space: &ParameterSpace,
    objective: &mut dyn Objective,
    config: &OptimizerConfig,
) -> PfResult<OptimizerResult> {
    config.validate()?;
    let mut rng = config.rng();
    config
        .strategy
        .engine(config)
        .run(space, objective, &config.budget(), &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_search_example() {
        let space = ParameterSpace::new().add_stepped("x", 0.0, 10.0, 5.0);
        let mut objective = infallible(|p| p["x"]);
        let result = grid_search(&space, &mut objective, 50).unwrap();
        assert_eq!(result.total_evaluations, 3);
        assert_eq!(result.best_value, 10.0);
        assert_eq!(result.best_params["x"], 10.0);
    }

    #[test]
    fn free_functions_respect_the_budget() {
        let space = ParameterSpace::new()
            .add_continuous("a", 0.0, 1.0)
            .add_stepped("b", 1.0, 9.0, 2.0);
        let mut rng = StdRng::seed_from_u64(21);
        for n in [1, 7, 33] {
            let mut objective = infallible(|p| p["a"] * p["b"]);
            let results = [
                random_search(&space, &mut objective, n, &mut rng).unwrap(),
                bayesian_optimize(&space, &mut objective, n, &mut rng).unwrap(),
                differential_evolution(&space, &mut objective, n, &mut rng).unwrap(),
                grid_search(&space, &mut objective, n).unwrap(),
            ];
            for result in &results {
                assert!(result.total_evaluations <= n);
            }
        }
    }

    #[test]
    fn optimize_dispatches_by_strategy() {
        let space = ParameterSpace::new().add_stepped("x", 0.0, 10.0, 5.0);
        for strategy in Strategy::ALL {
            let config = OptimizerConfig::new(strategy)
                .with_max_evaluations(40)
                .with_seed(5);
            let mut objective = infallible(|p| p["x"]);
            let result = optimize(&space, &mut objective, &config).unwrap();
            assert!(result.total_evaluations <= 40);
            assert_eq!(result.best_value, 10.0, "{strategy}");
        }
    }

    #[test]
    fn optimize_is_reproducible_with_a_seed() {
        let space = ParameterSpace::new()
            .add_continuous("x", -5.0, 5.0)
            .add_continuous("y", -5.0, 5.0);
        let config = OptimizerConfig::new(Strategy::DifferentialEvolution)
            .with_max_evaluations(45)
            .with_seed(77);
        let run = || {
            let mut objective = infallible(|p| -(p["x"].powi(2) + p["y"].powi(2)));
            optimize(&space, &mut objective, &config).unwrap()
        };
        assert_eq!(run(), run());
    }
}
