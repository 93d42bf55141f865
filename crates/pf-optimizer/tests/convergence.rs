//! Convergence checks on `f(x) = -(x - 3)^2` over `[-10, 10]` with a budget
//! of 60 evaluations, repeated over fixed seeds.

use pf_optimizer::{
    bayesian_optimize, differential_evolution, infallible, random_search, OptimizerResult,
    PfResult, ParameterSpace,
};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

const BUDGET: usize = 60;
const SEEDS: std::ops::Range<u64> = 100..120;

type Engine = fn(
    &ParameterSpace,
    &mut dyn pf_optimizer::Objective,
    usize,
    &mut dyn RngCore,
) -> PfResult<OptimizerResult>;

fn parabola_space() -> ParameterSpace {
    ParameterSpace::new().add_continuous("x", -10.0, 10.0)
}

fn run(engine: Engine, seed: u64) -> OptimizerResult {
    let mut objective = infallible(|p| -(p["x"] - 3.0).powi(2));
    let mut rng = StdRng::seed_from_u64(seed);
    engine(&parabola_space(), &mut objective, BUDGET, &mut rng).unwrap()
}

fn hits(engine: Engine) -> usize {
    SEEDS
        .filter(|&seed| (run(engine, seed).best_params["x"] - 3.0).abs() < 0.5)
        .count()
}

fn mean_best(engine: Engine) -> f64 {
    let total: f64 = SEEDS.map(|seed| run(engine, seed).best_value).sum();
    total / SEEDS.count() as f64
}

#[test]
fn budgets_are_never_exceeded() {
    for engine in [random_search as Engine, bayesian_optimize, differential_evolution] {
        for seed in 0..5 {
            let result = run(engine, seed);
            assert!(result.total_evaluations <= BUDGET);
            assert_eq!(result.total_evaluations, result.evaluations.len());
        }
    }
}

#[test]
fn bayesian_locates_the_optimum() {
    let found = hits(bayesian_optimize);
    assert!(found >= 18, "bayesian found the optimum for {found}/20 seeds");
}

#[test]
fn differential_evolution_locates_the_optimum() {
    let found = hits(differential_evolution);
    assert!(found >= 15, "differential evolution found the optimum for {found}/20 seeds");
}

#[test]
fn bayesian_beats_random_on_average() {
    let bayes = mean_best(bayesian_optimize);
    let random = mean_best(random_search);
    assert!(bayes >= random, "bayesian {bayes} vs random {random}");
}

#[test]
fn differential_evolution_beats_random_on_average() {
    let de = mean_best(differential_evolution);
    let random = mean_best(random_search);
    assert!(de >= random, "differential evolution {de} vs random {random}");
}

#[test]
fn best_value_matches_the_evaluation_log() {
    for engine in [random_search as Engine, bayesian_optimize, differential_evolution] {
        let result = run(engine, 7);
        let first_max = result
            .evaluations
            .iter()
            .find(|e| e.value == result.best_value)
            .unwrap();
        assert!(result.evaluations.iter().all(|e| e.value <= result.best_value));
        assert_eq!(first_max.params, result.best_params);
    }
}
