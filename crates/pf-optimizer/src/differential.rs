//! Differential evolution (DE/rand/1/bin) in the unit hypercube.

use rand::seq::index;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::SearchEngine;
use crate::error::{PfError, PfResult};
use crate::objective::Evaluator;
use crate::space::ParameterSpace;

/// Tuning knobs for [`DifferentialEvolution`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifferentialEvolutionSettings {
    /// Differential weight `F`.
    pub mutation: f64,
    /// Crossover probability `CR`.
    pub crossover: f64,
    pub min_population: usize,
    pub population_per_dimension: usize,
}

impl Default for DifferentialEvolutionSettings {
    fn default() -> Self {
        Self {
            mutation: 0.8,
            crossover: 0.9,
            min_population: 15,
            population_per_dimension: 4,
        }
    }
}

impl DifferentialEvolutionSettings {
    pub fn validate(&self) -> PfResult<()> {
        if !(self.mutation > 0.0 && self.mutation <= 2.0) {
            return Err(PfError::InvalidConfig(format!(
                "mutation factor must lie in (0, 2], got {}",
                self.mutation
            )));
        }
        if !(0.0..=1.0).contains(&self.crossover) {
            return Err(PfError::InvalidConfig(format!(
                "crossover probability must lie in [0, 1], got {}",
                self.crossover
            )));
        }
        if self.min_population < 4 {
            return Err(PfError::InvalidConfig(
                "population needs at least 4 members".into(),
            ));
        }
        Ok(())
    }

    pub fn population_size(&self, dimensions: usize) -> usize {
        (self.population_per_dimension * dimensions).max(self.min_population)
    }

    /// Generations that fit in the budget after the initial population.
    pub fn max_generations(&self, population: usize, max_evaluations: usize) -> usize {
        (max_evaluations.saturating_sub(population) / population).max(1)
    }
}

/// Population-based stochastic search with greedy selection.
#[derive(Debug, Clone, Default)]
pub struct DifferentialEvolution {
    settings: DifferentialEvolutionSettings,
}

impl DifferentialEvolution {
    pub fn new(settings: DifferentialEvolutionSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &DifferentialEvolutionSettings {
        &self.settings
    }

    /// Mutant for member `i`: `pop[r1] + F * (pop[r2] - pop[r3])` with
    /// out-of-bounds coordinates bounced back toward `pop[i]`.
    pub(crate) fn mutant(
        &self,
        population: &[Vec<f64>],
        i: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<f64> {
        let [r1, r2, r3] = distinct_others(i, population.len(), rng);
        let current = &population[i];
        let f = self.settings.mutation;
        (0..current.len())
            .map(|j| {
                let mut v = population[r1][j] + f * (population[r2][j] - population[r3][j]);
                if v < 0.0 {
                    v = rng.random::<f64>() * current[j];
                } else if v > 1.0 {
                    v = current[j] + rng.random::<f64>() * (1.0 - current[j]);
                }
                v.clamp(0.0, 1.0)
            })
            .collect()
    }

    /// Binomial crossover; coordinate `j_rand` always comes from the mutant.
    pub(crate) fn crossover(
        &self,
        current: &[f64],
        mutant: &[f64],
        rng: &mut dyn RngCore,
    ) -> Vec<f64> {
        let j_rand = rng.random_range(0..current.len());
        current
            .iter()
            .zip(mutant)
            .enumerate()
            .map(|(j, (&c, &m))| {
                if rng.random::<f64>() < self.settings.crossover || j == j_rand {
                    m
                } else {
                    c
                }
            })
            .collect()
    }

    pub(crate) fn trial(
        &self,
        population: &[Vec<f64>],
        i: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<f64> {
        let mutant = self.mutant(population, i, rng);
        self.crossover(&population[i], &mutant, rng)
    }
}

/// Three distinct indices in `0..n`, none equal to `exclude`.
fn distinct_others(exclude: usize, n: usize, rng: &mut dyn RngCore) -> [usize; 3] {
    let picks = index::sample(rng, n - 1, 3);
    let shift = |k: usize| if k >= exclude { k + 1 } else { k };
    [shift(picks.index(0)), shift(picks.index(1)), shift(picks.index(2))]
}

impl SearchEngine for DifferentialEvolution {
    fn name(&self) -> &'static str {
        "differential_evolution"
    }

    fn search(
        &self,
        space: &ParameterSpace,
        evaluator: &mut Evaluator<'_>,
        rng: &mut dyn RngCore,
    ) -> PfResult<()> {
        self.settings.validate()?;
        let size = self.settings.population_size(space.dimensions());
        let generations = self
            .settings
            .max_generations(size, evaluator.max_evaluations());

        let mut population: Vec<Vec<f64>> = Vec::with_capacity(size);
        let mut fitness: Vec<f64> = Vec::with_capacity(size);
        for _ in 0..size {
            if !evaluator.has_budget() {
                return Ok(());
            }
            let member = space.sample_unit(rng);
            fitness.push(evaluator.evaluate(space.denormalize(&member))?);
            population.push(member);
        }

        for generation in 0..generations {
            for i in 0..size {
                if !evaluator.has_budget() {
                    return Ok(());
                }
                let trial = self.trial(&population, i, rng);
                let value = evaluator.evaluate(space.denormalize(&trial))?;
                if value >= fitness[i] {
                    population[i] = trial;
                    fitness[i] = value;
                }
            }
            debug!(
                "Generation {} of {}: best {:?}",
                generation + 1,
                generations,
                evaluator.best_value()
            );
        }
        Ok(())
    }
}
