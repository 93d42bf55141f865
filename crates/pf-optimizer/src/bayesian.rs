//! Bayesian optimization with a Gaussian-process surrogate and an
//! upper-confidence-bound acquisition function.
//!
//! The loop works in the unit hypercube:
//!
//! 1. Seed the model with `min(max(2 * dim, min_initial), budget / 3)`
//!    uniform random points.
//! 2. Each iteration sets the RBF length scale to the median pairwise
//!    distance between observed points, standardizes the observed values and
//!    fits the GP.
//! 3. The next point is the best of a batch of uniform random candidates
//!    under `UCB = mean + kappa * std_dev`. If the fit fails (kernel matrix
//!    not positive definite) one uniform random point is used instead.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::engine::SearchEngine;
use crate::error::{PfError, PfResult};
use crate::gp::{GaussianProcess, RbfKernel};
use crate::objective::Evaluator;
use crate::space::ParameterSpace;

/// Tuning knobs for [`BayesianOptimizer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BayesianSettings {
    /// Exploration weight in `mean + kappa * std_dev`.
    pub kappa: f64,
    /// Observation noise added to the kernel diagonal.
    pub noise: f64,
    /// Kernel amplitude.
    pub signal_variance: f64,
    /// Lower bound on the number of random initial points.
    pub min_initial_points: usize,
    /// Lower bound on acquisition candidates per iteration.
    pub min_candidates: usize,
    /// Acquisition candidates per dimension.
    pub candidates_per_dimension: usize,
    pub min_length_scale: f64,
    /// Length scale used while fewer than two points are observed.
    pub default_length_scale: f64,
}

impl Default for BayesianSettings {
    fn default() -> Self {
        Self {
            kappa: 2.576,
            noise: 1e-4,
            signal_variance: 1.0,
            min_initial_points: 5,
            min_candidates: 100,
            candidates_per_dimension: 20,
            min_length_scale: 0.1,
            default_length_scale: 0.5,
        }
    }
}

impl BayesianSettings {
    pub fn validate(&self) -> PfResult<()> {
        if !(self.kappa >= 0.0) {
            return Err(PfError::InvalidConfig("kappa must be non-negative".into()));
        }
        if !(self.noise > 0.0) || !(self.signal_variance > 0.0) {
            return Err(PfError::InvalidConfig(
                "noise and signal_variance must be positive".into(),
            ));
        }
        if !(self.min_length_scale > 0.0) || !(self.default_length_scale > 0.0) {
            return Err(PfError::InvalidConfig("length scales must be positive".into()));
        }
        if self.min_candidates == 0 && self.candidates_per_dimension == 0 {
            return Err(PfError::InvalidConfig(
                "at least one acquisition candidate is required".into(),
            ));
        }
        Ok(())
    }

    /// Random points drawn before the surrogate takes over.
    pub fn initial_points(&self, dimensions: usize, max_evaluations: usize) -> usize {
        (2 * dimensions)
            .max(self.min_initial_points)
            .min(max_evaluations / 3)
    }

    pub fn candidates(&self, dimensions: usize) -> usize {
        self.min_candidates
            .max(self.candidates_per_dimension * dimensions)
    }
}

/// GP-UCB search engine.
#[derive(Debug, Clone, Default)]
pub struct BayesianOptimizer {
    settings: BayesianSettings,
}

impl BayesianOptimizer {
    pub fn new(settings: BayesianSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &BayesianSettings {
        &self.settings
    }

    /// Median pairwise Euclidean distance, floored at `min_length_scale`.
    pub fn length_scale(&self, points: &[Vec<f64>]) -> f64 {
        if points.len() < 2 {
            return self.settings.default_length_scale;
        }
        let mut distances = Vec::with_capacity(points.len() * (points.len() - 1) / 2);
        for (i, a) in points.iter().enumerate() {
            for b in &points[i + 1..] {
                let sq: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
                distances.push(sq.sqrt());
            }
        }
        distances.sort_by(f64::total_cmp);
        distances[distances.len() / 2].max(self.settings.min_length_scale)
    }

    /// Pick the next unit-space point: the UCB arg-max over random
    /// candidates, or a plain random point when the GP cannot be fitted.
    fn propose(
        &self,
        points: &[Vec<f64>],
        values: &[f64],
        space: &ParameterSpace,
        rng: &mut dyn RngCore,
    ) -> Vec<f64> {
        let kernel = RbfKernel::new(
            self.length_scale(points),
            self.settings.signal_variance,
            self.settings.noise,
        );
        let targets = standardize(values);
        let Some(gp) = GaussianProcess::fit(points.to_vec(), &targets, kernel) else {
            warn!(
                "GP fit failed with {} observations (length scale {:.4}); sampling at random",
                points.len(),
                kernel.length_scale
            );
            return space.sample_unit(rng);
        };

        let mut best: Option<(Vec<f64>, f64)> = None;
        for _ in 0..self.settings.candidates(space.dimensions()) {
            let candidate = space.sample_unit(rng);
            let score = gp.predict(&candidate).ucb(self.settings.kappa);
            let better = match &best {
                None => true,
                Some((_, best_score)) => score > *best_score,
            };
            if better {
                best = Some((candidate, score));
            }
        }
        match best {
            Some((candidate, score)) => {
                debug!("UCB winner {:?} with score {:.4}", candidate, score);
                candidate
            }
            None => space.sample_unit(rng),
        }
    }
}

/// `(y - mean) / std` with the population standard deviation; a zero
/// spread divides by one instead.
pub fn standardize(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    let std = variance.sqrt();
    let std = if std < 1e-10 { 1.0 } else { std };
    values.iter().map(|v| (v - mean) / std).collect()
}

impl SearchEngine for BayesianOptimizer {
    fn name(&self) -> &'static str {
        "bayesian"
    }

    fn search(
        &self,
        space: &ParameterSpace,
        evaluator: &mut Evaluator<'_>,
        rng: &mut dyn RngCore,
    ) -> PfResult<()> {
        self.settings.validate()?;
        let initial = self
            .settings
            .initial_points(space.dimensions(), evaluator.max_evaluations());
        let mut points: Vec<Vec<f64>> = Vec::with_capacity(evaluator.max_evaluations());
        let mut values: Vec<f64> = Vec::with_capacity(evaluator.max_evaluations());

        for _ in 0..initial {
            if !evaluator.has_budget() {
                return Ok(());
            }
            let unit = space.sample_unit(rng);
            values.push(evaluator.evaluate(space.denormalize(&unit))?);
            points.push(unit);
        }
        debug!("Seeded GP with {} random points", points.len());

        while evaluator.has_budget() {
            let unit = self.propose(&points, &values, space, rng);
            values.push(evaluator.evaluate(space.denormalize(&unit))?);
            points.push(unit);
        }
        Ok(())
    }
}
