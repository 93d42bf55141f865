//! Exhaustive grid search.

use rand::RngCore;

use crate::engine::SearchEngine;
use crate::error::PfResult;
use crate::objective::Evaluator;
use crate::space::ParameterSpace;

/// Evaluates grid points in generation order until the grid or the budget
/// runs out. Deterministic; the RNG is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridSearch;

impl GridSearch {
    pub fn new() -> Self {
        Self
    }
}

impl SearchEngine for GridSearch {
    fn name(&self) -> &'static str {
        "grid"
    }

    fn search(
        &self,
        space: &ParameterSpace,
        evaluator: &mut Evaluator<'_>,
        _rng: &mut dyn RngCore,
    ) -> PfResult<()> {
        for params in space.grid_points() {
            if !evaluator.has_budget() {
                break;
            }
            evaluator.evaluate(params)?;
        }
        Ok(())
    }
}
