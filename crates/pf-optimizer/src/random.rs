//! Uniform random search, the baseline the other engines are judged against.

use rand::RngCore;

use crate::engine::SearchEngine;
use crate::error::PfResult;
use crate::objective::Evaluator;
use crate::space::ParameterSpace;

/// Independent uniform sampling across the space; stepped dimensions are
/// snapped onto their lattice.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSearch;

impl RandomSearch {
    pub fn new() -> Self {
        Self
    }
}

impl SearchEngine for RandomSearch {
    fn name(&self) -> &'static str {
        "random"
    }

    fn search(
        &self,
        space: &ParameterSpace,
        evaluator: &mut Evaluator<'_>,
        rng: &mut dyn RngCore,
    ) -> PfResult<()> {
        while evaluator.has_budget() {
            let unit = space.sample_unit(rng);
            evaluator.evaluate(space.denormalize(&unit))?;
        }
        Ok(())
    }
}
