//! Evaluation records and the result shape shared by every engine.

use serde::{Deserialize, Serialize};

use crate::space::ParamMap;

/// One objective evaluation, in call order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatedPoint {
    pub params: ParamMap,
    pub value: f64,
}

/// Outcome of a single optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerResult {
    /// Parameters of the first evaluation that reached `best_value`.
    pub best_params: ParamMap,
    /// Highest objective value observed; `-inf` if nothing was evaluated.
    pub best_value: f64,
    pub evaluations: Vec<EvaluatedPoint>,
    pub total_evaluations: usize,
}

impl OptimizerResult {
    pub(crate) fn from_evaluations(evaluations: Vec<EvaluatedPoint>, best: Option<usize>) -> Self {
        let (best_params, best_value) = match best {
            Some(i) => (evaluations[i].params.clone(), evaluations[i].value),
            None => (ParamMap::new(), f64::NEG_INFINITY),
        };
        Self {
            best_params,
            best_value,
            total_evaluations: evaluations.len(),
            evaluations,
        }
    }

    /// The `n` highest-scoring evaluations, best first. Equal values keep
    /// evaluation order.
    pub fn top_evaluations(&self, n: usize) -> Vec<EvaluatedPoint> {
        let mut sorted: Vec<&EvaluatedPoint> = self.evaluations.iter().collect();
        sorted.sort_by(|a, b| b.value.total_cmp(&a.value));
        sorted.into_iter().take(n).cloned().collect()
    }

    /// Running best value after each evaluation.
    pub fn convergence(&self) -> Vec<f64> {
        let mut best = f64::NEG_INFINITY;
        self.evaluations
            .iter()
            .map(|point| {
                if point.value > best {
                    best = point.value;
                }
                best
            })
            .collect()
    }

    /// Compact view keeping only the top `n` evaluations.
    pub fn summary(&self, n: usize) -> ResultSummary {
        ResultSummary {
            best_params: self.best_params.clone(),
            best_value: self.best_value,
            total_evaluations: self.total_evaluations,
            top_evaluations: self.top_evaluations(n),
        }
    }
}

/// Response-sized view of an [`OptimizerResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub best_params: ParamMap,
    pub best_value: f64,
    pub total_evaluations: usize,
    pub top_evaluations: Vec<EvaluatedPoint>,
}
