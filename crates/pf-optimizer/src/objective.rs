//! Objective abstraction and the evaluation bookkeeping shared by every
//! engine: budget, deadline, failure policy, running best.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::error::{BoxError, PfError, PfResult};
use crate::result::{EvaluatedPoint, OptimizerResult};
use crate::space::ParamMap;

/// A caller-supplied scoring function. Higher is better.
pub trait Objective {
    fn evaluate(&mut self, params: &ParamMap) -> Result<f64, BoxError>;
}

impl<F, E> Objective for F
where
    F: FnMut(&ParamMap) -> Result<f64, E>,
    E: Into<BoxError>,
{
    fn evaluate(&mut self, params: &ParamMap) -> Result<f64, BoxError> {
        self(params).map_err(Into::into)
    }
}

/// Wrap a plain scoring closure that cannot fail.
pub fn infallible<F>(mut f: F) -> impl Objective
where
    F: FnMut(&ParamMap) -> f64,
{
    move |params: &ParamMap| Ok::<f64, Infallible>(f(params))
}

/// What to do when the objective returns an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EvaluationPolicy {
    /// Abort the run and return the objective's error.
    #[default]
    FailFast,
    /// Record `value` for the failing point and keep searching.
    Penalize { value: f64 },
}

/// Limits applied to one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationBudget {
    pub max_evaluations: usize,
    #[serde(default)]
    pub policy: EvaluationPolicy,
    /// Wall-clock limit checked before each evaluation.
    #[serde(default)]
    pub time_limit: Option<Duration>,
}

impl EvaluationBudget {
    pub fn new(max_evaluations: usize) -> Self {
        Self {
            max_evaluations,
            policy: EvaluationPolicy::FailFast,
            time_limit: None,
        }
    }

    pub fn with_policy(mut self, policy: EvaluationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn validate(&self) -> PfResult<()> {
        if self.max_evaluations == 0 {
            return Err(PfError::InvalidConfig(
                "max_evaluations must be at least 1".into(),
            ));
        }
        if let EvaluationPolicy::Penalize { value } = self.policy {
            if value.is_nan() {
                return Err(PfError::InvalidConfig("penalty value must not be NaN".into()));
            }
        }
        Ok(())
    }
}

/// Sequential evaluation log for one run.
///
/// Engines call [`has_budget`](Self::has_budget) at the top of each loop
/// iteration and [`evaluate`](Self::evaluate) for every candidate; the
/// evaluator records the point and tracks the running best.
pub struct Evaluator<'a> {
    objective: &'a mut dyn Objective,
    policy: EvaluationPolicy,
    max_evaluations: usize,
    deadline: Option<Instant>,
    evaluations: Vec<EvaluatedPoint>,
    best: Option<usize>,
}

impl<'a> Evaluator<'a> {
    pub fn new(objective: &'a mut dyn Objective, budget: &EvaluationBudget) -> Self {
        Self {
            objective,
            policy: budget.policy,
            max_evaluations: budget.max_evaluations,
            deadline: budget.time_limit.map(|limit| Instant::now() + limit),
            evaluations: Vec::with_capacity(budget.max_evaluations.min(4096)),
            best: None,
        }
    }

    pub fn max_evaluations(&self) -> usize {
        self.max_evaluations
    }

    pub fn count(&self) -> usize {
        self.evaluations.len()
    }

    pub fn remaining(&self) -> usize {
        self.max_evaluations.saturating_sub(self.evaluations.len())
    }

    fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Whether another evaluation may be issued.
    pub fn has_budget(&self) -> bool {
        self.remaining() > 0 && !self.deadline_passed()
    }

    pub fn best_value(&self) -> Option<f64> {
        self.best.map(|i| self.evaluations[i].value)
    }

    pub fn evaluations(&self) -> &[EvaluatedPoint] {
        &self.evaluations
    }

    /// Score `params`, record the point and return its value.
    pub fn evaluate(&mut self, params: ParamMap) -> PfResult<f64> {
        if self.remaining() == 0 {
            return Err(PfError::BudgetExhausted);
        }
        let evaluation = self.evaluations.len();
        let value = match self.objective.evaluate(&params) {
            Ok(value) => value,
            Err(source) => match self.policy {
                EvaluationPolicy::FailFast => {
                    return Err(PfError::Objective { evaluation, source });
                }
                EvaluationPolicy::Penalize { value } => {
                    warn!(
                        "Objective failed at evaluation {}: {}; scoring {}",
                        evaluation, source, value
                    );
                    value
                }
            },
        };

        let improved = match self.best_value() {
            None => true,
            Some(best) => value > best || (best.is_nan() && !value.is_nan()),
        };
        self.evaluations.push(EvaluatedPoint { params, value });
        if improved {
            self.best = Some(evaluation);
            debug!("New best at evaluation {}: {}", evaluation, value);
        }
        Ok(value)
    }

    pub fn finish(self) -> OptimizerResult {
        if self.remaining() > 0 && self.deadline_passed() {
            info!(
                "Time limit reached after {} of {} evaluations",
                self.evaluations.len(),
                self.max_evaluations
            );
        }
        OptimizerResult::from_evaluations(self.evaluations, self.best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct BacktestFailed;

    impl std::fmt::Display for BacktestFailed {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "backtest failed")
        }
    }

    impl std::error::Error for BacktestFailed {}

    fn params(x: f64) -> ParamMap {
        let mut p = ParamMap::new();
        p.insert("x".into(), x);
        p
    }

    #[test]
    fn running_best_keeps_first_tie() {
        let mut objective = infallible(|p| p["x"].min(2.0));
        let budget = EvaluationBudget::new(5);
        let mut evaluator = Evaluator::new(&mut objective, &budget);
        for x in [1.0, 2.0, 3.0, 0.0] {
            evaluator.evaluate(params(x)).unwrap();
        }
        let result = evaluator.finish();
        assert_eq!(result.best_value, 2.0);
        assert_eq!(result.best_params["x"], 2.0);
        assert_eq!(result.total_evaluations, 4);
    }

    #[test]
    fn evaluating_past_the_budget_is_an_error() {
        let mut objective = infallible(|_| 1.0);
        let budget = EvaluationBudget::new(1);
        let mut evaluator = Evaluator::new(&mut objective, &budget);
        evaluator.evaluate(params(0.0)).unwrap();
        assert!(!evaluator.has_budget());
        assert!(matches!(
            evaluator.evaluate(params(0.0)),
            Err(PfError::BudgetExhausted)
        ));
    }

    #[test]
    fn fail_fast_propagates_the_objective_error() {
        let mut objective = |p: &ParamMap| {
            if p["x"] > 1.0 {
                Err(BacktestFailed)
            } else {
                Ok(p["x"])
            }
        };
        let budget = EvaluationBudget::new(5);
        let mut evaluator = Evaluator::new(&mut objective, &budget);
        evaluator.evaluate(params(1.0)).unwrap();
        let err = evaluator.evaluate(params(2.0)).unwrap_err();
        match err {
            PfError::Objective { evaluation, source } => {
                assert_eq!(evaluation, 1);
                assert!(source.downcast_ref::<BacktestFailed>().is_some());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn penalize_policy_records_the_sentinel() {
        let mut objective = |p: &ParamMap| {
            if p["x"] < 0.0 {
                Err(BacktestFailed)
            } else {
                Ok(p["x"])
            }
        };
        let budget = EvaluationBudget::new(3)
            .with_policy(EvaluationPolicy::Penalize { value: -1e9 });
        let mut evaluator = Evaluator::new(&mut objective, &budget);
        assert_eq!(evaluator.evaluate(params(-1.0)).unwrap(), -1e9);
        assert_eq!(evaluator.evaluate(params(0.5)).unwrap(), 0.5);
        let result = evaluator.finish();
        assert_eq!(result.evaluations[0].value, -1e9);
        assert_eq!(result.best_value, 0.5);
    }

    #[test]
    fn expired_deadline_stops_the_run() {
        let mut objective = infallible(|_| 1.0);
        let budget = EvaluationBudget::new(10).with_time_limit(Duration::ZERO);
        let evaluator = Evaluator::new(&mut objective, &budget);
        assert!(!evaluator.has_budget());
        let result = evaluator.finish();
        assert_eq!(result.total_evaluations, 0);
    }

    #[test]
    fn budget_validation() {
        assert!(EvaluationBudget::new(0).validate().is_err());
        assert!(EvaluationBudget::new(1).validate().is_ok());
        assert!(EvaluationBudget::new(1)
            .with_policy(EvaluationPolicy::Penalize { value: f64::NAN })
            .validate()
            .is_err());
    }

    #[test]
    fn policy_serializes_with_a_mode_tag() {
        let json = serde_json::to_value(EvaluationPolicy::Penalize { value: -100.0 }).unwrap();
        assert_eq!(json, serde_json::json!({"mode": "penalize", "value": -100.0}));
        let back: EvaluationPolicy =
            serde_json::from_value(serde_json::json!({"mode": "fail_fast"})).unwrap();
        assert_eq!(back, EvaluationPolicy::FailFast);
    }
}
