use pf_optimizer::{
    infallible, OptimizationRun, OptimizerConfig, ParamMap, ParameterSpace, Strategy,
};
use tracing_subscriber::EnvFilter;

/// Smooth stand-in for a backtest Sharpe surface, peaking at
/// short=9, long=50, threshold=0.35.
fn synthetic_sharpe(p: &ParamMap) -> f64 {
    let short = (p["short_period"] - 9.0) / 6.0;
    let long = (p["long_period"] - 50.0) / 30.0;
    let threshold = (p["threshold"] - 0.35) / 0.3;
    1.8 * (-(short * short + long * long + threshold * threshold)).exp()
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {key}={raw}: {e}")),
        Err(_) => Ok(default),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let strategy: Strategy = env_or("PF_STRATEGY", Strategy::Bayesian)?;
    let max_evaluations: usize = env_or("PF_MAX_EVALUATIONS", 60)?;
    let top_n: usize = env_or("PF_TOP_N", 10)?;

    let mut config = OptimizerConfig::new(strategy).with_max_evaluations(max_evaluations);
    if let Ok(raw) = std::env::var("PF_SEED") {
        config = config.with_seed(raw.parse()?);
    }

    let space = ParameterSpace::new()
        .add_stepped("short_period", 2.0, 20.0, 1.0)
        .add_stepped("long_period", 20.0, 100.0, 5.0)
        .add_continuous("threshold", 0.0, 1.0);

    let mut objective = infallible(synthetic_sharpe);
    let run = OptimizationRun::execute(space, &mut objective, config);

    let report = serde_json::json!({
        "id": run.id,
        "strategy": run.config.strategy,
        "state": run.state,
        "started_at": run.started_at,
        "finished_at": run.finished_at,
        "error": run.error,
        "result": run.result.as_ref().map(|r| r.summary(top_n)),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(error) = run.error {
        anyhow::bail!(error);
    }
    Ok(())
}
