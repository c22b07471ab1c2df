//! Stage Guards (spec §4.6): per-stage token and wall-clock budgets,
//! with historical-duration-informed pre-execution abstention and
//! adaptive scaling by system health.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::GuardError;

/// How many recent durations each stage remembers (spec §4.6: "ring of
/// last 100").
const HISTORY_CAPACITY: usize = 100;

/// How many of the most recent durations feed the pre-execution
/// abstention check (spec §4.6: "mean of recent 5").
const ABSTENTION_LOOKBACK: usize = 5;

/// Minimum remaining budget below which `executeSequence` stops early
/// rather than starting another stage (spec §4.6).
const MIN_SEQUENCE_BUDGET_MS: u64 = 200;
const MIN_SEQUENCE_BUDGET_TOKENS: u32 = 50;

/// System health, used to scale every stage's budget (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemHealth {
    Healthy,
    Degraded,
    Unhealthy,
}

impl SystemHealth {
    fn budget_scale(self) -> f32 {
        match self {
            SystemHealth::Healthy => 1.0,
            SystemHealth::Degraded => 0.8,
            SystemHealth::Unhealthy => 0.6,
        }
    }
}

/// A per-stage token and wall-clock allotment.
#[derive(Debug, Clone, Copy)]
pub struct Budget {
    pub tokens: u32,
    pub millis: u64,
}

impl Budget {
    pub fn new(tokens: u32, millis: u64) -> Self {
        Self { tokens, millis }
    }

    fn scaled(self, health: SystemHealth) -> Self {
        let scale = health.budget_scale();
        Self {
            tokens: ((self.tokens as f32) * scale) as u32,
            millis: ((self.millis as f32) * scale) as u64,
        }
    }
}

/// Default budgets for each named stage (spec §4.6).
pub fn default_budget(stage: &str) -> Budget {
    match stage {
        "contract_generation" => Budget::new(500, 800),
        "augmentation" => Budget::new(400, 1200),
        "validation" => Budget::new(100, 600),
        "schema_negotiation" => Budget::new(300, 1000),
        "deterministic_track" => Budget::new(0, 500),
        _ => Budget::new(200, 800),
    }
}

struct StageHistory {
    durations: VecDeque<Duration>,
}

impl StageHistory {
    fn new() -> Self {
        Self { durations: VecDeque::with_capacity(HISTORY_CAPACITY) }
    }

    fn record(&mut self, duration: Duration) {
        if self.durations.len() == HISTORY_CAPACITY {
            self.durations.pop_front();
        }
        self.durations.push_back(duration);
    }

    fn recent_mean(&self, lookback: usize) -> Option<Duration> {
        if self.durations.is_empty() {
            return None;
        }
        let take = self.durations.len().min(lookback);
        let sum: Duration = self.durations.iter().rev().take(take).sum();
        Some(sum / take as u32)
    }

    fn utilization(&self, budget_millis: u64) -> f32 {
        match self.recent_mean(HISTORY_CAPACITY) {
            Some(mean) if budget_millis > 0 => mean.as_millis() as f32 / budget_millis as f32,
            _ => 0.0,
        }
    }
}

/// Enforces budgets for a single named stage, with a rolling history
/// that informs pre-execution abstention.
pub struct StageGuard {
    stage: String,
    budget: Budget,
    health: RwLock<SystemHealth>,
    history: RwLock<StageHistory>,
    abstention_threshold: RwLock<f32>,
    abstention_enabled: bool,
}

impl StageGuard {
    pub fn new(stage: impl Into<String>, budget: Budget) -> Self {
        Self {
            stage: stage.into(),
            budget,
            health: RwLock::new(SystemHealth::Healthy),
            history: RwLock::new(StageHistory::new()),
            abstention_threshold: RwLock::new(1.0),
            abstention_enabled: true,
        }
    }

    pub fn with_abstention_enabled(mut self, enabled: bool) -> Self {
        self.abstention_enabled = enabled;
        self
    }

    pub fn stage_name(&self) -> &str {
        &self.stage
    }

    /// Scale this guard's effective budget by system health (spec §4.6
    /// adaptive adjustment). Also tightens the abstention threshold by
    /// 0.1 for stages whose recent utilization exceeds 0.9.
    pub fn adapt(&self, health: SystemHealth) {
        *self.health.write().unwrap() = health;
        let effective = self.budget.scaled(health);
        let utilization = self.history.read().unwrap().utilization(effective.millis);
        if utilization > 0.9 {
            let mut threshold = self.abstention_threshold.write().unwrap();
            *threshold = (*threshold - 0.1).max(0.1);
        }
    }

    fn effective_budget(&self) -> Budget {
        self.budget.scaled(*self.health.read().unwrap())
    }

    fn should_preemptively_abstain(&self) -> bool {
        let effective = self.effective_budget();
        let threshold = *self.abstention_threshold.read().unwrap();
        match self.history.read().unwrap().recent_mean(ABSTENTION_LOOKBACK) {
            Some(mean) => mean.as_millis() as f32 > threshold * effective.millis as f32,
            None => false,
        }
    }

    /// Run `work` under this stage's budget. If the work exceeds the
    /// deadline (or abstention pre-check fires), run `fallback` if
    /// abstention is enabled, otherwise return `GuardError`.
    pub async fn execute<T, Fut, FutFallback>(
        &self,
        token: &CancellationToken,
        work: impl FnOnce() -> Fut,
        fallback: impl FnOnce() -> FutFallback,
    ) -> Result<T, GuardError>
    where
        Fut: Future<Output = T>,
        FutFallback: Future<Output = T>,
    {
        let effective = self.effective_budget();

        if self.should_preemptively_abstain() {
            tracing::warn!(stage = %self.stage, "stage guard abstaining pre-execution: recent durations exceed threshold");
            if self.abstention_enabled {
                return Ok(fallback().await);
            }
            return Err(GuardError::BudgetExceeded {
                stage: self.stage.clone(),
                elapsed_ms: 0,
                budget_ms: effective.millis,
            });
        }

        let start = Instant::now();
        let deadline = Duration::from_millis(effective.millis);

        tokio::select! {
            result = tokio::time::timeout(deadline, work()) => {
                match result {
                    Ok(value) => {
                        self.history.write().unwrap().record(start.elapsed());
                        Ok(value)
                    }
                    Err(_) => {
                        let elapsed = start.elapsed();
                        self.history.write().unwrap().record(elapsed);
                        tracing::warn!(stage = %self.stage, elapsed_ms = elapsed.as_millis() as u64, "stage budget exceeded");
                        if self.abstention_enabled {
                            Ok(fallback().await)
                        } else {
                            Err(GuardError::BudgetExceeded {
                                stage: self.stage.clone(),
                                elapsed_ms: elapsed.as_millis() as u64,
                                budget_ms: effective.millis,
                            })
                        }
                    }
                }
            }
            _ = token.cancelled() => {
                tracing::warn!(stage = %self.stage, "stage cancelled");
                Err(GuardError::Cancelled { stage: self.stage.clone() })
            }
        }
    }
}

/// Run a sequence of named, budgeted stages against an overall budget,
/// adapting each stage's remaining share as prior stages consume it
/// (spec §4.6 `executeSequence`). Terminates early, returning whatever
/// results were produced, once remaining budget drops below the
/// per-stage minimum.
pub async fn execute_sequence<T>(
    stages: Vec<(StageGuard, Box<dyn FnOnce(Budget) -> futures::future::BoxFuture<'static, T> + Send>)>,
    overall_budget: Budget,
    token: &CancellationToken,
) -> Vec<T> {
    let mut remaining = overall_budget;
    let mut results = Vec::new();

    for (guard, make_future) in stages {
        if remaining.millis < MIN_SEQUENCE_BUDGET_MS || remaining.tokens < MIN_SEQUENCE_BUDGET_TOKENS {
            tracing::debug!("stage sequence terminating early: remaining budget below minimum");
            break;
        }

        let stage_budget = Budget::new(
            guard.budget.tokens.min(remaining.tokens),
            guard.budget.millis.min(remaining.millis),
        );
        let start = Instant::now();

        let fut = make_future(stage_budget);
        tokio::select! {
            value = fut => {
                let elapsed = start.elapsed();
                remaining.millis = remaining.millis.saturating_sub(elapsed.as_millis() as u64);
                remaining.tokens = remaining.tokens.saturating_sub(stage_budget.tokens);
                results.push(value);
            }
            _ = token.cancelled() => {
                tracing::warn!("stage sequence cancelled");
                break;
            }
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_budgets_match_spec() {
        let b = default_budget("contract_generation");
        assert_eq!(b.tokens, 500);
        assert_eq!(b.millis, 800);
        let b = default_budget("deterministic_track");
        assert_eq!(b.tokens, 0);
        assert_eq!(b.millis, 500);
    }

    #[test]
    fn degraded_health_scales_budget_down() {
        let budget = Budget::new(100, 1000).scaled(SystemHealth::Degraded);
        assert_eq!(budget.millis, 800);
        let budget = Budget::new(100, 1000).scaled(SystemHealth::Unhealthy);
        assert_eq!(budget.millis, 600);
    }

    #[tokio::test]
    async fn execute_returns_work_result_within_budget() {
        let guard = StageGuard::new("test_stage", Budget::new(100, 1000));
        let token = CancellationToken::new();
        let result = guard
            .execute(&token, || async { 42 }, || async { 0 })
            .await
            .unwrap();
        assert_eq!(result, 42);
    }

    #[tokio::test]
    async fn execute_falls_back_when_work_exceeds_deadline() {
        let guard = StageGuard::new("slow_stage", Budget::new(100, 10));
        let token = CancellationToken::new();
        let result = guard
            .execute(
                &token,
                || async {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    42
                },
                || async { 0 },
            )
            .await
            .unwrap();
        assert_eq!(result, 0);
    }

    #[tokio::test]
    async fn execute_surfaces_error_when_abstention_disabled() {
        let guard = StageGuard::new("slow_stage", Budget::new(100, 10)).with_abstention_enabled(false);
        let token = CancellationToken::new();
        let result = guard
            .execute(
                &token,
                || async {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    42
                },
                || async { 0 },
            )
            .await;
        assert!(matches!(result, Err(GuardError::BudgetExceeded { .. })));
    }

    #[test]
    fn preemptive_abstention_fires_after_repeated_slow_runs() {
        let guard = StageGuard::new("flaky_stage", Budget::new(100, 50));
        {
            let mut history = guard.history.write().unwrap();
            for _ in 0..ABSTENTION_LOOKBACK {
                history.record(Duration::from_millis(80));
            }
        }
        assert!(guard.should_preemptively_abstain());
    }
}
