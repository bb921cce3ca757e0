//! Population driver
//!
//! Starts worker slots along the ramp-up so the population grows linearly,
//! lets them run through the steady stage, and waits for every slot to
//! finish its last cycle and cleanup during ramp-down.

use crate::error::EngineError;
use crate::settings::{CycleSettings, RunPlan};
use crate::summary::{RunSummary, ThresholdReport};
use crate::virtual_user::{SlotReport, VirtualUser};
use chrono::Utc;
use matchload_config::{MatchloadConfig, ThresholdsConfig};
use matchload_core::{compute_schedule, MetricsAggregator, RateMetric, Roster, Schedule};
use matchload_http::{ClientConfig, HttpMatchClient, MatchClient};
use matchload_resilience::{CleanupToken, ShutdownCoordinator};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::{interval_at, sleep_until, Instant};
use tracing::{debug, info, warn};

pub struct LoadRunner {
    plan: RunPlan,
    settings: Arc<CycleSettings>,
    thresholds: ThresholdsConfig,
    roster: Arc<Roster>,
    client: Arc<dyn MatchClient>,
    metrics: Arc<MetricsAggregator>,
    coordinator: Arc<ShutdownCoordinator>,
}

impl LoadRunner {
    /// Create a runner; the ramp schedule starts now
    pub fn new(
        config: &MatchloadConfig,
        roster: Arc<Roster>,
        client: Arc<dyn MatchClient>,
        metrics: Arc<MetricsAggregator>,
    ) -> Self {
        let plan = RunPlan::from(config);
        let schedule = compute_schedule(plan.ramp_up, plan.steady, plan.ramp_down, Instant::now());

        Self {
            plan,
            settings: Arc::new(CycleSettings::from(config)),
            thresholds: config.thresholds.clone(),
            roster,
            client,
            metrics,
            coordinator: Arc::new(ShutdownCoordinator::new(schedule)),
        }
    }

    /// Create a runner talking to the configured service over HTTP
    pub fn from_config(config: &MatchloadConfig, roster: Arc<Roster>) -> Result<Self, EngineError> {
        let metrics = Arc::new(MetricsAggregator::new()?);
        let client = HttpMatchClient::new(&ClientConfig::from(config), metrics.clone())?;
        Ok(Self::new(config, roster, Arc::new(client), metrics))
    }

    pub fn schedule(&self) -> &Schedule {
        self.coordinator.schedule()
    }

    pub fn metrics(&self) -> Arc<MetricsAggregator> {
        self.metrics.clone()
    }

    /// Handle for requesting an early cleanup-only or forced stop
    pub fn coordinator(&self) -> Arc<ShutdownCoordinator> {
        self.coordinator.clone()
    }

    /// Drive the whole run and summarise it
    pub async fn run(self) -> Result<RunSummary, EngineError> {
        let started_at = Utc::now();
        let schedule = *self.coordinator.schedule();
        let token = self.coordinator.token();
        let population = self.plan.population;

        info!(
            "Starting run against {} identities: {} virtual users, ramp-up {:?}, steady {:?}, ramp-down {:?}",
            self.roster.len(),
            population,
            self.plan.ramp_up,
            self.plan.steady,
            self.plan.ramp_down
        );

        let active = Arc::new(AtomicUsize::new(0));
        let progress = tokio::spawn(report_progress(
            self.plan,
            token.clone(),
            self.metrics.clone(),
            active.clone(),
        ));

        let mut tasks = JoinSet::new();
        let mut started = 0usize;

        for slot in 1..=population {
            tokio::select! {
                biased;
                _ = token.cleanup_only() => {
                    if started < population {
                        info!(
                            "Cleanup-only mode reached, {} of {} virtual users never started",
                            population - started,
                            population
                        );
                    }
                    break;
                }
                _ = sleep_until(schedule.slot_start(slot, population)) => {}
            }

            let user = VirtualUser::new(
                slot,
                self.roster.clone(),
                self.client.clone(),
                self.metrics.clone(),
                self.settings.clone(),
                token.clone(),
            );
            let active = active.clone();
            active.fetch_add(1, Ordering::Relaxed);
            tasks.spawn(async move {
                let report = user.run().await;
                active.fetch_sub(1, Ordering::Relaxed);
                report
            });
            started += 1;
        }
        debug!("{} virtual users started", started);

        let mut reports: Vec<SlotReport> = Vec::with_capacity(started);
        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(report) => reports.push(report),
                Err(e) => {
                    progress.abort();
                    return Err(EngineError::Task(e));
                }
            }
        }
        progress.abort();

        let snapshot = self.metrics.snapshot();
        let thresholds = ThresholdReport::evaluate(&snapshot, &self.thresholds);
        let summary = RunSummary {
            started_at,
            elapsed_ms: u64::try_from(schedule.started_at.elapsed().as_millis()).unwrap_or(u64::MAX),
            population,
            slots_started: started,
            slots_interrupted: reports.iter().filter(|r| r.interrupted).count(),
            total_cycles: reports.iter().map(|r| r.cycles).sum(),
            metrics: snapshot,
            thresholds,
        };

        if summary.passed() {
            info!("Run finished: all thresholds passed");
        } else {
            for check in summary.thresholds.failures() {
                warn!("Threshold failed: {}", check);
            }
        }
        Ok(summary)
    }
}

/// Periodic progress line until a forced stop; aborted once every slot is done
async fn report_progress(
    plan: RunPlan,
    token: CleanupToken,
    metrics: Arc<MetricsAggregator>,
    active: Arc<AtomicUsize>,
) {
    if plan.progress_interval.is_zero() {
        return;
    }
    let schedule = *token.schedule();
    let mut ticker = interval_at(
        schedule.started_at + plan.progress_interval,
        plan.progress_interval,
    );

    loop {
        tokio::select! {
            _ = token.forced() => break,
            _ = ticker.tick() => {}
        }

        let now = Instant::now();
        let outcomes = metrics.outcomes();
        let success = metrics
            .rate(RateMetric::MatchSuccess)
            .map(|rate| format!("{:.1}%", rate * 100.0))
            .unwrap_or_else(|| "n/a".to_string());
        info!(
            "[{}] {:?} elapsed, {} active virtual users, {} cycles, match success {}",
            schedule.stage_at(now),
            now - schedule.started_at,
            active.load(Ordering::Relaxed),
            outcomes.total(),
            success
        );
    }
}

impl std::fmt::Debug for LoadRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadRunner")
            .field("plan", &self.plan)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
