//! Virtual user lifecycle
//!
//! Each virtual user owns one worker slot and repeats a cycle until the
//! cleanup-only boundary is observed at the top of the loop:
//!
//! ```text
//! SELECT -> JOIN -> POLL -> MATCHED ------------------------> POST_MATCH_WAIT
//!             |       |                                            |
//!             |       +-> TIMEOUT -> RECOVERED_MATCH ------------->+
//!             |                  +-> ABANDON ---------> RETRY_WAIT |
//!             +------------------+-> FAIL_CYCLE ------> RETRY_WAIT |
//!                                                           |      |
//!                                         SELECT <----------+------+
//! ```
//!
//! Every finished cycle contributes exactly one sample to the match success
//! stream and one to the match timeout stream. A timeout is recorded as soon
//! as the polling deadline passes and is corrected away if the status
//! re-check shows the user was matched after all.

use crate::cleanup::CleanupPath;
use crate::settings::CycleSettings;
use matchload_core::{
    Identity, LatencyMetric, MetricsAggregator, OutcomeCounts, OutcomeKind, RateMetric, Roster,
};
use matchload_http::{JoinOutcome, MatchClient, QueueStatus};
use matchload_resilience::CleanupToken;
use std::sync::Arc;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, info, info_span, trace, warn, Instrument};

/// What a virtual user did over its lifetime
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotReport {
    pub slot: usize,
    /// Cycles that reached a classification
    pub cycles: u64,
    pub outcomes: OutcomeCounts,
    /// A cycle was cut short by a forced stop
    pub interrupted: bool,
    /// Identity the final cleanup ran for
    pub last_user: Option<String>,
    pub cleanup_succeeded: bool,
}

impl SlotReport {
    fn new(slot: usize) -> Self {
        Self {
            slot,
            ..Default::default()
        }
    }

    fn record(&mut self, outcome: OutcomeKind) {
        self.cycles += 1;
        match outcome {
            OutcomeKind::LiveMatch => self.outcomes.live_matches += 1,
            OutcomeKind::RecoveredMatch => self.outcomes.recovered_matches += 1,
            OutcomeKind::Abandoned => self.outcomes.abandoned += 1,
            OutcomeKind::Failed => self.outcomes.failed += 1,
        }
    }
}

/// State of one join/poll/resolve/wait pass
struct Cycle<'a> {
    index: u64,
    identity: &'a Identity,
    started_at: Instant,
    timeout_recorded: bool,
    /// Set together with the cycle's final rate samples, before any
    /// follow-up ack or leave call
    outcome: Option<OutcomeKind>,
}

impl<'a> Cycle<'a> {
    fn new(index: u64, identity: &'a Identity) -> Self {
        Self {
            index,
            identity,
            started_at: Instant::now(),
            timeout_recorded: false,
            outcome: None,
        }
    }

    fn user_id(&self) -> &'a str {
        &self.identity.user_id
    }
}

enum PollResult {
    Matched(Option<String>),
    DeadlineReached,
}

/// One simulated user bound to a worker slot
pub struct VirtualUser {
    slot: usize,
    roster: Arc<Roster>,
    client: Arc<dyn MatchClient>,
    metrics: Arc<MetricsAggregator>,
    cleanup: CleanupPath,
    settings: Arc<CycleSettings>,
    token: CleanupToken,
}

impl VirtualUser {
    pub fn new(
        slot: usize,
        roster: Arc<Roster>,
        client: Arc<dyn MatchClient>,
        metrics: Arc<MetricsAggregator>,
        settings: Arc<CycleSettings>,
        token: CleanupToken,
    ) -> Self {
        let cleanup = CleanupPath::new(client.clone(), metrics.clone());
        Self {
            slot,
            roster,
            client,
            metrics,
            cleanup,
            settings,
            token,
        }
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Run cycles until cleanup-only mode, then clean up exactly once
    pub async fn run(self) -> SlotReport {
        let span = info_span!("vu", slot = self.slot);
        self.run_inner().instrument(span).await
    }

    async fn run_inner(self) -> SlotReport {
        let mut report = SlotReport::new(self.slot);
        let mut last_identity = None;
        let mut index = 0u64;

        loop {
            // SELECT
            if self.token.is_cleanup_only() {
                debug!("Cleanup-only mode reached after {} cycles", index);
                break;
            }

            let identity = self.roster.assign(self.slot, index);
            last_identity = Some(identity);
            let mut cycle = Cycle::new(index, identity);
            index += 1;

            let interrupted = tokio::select! {
                biased;
                _ = self.token.forced() => true,
                _ = self.run_cycle(&mut cycle) => false,
            };

            if interrupted {
                self.finish_interrupted(&mut cycle);
            }
            if let Some(outcome) = cycle.outcome {
                report.record(outcome);
            }
            if interrupted {
                report.interrupted = true;
                break;
            }
        }

        // TERMINATED
        let identity = last_identity.unwrap_or_else(|| self.roster.assign(self.slot, 0));
        let outcome = self
            .cleanup
            .cleanup(&identity.user_id, self.settings.cleanup_timeout)
            .await;
        report.last_user = Some(identity.user_id.clone());
        report.cleanup_succeeded = outcome.is_success();

        debug!(
            "Terminated after {} cycles (interrupted: {})",
            report.cycles, report.interrupted
        );
        report
    }

    async fn run_cycle(&self, cycle: &mut Cycle<'_>) {
        let outcome = self.resolve(cycle).await;

        let delay = match outcome {
            OutcomeKind::LiveMatch | OutcomeKind::RecoveredMatch => {
                self.settings.success_cooldown.sample()
            }
            OutcomeKind::Abandoned | OutcomeKind::Failed => self.settings.retry_backoff.sample(),
        };
        trace!(
            "Cycle {} for {} ended as {:?}, waiting {:?}",
            cycle.index,
            cycle.user_id(),
            outcome,
            delay
        );
        // POST_MATCH_WAIT / RETRY_WAIT
        sleep(delay).await;
    }

    async fn resolve(&self, cycle: &mut Cycle<'_>) -> OutcomeKind {
        let user_id = cycle.user_id();

        // JOIN
        match self
            .client
            .join(cycle.identity, self.settings.request_timeout)
            .await
        {
            Ok(JoinOutcome::Enqueued) => debug!("{} joined the queue", user_id),
            Ok(JoinOutcome::AlreadyQueued) => {
                self.metrics.record_join_conflict();
                debug!("{} is already queued, polling anyway", user_id);
            }
            Err(e) => {
                warn!("Join failed for {}: {}", user_id, e);
                self.record_timeout(cycle, true);
                return self.classify(cycle, false, OutcomeKind::Failed);
            }
        }

        // POLL
        match self.poll(cycle).await {
            PollResult::Matched(partner) => {
                // MATCHED
                let latency = cycle.started_at.elapsed();
                self.metrics.record_latency(LatencyMetric::MatchLatency, latency);
                self.record_timeout(cycle, false);
                let outcome = self.classify(cycle, true, OutcomeKind::LiveMatch);
                info!(
                    "User {} matched with {} in {}ms",
                    user_id,
                    partner.as_deref().unwrap_or("unknown"),
                    latency.as_millis()
                );

                if let Err(e) = self.client.ack(user_id, self.settings.request_timeout).await {
                    debug!("Ack failed for {}: {}", user_id, e);
                }
                outcome
            }
            PollResult::DeadlineReached => self.resolve_timeout(cycle).await,
        }
    }

    async fn poll(&self, cycle: &Cycle<'_>) -> PollResult {
        let deadline = cycle.started_at + self.settings.match_timeout;

        loop {
            let now = Instant::now();
            if now >= deadline {
                return PollResult::DeadlineReached;
            }

            let call_timeout = self.settings.request_timeout.min(deadline - now);
            match self.client.status(cycle.user_id(), call_timeout).await {
                Ok(status) if status.is_matched() => {
                    return PollResult::Matched(status.matched_with);
                }
                Ok(status) => trace!("{} is {}", cycle.user_id(), status.status),
                Err(e) => trace!("Status poll miss for {}: {}", cycle.user_id(), e),
            }

            let wake = (Instant::now() + self.settings.polling_interval).min(deadline);
            sleep_until(wake).await;
        }
    }

    async fn resolve_timeout(&self, cycle: &mut Cycle<'_>) -> OutcomeKind {
        let user_id = cycle.user_id();

        // TIMEOUT
        self.record_timeout(cycle, true);
        warn!(
            "User {} did not match within {}ms",
            user_id,
            self.settings.match_timeout.as_millis()
        );

        let recheck = self
            .client
            .status(user_id, self.settings.cleanup_timeout)
            .await;

        match recheck {
            Ok(status) if status.is_matched() => {
                // RECOVERED_MATCH
                self.metrics
                    .record_rate_correction(RateMetric::MatchTimeout, -1);
                let latency = cycle.started_at.elapsed();
                self.metrics.record_latency(LatencyMetric::MatchLatency, latency);
                let outcome = self.classify(cycle, true, OutcomeKind::RecoveredMatch);
                info!(
                    "User {} matched with {} after the polling deadline ({}ms)",
                    user_id,
                    status.matched_with.as_deref().unwrap_or("unknown"),
                    latency.as_millis()
                );

                if let Err(e) = self.client.ack(user_id, self.settings.cleanup_timeout).await {
                    debug!("Ack after recovered match failed for {}: {}", user_id, e);
                }
                outcome
            }
            Ok(status) if status.status == QueueStatus::Waiting => {
                // ABANDON
                let outcome = self.classify(cycle, false, OutcomeKind::Abandoned);
                debug!("{} still waiting, leaving the queue", user_id);
                self.cleanup
                    .cleanup(user_id, self.settings.cleanup_timeout)
                    .await;
                outcome
            }
            Ok(status) => {
                // FAIL_CYCLE
                warn!("{} reported {} after timing out", user_id, status.status);
                self.classify(cycle, false, OutcomeKind::Failed)
            }
            Err(e) => {
                // FAIL_CYCLE
                warn!("Status re-check failed for {}: {}", user_id, e);
                self.classify(cycle, false, OutcomeKind::Failed)
            }
        }
    }

    /// Close the books on a cycle cut short by a forced stop.
    ///
    /// A cycle interrupted between its timeout sample and its success sample
    /// is classified as failed; one that recorded nothing contributes nothing.
    fn finish_interrupted(&self, cycle: &mut Cycle<'_>) {
        debug!("Cycle {} for {} interrupted", cycle.index, cycle.user_id());
        if cycle.outcome.is_none() && cycle.timeout_recorded {
            self.classify(cycle, false, OutcomeKind::Failed);
        }
    }

    fn record_timeout(&self, cycle: &mut Cycle<'_>, timed_out: bool) {
        self.metrics.record_rate(RateMetric::MatchTimeout, timed_out);
        cycle.timeout_recorded = true;
    }

    /// Record the success sample and fix the cycle's classification
    fn classify(&self, cycle: &mut Cycle<'_>, success: bool, outcome: OutcomeKind) -> OutcomeKind {
        self.metrics.record_rate(RateMetric::MatchSuccess, success);
        self.metrics.record_outcome(outcome);
        cycle.outcome = Some(outcome);
        outcome
    }
}

impl std::fmt::Debug for VirtualUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualUser")
            .field("slot", &self.slot)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
