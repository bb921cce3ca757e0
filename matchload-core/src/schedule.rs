//! Ramp schedule controller
//!
//! The schedule is computed once at setup from the configured stage durations
//! and is read-only afterwards. Its only policy decision is the cleanup-only
//! boundary: once the steady stage has ended no virtual user may start a new
//! cycle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Absolute stage boundaries of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub started_at: Instant,
    pub ramp_up_end: Instant,
    /// End of the steady stage, which is also the start of ramp-down
    pub steady_end: Instant,
    pub test_end: Instant,
}

/// Stage a run is in at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    RampUp,
    Steady,
    RampDown,
    Finished,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::RampUp => write!(f, "ramp-up"),
            Stage::Steady => write!(f, "steady"),
            Stage::RampDown => write!(f, "ramp-down"),
            Stage::Finished => write!(f, "finished"),
        }
    }
}

/// Stand-in offset for stage lengths too large to represent as an instant
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

fn offset(from: Instant, by: Duration) -> Instant {
    from.checked_add(by)
        .or_else(|| from.checked_add(FAR_FUTURE))
        .unwrap_or(from)
}

/// Compute the stage boundaries for a run starting at `now`. Boundaries that
/// would overflow are clamped to a far-future instant.
pub fn compute_schedule(
    ramp_up: Duration,
    steady: Duration,
    ramp_down: Duration,
    now: Instant,
) -> Schedule {
    let ramp_up_end = offset(now, ramp_up);
    let steady_end = offset(ramp_up_end, steady);
    let test_end = offset(steady_end, ramp_down);

    Schedule {
        started_at: now,
        ramp_up_end,
        steady_end,
        test_end,
    }
}

/// Whether only cleanup is permitted at `now`
pub fn is_cleanup_only(now: Instant, schedule: &Schedule) -> bool {
    now >= schedule.steady_end
}

impl Schedule {
    pub fn ramp_down_start(&self) -> Instant {
        self.steady_end
    }

    pub fn total_duration(&self) -> Duration {
        self.test_end - self.started_at
    }

    pub fn stage_at(&self, now: Instant) -> Stage {
        if now < self.ramp_up_end {
            Stage::RampUp
        } else if now < self.steady_end {
            Stage::Steady
        } else if now < self.test_end {
            Stage::RampDown
        } else {
            Stage::Finished
        }
    }

    /// Start instant of worker `slot` (1-based) so that the population grows
    /// linearly to `population` over the ramp-up stage
    pub fn slot_start(&self, slot: usize, population: usize) -> Instant {
        if population == 0 {
            return self.started_at;
        }
        let ramp_up = (self.ramp_up_end - self.started_at).as_nanos();
        let nanos = ramp_up * slot.saturating_sub(1) as u128 / population as u128;
        offset(
            self.started_at,
            Duration::from_nanos(nanos.min(u64::MAX as u128) as u64),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_compute_schedule_boundaries() {
        let now = Instant::now();
        let schedule = compute_schedule(secs(30), secs(300), secs(30), now);

        assert_eq!(schedule.ramp_up_end, now + secs(30));
        assert_eq!(schedule.steady_end, now + secs(330));
        assert_eq!(schedule.ramp_down_start(), schedule.steady_end);
        assert_eq!(schedule.test_end, now + secs(360));
        assert_eq!(schedule.total_duration(), secs(360));
    }

    #[test]
    fn test_cleanup_only_boundary() {
        let now = Instant::now();
        let schedule = compute_schedule(secs(10), secs(20), secs(10), now);

        assert!(!is_cleanup_only(now, &schedule));
        assert!(!is_cleanup_only(now + secs(29), &schedule));
        assert!(is_cleanup_only(now + secs(30), &schedule));
        assert!(is_cleanup_only(now + secs(45), &schedule));
    }

    #[test]
    fn test_zero_steady_stage_is_cleanup_only_after_ramp_up() {
        let now = Instant::now();
        let schedule = compute_schedule(secs(5), Duration::ZERO, secs(5), now);

        assert!(!is_cleanup_only(now + secs(4), &schedule));
        assert!(is_cleanup_only(now + secs(5), &schedule));
    }

    #[test]
    fn test_stage_at() {
        let now = Instant::now();
        let schedule = compute_schedule(secs(10), secs(10), secs(10), now);

        assert_eq!(schedule.stage_at(now), Stage::RampUp);
        assert_eq!(schedule.stage_at(now + secs(10)), Stage::Steady);
        assert_eq!(schedule.stage_at(now + secs(20)), Stage::RampDown);
        assert_eq!(schedule.stage_at(now + secs(30)), Stage::Finished);
    }

    #[test]
    fn test_slot_start_spreads_over_ramp_up() {
        let now = Instant::now();
        let schedule = compute_schedule(secs(40), secs(60), secs(10), now);

        assert_eq!(schedule.slot_start(1, 4), now);
        assert_eq!(schedule.slot_start(2, 4), now + secs(10));
        assert_eq!(schedule.slot_start(4, 4), now + secs(30));
        assert!(schedule.slot_start(4, 4) < schedule.ramp_up_end);
    }

    #[test]
    fn test_slot_start_without_ramp_up() {
        let now = Instant::now();
        let schedule = compute_schedule(Duration::ZERO, secs(60), secs(10), now);

        assert_eq!(schedule.slot_start(7, 10), now);
        assert_eq!(schedule.slot_start(1, 0), now);
    }

    #[test]
    fn test_oversized_stages_clamp_instead_of_overflowing() {
        let now = Instant::now();
        let schedule = compute_schedule(Duration::MAX, secs(10), Duration::MAX, now);

        assert!(schedule.ramp_up_end > now + secs(86400 * 365));
        assert!(schedule.steady_end >= schedule.ramp_up_end);
        assert!(schedule.test_end >= schedule.steady_end);
        assert!(!is_cleanup_only(now + secs(3600), &schedule));
        assert_eq!(schedule.stage_at(now), Stage::RampUp);
        assert!(schedule.slot_start(2, 2) > now);
    }
}
