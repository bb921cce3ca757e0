//! Shutdown coordination
//!
//! A run winds down in two steps of escalating urgency. In cleanup-only mode
//! virtual users stop starting new cycles but finish the one in flight. It is
//! reached at the end of the steady stage or early through an operator
//! signal. A forced stop interrupts in-flight cycles and is only ever
//! requested by the operator; each user still runs its final cleanup.

use log::{info, warn};
use matchload_core::{is_cleanup_only, Schedule};
use std::future::pending;
use tokio::sync::watch;
use tokio::time::{sleep_until, Instant};

/// Shutdown signal types with escalating urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ShutdownSignal {
    /// Normal operation
    Running,
    /// No new cycles may start; in-flight cycles complete
    CleanupOnly,
    /// In-flight cycles are interrupted; only final cleanup runs
    Forced,
}

impl ShutdownSignal {
    fn next(self) -> Option<ShutdownSignal> {
        match self {
            ShutdownSignal::Running => Some(ShutdownSignal::CleanupOnly),
            ShutdownSignal::CleanupOnly => Some(ShutdownSignal::Forced),
            ShutdownSignal::Forced => None,
        }
    }
}

impl std::fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShutdownSignal::Running => write!(f, "running"),
            ShutdownSignal::CleanupOnly => write!(f, "cleanup-only"),
            ShutdownSignal::Forced => write!(f, "forced"),
        }
    }
}

/// Owns the run's shutdown state and hands out [`CleanupToken`]s
#[derive(Debug)]
pub struct ShutdownCoordinator {
    sender: watch::Sender<ShutdownSignal>,
    schedule: Schedule,
}

impl ShutdownCoordinator {
    pub fn new(schedule: Schedule) -> Self {
        let (sender, _) = watch::channel(ShutdownSignal::Running);
        Self { sender, schedule }
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Current operator-requested signal (schedule boundaries not included)
    pub fn signal(&self) -> ShutdownSignal {
        *self.sender.borrow()
    }

    /// Token carrying the schedule boundaries and this coordinator's signal
    pub fn token(&self) -> CleanupToken {
        CleanupToken {
            receiver: self.sender.subscribe(),
            schedule: self.schedule,
        }
    }

    /// Raise the signal to at least `signal`; lowering is ignored.
    /// Returns whether the signal changed.
    pub fn request(&self, signal: ShutdownSignal) -> bool {
        let changed = self.sender.send_if_modified(|current| {
            if signal > *current {
                *current = signal;
                true
            } else {
                false
            }
        });
        if changed {
            info!("Shutdown signal raised to {}", signal);
        }
        changed
    }

    /// Move one step up the urgency ladder
    pub fn escalate(&self) -> Result<ShutdownSignal, ShutdownError> {
        let next = self
            .signal()
            .next()
            .ok_or(ShutdownError::AlreadyForced)?;
        self.request(next);
        Ok(next)
    }

    /// Escalate once per Ctrl-C until a forced stop has been requested
    pub async fn escalate_on_ctrl_c(&self) -> Result<(), ShutdownError> {
        loop {
            tokio::signal::ctrl_c().await.map_err(ShutdownError::Signal)?;
            match self.escalate()? {
                ShutdownSignal::CleanupOnly => {
                    warn!("Interrupt received: finishing in-flight cycles, press Ctrl-C again to force")
                }
                ShutdownSignal::Forced => {
                    warn!("Second interrupt received: interrupting in-flight cycles");
                    return Ok(());
                }
                ShutdownSignal::Running => {}
            }
        }
    }
}

/// Cooperative cancellation token handed to every virtual user
#[derive(Debug, Clone)]
pub struct CleanupToken {
    receiver: watch::Receiver<ShutdownSignal>,
    schedule: Schedule,
}

impl CleanupToken {
    /// Token bound only to the schedule, with no operator signal
    pub fn from_schedule(schedule: Schedule) -> Self {
        ShutdownCoordinator::new(schedule).token()
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Effective signal at `now`, combining schedule and operator requests
    pub fn signal_at(&self, now: Instant) -> ShutdownSignal {
        let requested = *self.receiver.borrow();
        let scheduled = if is_cleanup_only(now, &self.schedule) {
            ShutdownSignal::CleanupOnly
        } else {
            ShutdownSignal::Running
        };
        requested.max(scheduled)
    }

    /// Checked at the top of every cycle
    pub fn is_cleanup_only(&self) -> bool {
        self.signal_at(Instant::now()) >= ShutdownSignal::CleanupOnly
    }

    pub fn is_forced(&self) -> bool {
        self.signal_at(Instant::now()) == ShutdownSignal::Forced
    }

    /// Resolves once cleanup-only mode is reached
    pub async fn cleanup_only(&self) {
        tokio::select! {
            _ = sleep_until(self.schedule.steady_end) => {}
            _ = self.requested(ShutdownSignal::CleanupOnly) => {}
        }
    }

    /// Resolves once the operator requests a forced stop. The schedule
    /// never forces: cycles still in flight at the end of ramp-down finish.
    pub async fn forced(&self) {
        self.requested(ShutdownSignal::Forced).await
    }

    async fn requested(&self, signal: ShutdownSignal) {
        let mut receiver = self.receiver.clone();
        // A dropped coordinator can no longer escalate
        if receiver.wait_for(|current| *current >= signal).await.is_err() {
            pending::<()>().await;
        }
    }
}

/// Shutdown error types
#[derive(Debug, thiserror::Error)]
pub enum ShutdownError {
    #[error("Forced shutdown already requested")]
    AlreadyForced,

    #[error("Failed to listen for interrupt signal: {0}")]
    Signal(#[source] std::io::Error),
}
