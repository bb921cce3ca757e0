//! Scripted in-memory matching service for engine tests

use matchload_core::{Endpoint, Identity};
use matchload_http::{ClientError, JoinOutcome, MatchClient, QueueStatus, StatusResponse};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Call {
    pub endpoint: Endpoint,
    pub user_id: String,
    /// Offset from the creation of the fake
    pub at: Duration,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum JoinReply {
    Enqueued,
    Conflict,
    ServerError,
}

/// Answers status calls from a timeline of `(offset, status)` entries; the
/// last entry whose offset has passed wins, `WAITING` before the first.
pub(crate) struct FakeClient {
    created: Instant,
    calls: Mutex<Vec<Call>>,
    join_replies: Mutex<VecDeque<JoinReply>>,
    timeline: Vec<(Duration, QueueStatus)>,
    failing_status_calls: Mutex<u32>,
    status_latency: Duration,
    leave_fails: bool,
    ack_fails: bool,
}

impl FakeClient {
    pub fn new() -> Self {
        Self {
            created: Instant::now(),
            calls: Mutex::new(Vec::new()),
            join_replies: Mutex::new(VecDeque::new()),
            timeline: Vec::new(),
            failing_status_calls: Mutex::new(0),
            status_latency: Duration::ZERO,
            leave_fails: false,
            ack_fails: false,
        }
    }

    pub fn status_from(mut self, offset: Duration, status: QueueStatus) -> Self {
        self.timeline.push((offset, status));
        self.timeline.sort_by_key(|(at, _)| *at);
        self
    }

    pub fn matched_after(self, offset: Duration) -> Self {
        self.status_from(offset, QueueStatus::Matched)
    }

    /// Replies for the next join calls; `Enqueued` once exhausted
    pub fn join_replies(self, replies: impl IntoIterator<Item = JoinReply>) -> Self {
        self.join_replies.lock().extend(replies);
        self
    }

    /// The first `count` status calls answer 503
    pub fn failing_status_calls(self, count: u32) -> Self {
        *self.failing_status_calls.lock() = count;
        self
    }

    pub fn status_latency(mut self, latency: Duration) -> Self {
        self.status_latency = latency;
        self
    }

    pub fn failing_leave(mut self) -> Self {
        self.leave_fails = true;
        self
    }

    pub fn failing_ack(mut self) -> Self {
        self.ack_fails = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn calls_to(&self, endpoint: Endpoint) -> Vec<Call> {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.endpoint == endpoint)
            .cloned()
            .collect()
    }

    fn log(&self, endpoint: Endpoint, user_id: &str) {
        self.calls.lock().push(Call {
            endpoint,
            user_id: user_id.to_string(),
            at: self.created.elapsed(),
        });
    }

    fn current_status(&self) -> QueueStatus {
        let elapsed = self.created.elapsed();
        self.timeline
            .iter()
            .rev()
            .find(|(at, _)| *at <= elapsed)
            .map(|(_, status)| *status)
            .unwrap_or(QueueStatus::Waiting)
    }
}

#[async_trait::async_trait]
impl MatchClient for FakeClient {
    async fn join(
        &self,
        identity: &Identity,
        _timeout: Duration,
    ) -> Result<JoinOutcome, ClientError> {
        self.log(Endpoint::Join, &identity.user_id);
        let reply = self
            .join_replies
            .lock()
            .pop_front()
            .unwrap_or(JoinReply::Enqueued);
        match reply {
            JoinReply::Enqueued => Ok(JoinOutcome::Enqueued),
            JoinReply::Conflict => Ok(JoinOutcome::AlreadyQueued),
            JoinReply::ServerError => Err(ClientError::UnexpectedStatus {
                endpoint: Endpoint::Join,
                status: 500,
            }),
        }
    }

    async fn status(
        &self,
        user_id: &str,
        timeout: Duration,
    ) -> Result<StatusResponse, ClientError> {
        self.log(Endpoint::Status, user_id);
        if !self.status_latency.is_zero() {
            tokio::time::sleep(self.status_latency.min(timeout)).await;
            if self.status_latency > timeout {
                return Err(ClientError::Timeout {
                    endpoint: Endpoint::Status,
                    timeout,
                });
            }
        }

        {
            let mut failing = self.failing_status_calls.lock();
            if *failing > 0 {
                *failing -= 1;
                return Err(ClientError::UnexpectedStatus {
                    endpoint: Endpoint::Status,
                    status: 503,
                });
            }
        }

        let status = self.current_status();
        Ok(StatusResponse {
            status,
            matched_with: (status == QueueStatus::Matched).then(|| "partner".to_string()),
        })
    }

    async fn ack(&self, user_id: &str, _timeout: Duration) -> Result<(), ClientError> {
        self.log(Endpoint::Ack, user_id);
        if self.ack_fails {
            return Err(ClientError::UnexpectedStatus {
                endpoint: Endpoint::Ack,
                status: 500,
            });
        }
        Ok(())
    }

    async fn leave(&self, user_id: &str, _timeout: Duration) -> Result<(), ClientError> {
        self.log(Endpoint::Leave, user_id);
        if self.leave_fails {
            return Err(ClientError::UnexpectedStatus {
                endpoint: Endpoint::Leave,
                status: 500,
            });
        }
        Ok(())
    }
}
