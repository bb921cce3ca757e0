//! Wire types of the matching service's queue API

use matchload_core::{Gender, Identity};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Queue state of a user as reported by `GET /queue/status/{userId}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueueStatus {
    Idle,
    Waiting,
    Matched,
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueStatus::Idle => write!(f, "IDLE"),
            QueueStatus::Waiting => write!(f, "WAITING"),
            QueueStatus::Matched => write!(f, "MATCHED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: QueueStatus,
    #[serde(default)]
    pub matched_with: Option<String>,
}

impl StatusResponse {
    pub fn is_matched(&self) -> bool {
        self.status == QueueStatus::Matched
    }
}

/// Body of a successful join (`WAITING`) or ack (`IDLE`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStateResponse {
    pub status: QueueStatus,
}

/// Result of a join call that the engine may continue from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// 200: freshly enqueued
    Enqueued,
    /// 409: an earlier cycle for the same identity is still queued
    AlreadyQueued,
}

/// Body of `POST /queue/join`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest<'a> {
    pub user_id: &'a str,
    pub gender: Gender,
}

impl<'a> From<&'a Identity> for JoinRequest<'a> {
    fn from(identity: &'a Identity) -> Self {
        Self {
            user_id: &identity.user_id,
            gender: identity.gender,
        }
    }
}

/// Body of `POST /queue/ack` and `POST /queue/leave`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest<'a> {
    pub user_id: &'a str,
}
