//! In-process matching service used by the end-to-end tests.
//!
//! Pairs the oldest waiting user of one gender with the oldest of the other
//! as soon as both are queued. Mirrors the wire contract of the real service:
//! 409 on a duplicate join, upper-case statuses, `matchedWith` on a match.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Waiting,
    Matched,
}

impl Status {
    fn as_str(&self) -> &'static str {
        match self {
            Status::Idle => "IDLE",
            Status::Waiting => "WAITING",
            Status::Matched => "MATCHED",
        }
    }
}

#[derive(Debug, Default)]
struct Queue {
    males: VecDeque<String>,
    females: VecDeque<String>,
    users: HashMap<String, (Status, Option<String>)>,
    joins: usize,
    conflicts: usize,
    matches: usize,
    acks: usize,
    leaves: usize,
}

impl Queue {
    fn status(&self, user_id: &str) -> Status {
        self.users
            .get(user_id)
            .map(|(status, _)| *status)
            .unwrap_or(Status::Idle)
    }

    fn pair(&mut self) {
        while let (Some(male), Some(female)) = (self.males.front(), self.females.front()) {
            let (male, female) = (male.clone(), female.clone());
            self.males.pop_front();
            self.females.pop_front();
            self.users
                .insert(male.clone(), (Status::Matched, Some(female.clone())));
            self.users.insert(female, (Status::Matched, Some(male)));
            self.matches += 1;
        }
    }

    fn reset(&mut self, user_id: &str) {
        self.males.retain(|id| id != user_id);
        self.females.retain(|id| id != user_id);
        self.users.insert(user_id.to_string(), (Status::Idle, None));
    }
}

/// Counters observed by the fake service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceStats {
    pub joins: usize,
    pub conflicts: usize,
    pub matches: usize,
    pub acks: usize,
    pub leaves: usize,
    pub still_queued: usize,
}

#[derive(Clone, Default)]
pub struct FakeMatchingService {
    queue: Arc<Mutex<Queue>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinBody {
    user_id: String,
    gender: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserBody {
    user_id: String,
}

async fn join(
    State(service): State<FakeMatchingService>,
    Json(body): Json<JoinBody>,
) -> impl IntoResponse {
    let mut queue = service.queue.lock();
    queue.joins += 1;

    if queue.status(&body.user_id) != Status::Idle {
        queue.conflicts += 1;
        return (
            StatusCode::CONFLICT,
            Json(json!({ "error": "ALREADY_IN_QUEUE" })),
        );
    }

    queue
        .users
        .insert(body.user_id.clone(), (Status::Waiting, None));
    if body.gender == "male" {
        queue.males.push_back(body.user_id);
    } else {
        queue.females.push_back(body.user_id);
    }
    queue.pair();

    (StatusCode::OK, Json(json!({ "status": "WAITING" })))
}

async fn status(
    State(service): State<FakeMatchingService>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    let queue = service.queue.lock();
    let (status, matched_with) = queue
        .users
        .get(&user_id)
        .cloned()
        .unwrap_or((Status::Idle, None));

    Json(json!({ "status": status.as_str(), "matchedWith": matched_with }))
}

async fn ack(
    State(service): State<FakeMatchingService>,
    Json(body): Json<UserBody>,
) -> impl IntoResponse {
    let mut queue = service.queue.lock();
    queue.acks += 1;
    queue.reset(&body.user_id);
    Json(json!({ "status": "IDLE" }))
}

async fn leave(
    State(service): State<FakeMatchingService>,
    Json(body): Json<UserBody>,
) -> StatusCode {
    let mut queue = service.queue.lock();
    queue.leaves += 1;
    queue.reset(&body.user_id);
    StatusCode::OK
}

impl FakeMatchingService {
    pub fn router(&self) -> Router {
        Router::new()
            .route("/queue/join", post(join))
            .route("/queue/status/{user_id}", get(status))
            .route("/queue/ack", post(ack))
            .route("/queue/leave", post(leave))
            .with_state(self.clone())
    }

    /// Serve on an ephemeral local port
    pub async fn spawn(&self) -> anyhow::Result<(SocketAddr, JoinHandle<()>)> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = self.router();
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Fake matching service stopped: {}", e);
            }
        });
        Ok((addr, handle))
    }

    pub fn stats(&self) -> ServiceStats {
        let queue = self.queue.lock();
        ServiceStats {
            joins: queue.joins,
            conflicts: queue.conflicts,
            matches: queue.matches,
            acks: queue.acks,
            leaves: queue.leaves,
            still_queued: queue.males.len() + queue.females.len(),
        }
    }
}
