//! Matching service client implementation

use crate::config::ClientConfig;
use crate::errors::ClientError;
use crate::types::{
    JoinOutcome, JoinRequest, QueueStateResponse, QueueStatus, StatusResponse, UserRequest,
};
use matchload_core::{Endpoint, Identity, MetricsAggregator};
use reqwest::{Client, RequestBuilder, StatusCode};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};
use url::Url;

/// The four queue operations a virtual user performs
///
/// Every call takes its own timeout: polling shrinks it to the time left
/// before the deadline, cleanup uses a deliberately short one.
#[async_trait::async_trait]
pub trait MatchClient: Send + Sync {
    /// `POST /queue/join`; 200 and 409 are both continuable
    async fn join(&self, identity: &Identity, timeout: Duration)
        -> Result<JoinOutcome, ClientError>;

    /// `GET /queue/status/{userId}`
    async fn status(&self, user_id: &str, timeout: Duration)
        -> Result<StatusResponse, ClientError>;

    /// `POST /queue/ack`
    async fn ack(&self, user_id: &str, timeout: Duration) -> Result<(), ClientError>;

    /// `POST /queue/leave`
    async fn leave(&self, user_id: &str, timeout: Duration) -> Result<(), ClientError>;
}

/// reqwest-backed [`MatchClient`] with request-level metric recording
#[derive(Debug, Clone)]
pub struct HttpMatchClient {
    client: Client,
    base_url: Url,
    metrics: Arc<MetricsAggregator>,
}

impl HttpMatchClient {
    pub fn new(config: &ClientConfig, metrics: Arc<MetricsAggregator>) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(&config.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(config.base_url.clone()));
        }
        // Endpoint paths are appended below any path prefix of the base URL
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        debug!(
            "Creating matching service client for {} with {}s timeout",
            base_url,
            config.request_timeout.as_secs()
        );

        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            metrics,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint_url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request, read its body and record it.
    ///
    /// `expected` lists non-2xx statuses that are part of the contract and
    /// therefore not counted as failed requests.
    async fn execute(
        &self,
        endpoint: Endpoint,
        request: RequestBuilder,
        timeout: Duration,
        expected: &[StatusCode],
    ) -> Result<(StatusCode, Vec<u8>), ClientError> {
        let started = Instant::now();
        let result = async {
            let response = request.timeout(timeout).send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, body.to_vec()))
        }
        .await;
        let elapsed = started.elapsed();

        let failed = match &result {
            Ok((status, _)) => {
                !(status.is_success() || status.is_redirection() || expected.contains(status))
            }
            Err(_) => true,
        };
        self.metrics.record_request(endpoint, elapsed, failed);

        match result {
            Ok((status, body)) => {
                trace!("{} -> {} in {:?}", endpoint, status, elapsed);
                Ok((status, body))
            }
            Err(e) if e.is_timeout() => Err(ClientError::Timeout { endpoint, timeout }),
            Err(e) => Err(ClientError::Transport(e)),
        }
    }

    async fn post_user(
        &self,
        endpoint: Endpoint,
        user_id: &str,
        timeout: Duration,
    ) -> Result<Vec<u8>, ClientError> {
        let url = self.endpoint_url(&["queue", endpoint.as_str()])?;
        let request = self.client.post(url).json(&UserRequest { user_id });
        let (status, body) = self.execute(endpoint, request, timeout, &[]).await?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(ClientError::UnexpectedStatus {
                endpoint,
                status: status.as_u16(),
            })
        }
    }
}

/// Log a successful response whose body does not report `expected`.
/// The call itself still counts as successful.
fn check_reported_status(endpoint: Endpoint, body: &[u8], expected: QueueStatus) {
    match serde_json::from_slice::<QueueStateResponse>(body) {
        Ok(reported) if reported.status == expected => {}
        Ok(reported) => debug!(
            "{} answered with status {}, expected {}",
            endpoint, reported.status, expected
        ),
        Err(e) => debug!(
            "{} answered without a readable status (expected {}): {}",
            endpoint, expected, e
        ),
    }
}

#[async_trait::async_trait]
impl MatchClient for HttpMatchClient {
    async fn join(
        &self,
        identity: &Identity,
        timeout: Duration,
    ) -> Result<JoinOutcome, ClientError> {
        let url = self.endpoint_url(&["queue", "join"])?;
        let request = self.client.post(url).json(&JoinRequest::from(identity));
        let (status, body) = self
            .execute(Endpoint::Join, request, timeout, &[StatusCode::CONFLICT])
            .await?;

        match status {
            StatusCode::OK => {
                check_reported_status(Endpoint::Join, &body, QueueStatus::Waiting);
                Ok(JoinOutcome::Enqueued)
            }
            StatusCode::CONFLICT => Ok(JoinOutcome::AlreadyQueued),
            other => Err(ClientError::UnexpectedStatus {
                endpoint: Endpoint::Join,
                status: other.as_u16(),
            }),
        }
    }

    async fn status(
        &self,
        user_id: &str,
        timeout: Duration,
    ) -> Result<StatusResponse, ClientError> {
        let url = self.endpoint_url(&["queue", "status", user_id])?;
        let (status, body) = self
            .execute(Endpoint::Status, self.client.get(url), timeout, &[])
            .await?;

        if status != StatusCode::OK {
            return Err(ClientError::UnexpectedStatus {
                endpoint: Endpoint::Status,
                status: status.as_u16(),
            });
        }
        Ok(serde_json::from_slice(&body)?)
    }

    async fn ack(&self, user_id: &str, timeout: Duration) -> Result<(), ClientError> {
        let body = self.post_user(Endpoint::Ack, user_id, timeout).await?;
        check_reported_status(Endpoint::Ack, &body, QueueStatus::Idle);
        Ok(())
    }

    async fn leave(&self, user_id: &str, timeout: Duration) -> Result<(), ClientError> {
        self.post_user(Endpoint::Leave, user_id, timeout).await?;
        Ok(())
    }
}
