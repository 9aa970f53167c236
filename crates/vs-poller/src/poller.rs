//! Resource-completion poller
//!
//! Repeatedly fetches a remote resource until it reports a terminal status or
//! the session's deadline passes. Retries happen only on non-terminal status;
//! a failed fetch ends the session with that error.
//!
//! ## Session
//!
//! ```text
//! elapsed < max_wait ──► fetch ──► terminal? ──yes──► return resource
//!        ▲                            │ no
//!        └──── backoff += step ◄── sleep(backoff)
//! ```
//!
//! The deadline is checked before each fetch only, so a session can run past
//! `max_wait` by one sleep plus one fetch.

use crate::backoff::LinearBackoff;
use futures::future::try_join_all;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;
use vs_gateway_core::prelude::*;
use vs_gateway_core::{PollerConfig, PollerMetrics};

/// Default deadline for one session
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_millis(600_000);

/// Label used for sessions driven by a caller-supplied fetch
const CUSTOM_KIND: &str = "custom";

mod outcome {
    pub const TERMINAL: &str = "terminal";
    pub const TIMEOUT: &str = "timeout";
    pub const ERROR: &str = "error";
}

// ============================================================================
// Options
// ============================================================================

/// Backoff schedule and deadline for poll sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub backoff: LinearBackoff,
    pub max_wait: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self::from_config(&PollerConfig::default())
    }
}

impl PollOptions {
    pub fn from_config(config: &PollerConfig) -> Self {
        Self {
            backoff: LinearBackoff::from_config(config),
            max_wait: config.max_wait,
        }
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Use `max_wait` when given, else keep the configured deadline
    pub fn with_max_wait_opt(self, max_wait: Option<Duration>) -> Self {
        match max_wait {
            Some(d) => self.with_max_wait(d),
            None => self,
        }
    }

    pub fn max_wait_ms(&self) -> u64 {
        u64::try_from(self.max_wait.as_millis()).unwrap_or(u64::MAX)
    }
}

// ============================================================================
// Session
// ============================================================================

/// State of one polling session; never shared between sessions
#[derive(Debug)]
pub struct PollSession {
    pub session_id: Uuid,
    pub resource_id: String,
    started: Instant,
    max_wait: Duration,
    backoff: LinearBackoff,
    current_backoff: Duration,
    attempts: u32,
}

impl PollSession {
    pub fn new(resource_id: impl Into<String>, options: &PollOptions) -> Self {
        Self {
            session_id: Uuid::now_v7(),
            resource_id: resource_id.into(),
            started: Instant::now(),
            max_wait: options.max_wait,
            backoff: options.backoff,
            current_backoff: options.backoff.first(),
            attempts: 0,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Deadline reached; no further fetch may start
    pub fn is_expired(&self) -> bool {
        self.elapsed() >= self.max_wait
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn current_backoff(&self) -> Duration {
        self.current_backoff
    }

    fn record_attempt(&mut self) {
        self.attempts += 1;
    }

    /// Hand out the sleep for this round and grow the next one
    fn take_backoff(&mut self) -> Duration {
        let delay = self.current_backoff;
        self.current_backoff = self.backoff.next(delay);
        delay
    }
}

// ============================================================================
// Polling
// ============================================================================

/// Poll `fetch` with the default backoff until `is_terminal` holds or
/// `max_wait` elapses.
pub async fn poll_until_terminal<R, F, Fut, P>(
    resource_id: &str,
    fetch: F,
    is_terminal: P,
    max_wait: Duration,
) -> Result<R>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<R>>,
    P: Fn(&R) -> bool,
{
    let options = PollOptions::default().with_max_wait(max_wait);
    poll_with(resource_id, fetch, is_terminal, &options, CUSTOM_KIND).await
}

/// Poll with an explicit schedule; `kind` labels logs and metrics.
pub async fn poll_with<R, F, Fut, P>(
    resource_id: &str,
    mut fetch: F,
    is_terminal: P,
    options: &PollOptions,
    kind: &'static str,
) -> Result<R>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<R>>,
    P: Fn(&R) -> bool,
{
    let metrics = PollerMetrics::new(kind);
    let mut session = PollSession::new(resource_id, options);
    let span = info_span!(
        "poll",
        session_id = %session.session_id,
        resource_id = %resource_id,
        resource_kind = kind,
    );

    let result = async {
        while !session.is_expired() {
            session.record_attempt();
            metrics.record_fetch();

            let resource = match fetch(session.resource_id.clone()).await {
                Ok(r) => r,
                Err(e) => {
                    warn!(attempt = session.attempts(), error = %e, "Fetch failed, abandoning session");
                    metrics.record_outcome(outcome::ERROR);
                    return Err(e);
                }
            };

            if is_terminal(&resource) {
                info!(
                    attempt = session.attempts(),
                    elapsed_ms = session.elapsed().as_millis() as u64,
                    "Resource reached terminal status"
                );
                metrics.record_outcome(outcome::TERMINAL);
                return Ok(resource);
            }

            let delay = session.take_backoff();
            debug!(
                attempt = session.attempts(),
                backoff_ms = delay.as_millis() as u64,
                "Resource not terminal, sleeping"
            );
            metrics.record_sleep(delay);
            sleep(delay).await;
        }

        warn!(
            attempts = session.attempts(),
            max_wait_ms = options.max_wait_ms(),
            "Deadline passed before terminal status"
        );
        metrics.record_outcome(outcome::TIMEOUT);
        Err(GatewayError::timeout(resource_id, options.max_wait_ms()))
    }
    .instrument(span)
    .await;

    metrics.record_session_duration(session.elapsed());
    result
}

/// Poll a typed resource using its own terminal predicate
async fn poll_resource<R, F, Fut>(resource_id: &str, fetch: F, options: &PollOptions) -> Result<R>
where
    R: PollableResource,
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<R>>,
{
    let is_terminal = |resource: &R| {
        debug!(status = resource.status_label(), "Observed status");
        resource.is_terminal()
    };
    poll_with(resource_id, fetch, is_terminal, options, R::KIND.as_str()).await
}

// ============================================================================
// Per-kind Entry Points
// ============================================================================

/// Wait until a vector store is `completed` or `expired`
pub async fn wait_for_vector_store<G>(
    gateway: &G,
    vector_store_id: &str,
    options: &PollOptions,
) -> Result<VectorStore>
where
    G: ResourceGateway + ?Sized,
{
    poll_resource(
        vector_store_id,
        |id: String| async move { gateway.retrieve_vector_store(&id).await },
        options,
    )
    .await
}

/// Wait until a file in a vector store leaves `in_progress`
pub async fn wait_for_vector_store_file<G>(
    gateway: &G,
    vector_store_id: &str,
    file_id: &str,
    options: &PollOptions,
) -> Result<VectorStoreFile>
where
    G: ResourceGateway + ?Sized,
{
    poll_resource(
        file_id,
        |id: String| async move { gateway.retrieve_vector_store_file(vector_store_id, &id).await },
        options,
    )
    .await
}

/// Wait until a file batch leaves `in_progress`
pub async fn wait_for_file_batch<G>(
    gateway: &G,
    vector_store_id: &str,
    batch_id: &str,
    options: &PollOptions,
) -> Result<FileBatch>
where
    G: ResourceGateway + ?Sized,
{
    poll_resource(
        batch_id,
        |id: String| async move { gateway.retrieve_file_batch(vector_store_id, &id).await },
        options,
    )
    .await
}

/// Wait for several files concurrently, one independent session each.
///
/// Fails fast: the first error or timeout drops the remaining sessions.
pub async fn wait_for_vector_store_files<G, S>(
    gateway: &G,
    vector_store_id: &str,
    file_ids: &[S],
    options: &PollOptions,
) -> Result<Vec<VectorStoreFile>>
where
    G: ResourceGateway + ?Sized,
    S: AsRef<str>,
{
    try_join_all(
        file_ids
            .iter()
            .map(|f| wait_for_vector_store_file(gateway, vector_store_id, f.as_ref(), options)),
    )
    .await
}
