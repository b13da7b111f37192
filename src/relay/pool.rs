// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Relay pool: fan-out queries and publishes over every configured relay

use std::collections::HashSet;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::error::RelayError;
use super::message::RelayMessage;
use super::rate_limiter::{RelayRateLimiter, DEFAULT_MIN_INTERVAL, DEFAULT_OPS_PER_SECOND};
use super::transport::Relay;
use super::websocket::WebSocketRelay;
use crate::event::{Event, Filter};

/// Default number of publish attempts
pub const DEFAULT_PUBLISH_ATTEMPTS: u32 = 3;

/// Default base delay for exponential backoff (1s, 2s, 4s)
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Default per-attempt publish timeout
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

/// Default inactivity window before a relay's query is considered finished
pub const DEFAULT_QUERY_IDLE_TIMEOUT: Duration = Duration::from_secs(3);

const EVENT_BUFFER: usize = 1024;

/// Timing and retry policy for a pool
#[derive(Debug, Clone)]
pub struct PoolOptions {
    pub publish_timeout: Duration,
    pub publish_attempts: u32,
    pub retry_base_delay: Duration,
    pub query_idle_timeout: Duration,
    pub rate_limit_per_second: u32,
    pub min_interval: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            publish_timeout: DEFAULT_PUBLISH_TIMEOUT,
            publish_attempts: DEFAULT_PUBLISH_ATTEMPTS,
            retry_base_delay: DEFAULT_RETRY_BASE_DELAY,
            query_idle_timeout: DEFAULT_QUERY_IDLE_TIMEOUT,
            rate_limit_per_second: DEFAULT_OPS_PER_SECOND,
            min_interval: DEFAULT_MIN_INTERVAL,
        }
    }
}

/// Per-relay result of one publish attempt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishOutcome {
    pub event_id: String,
    /// Relays that stored the event (or already had it)
    pub accepted: Vec<String>,
    /// Relays that failed, with the reason
    pub rejected: Vec<(String, String)>,
}

impl PublishOutcome {
    fn new(event_id: &str) -> Self {
        Self {
            event_id: event_id.to_string(),
            ..Default::default()
        }
    }

    fn record(&mut self, url: String, result: Result<(), RelayError>) {
        match result {
            Ok(()) => self.accepted.push(url),
            Err(e) => self.rejected.push((url, e.to_string())),
        }
    }

    /// At least one relay acknowledged
    pub fn is_success(&self) -> bool {
        !self.accepted.is_empty()
    }

    fn summary(&self) -> String {
        if self.rejected.is_empty() {
            return "no relay answered".to_string();
        }
        self.rejected
            .iter()
            .map(|(relay, reason)| format!("{}: {}", relay, reason))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Live query over every relay of a pool
///
/// Yields verified events, each id at most once, in arrival order. The stream
/// ends once every relay has finished (EOSE, closed or idle). After
/// [`Subscription::close`] nothing more is yielded.
pub struct Subscription {
    id: String,
    receiver: mpsc::Receiver<Event>,
    token: CancellationToken,
    seen: HashSet<String>,
    closed: bool,
}

impl Subscription {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Unsubscribe from every relay and stop emitting events
    pub fn close(&mut self) {
        if !self.closed {
            debug!("Closing subscription {}", self.id);
        }
        self.closed = true;
        self.token.cancel();
        self.receiver.close();
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Stream for Subscription {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Event>> {
        if self.closed {
            return Poll::Ready(None);
        }
        loop {
            match self.receiver.poll_recv(cx) {
                Poll::Ready(Some(event)) => {
                    if self.seen.insert(event.id.clone()) {
                        return Poll::Ready(Some(event));
                    }
                }
                Poll::Ready(None) => {
                    self.closed = true;
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Forward one relay's answers into the shared channel until it finishes
async fn forward_relay(
    relay: Arc<dyn Relay>,
    subscription_id: String,
    filters: Vec<Filter>,
    tx: mpsc::Sender<Event>,
    token: CancellationToken,
    idle_timeout: Duration,
) {
    let mut incoming = tokio::select! {
        _ = token.cancelled() => return,
        result = relay.subscribe(&subscription_id, filters) => match result {
            Ok(rx) => rx,
            Err(e) => {
                warn!("Subscription {} failed on {}: {}", subscription_id, relay.url(), e);
                return;
            }
        },
    };

    let mut forwarded = 0usize;
    loop {
        let next = tokio::select! {
            _ = token.cancelled() => break,
            next = tokio::time::timeout(idle_timeout, incoming.recv()) => next,
        };

        match next {
            Err(_) => {
                debug!("{} idle for {:?}, finishing", relay.url(), idle_timeout);
                break;
            }
            Ok(None) => break,
            Ok(Some(RelayMessage::Event {
                subscription_id: sub,
                event,
            })) => {
                if sub != subscription_id {
                    continue;
                }
                if let Err(e) = event.verify() {
                    warn!("Dropping event {} from {}: {}", event.id, relay.url(), e);
                    continue;
                }
                let sent = tokio::select! {
                    _ = token.cancelled() => false,
                    result = tx.send(*event) => result.is_ok(),
                };
                if !sent {
                    break;
                }
                forwarded += 1;
            }
            Ok(Some(RelayMessage::Eose { .. })) => break,
            Ok(Some(RelayMessage::Closed { message, .. })) => {
                warn!("{} closed subscription {}: {}", relay.url(), subscription_id, message);
                break;
            }
            Ok(Some(RelayMessage::Notice { message })) => {
                debug!("Notice from {}: {}", relay.url(), message);
            }
            Ok(Some(RelayMessage::Ok { .. })) => {}
        }
    }
    debug!("{} delivered {} events for {}", relay.url(), forwarded, subscription_id);
    // Dropping `incoming` ends the subscription on the relay.
}

pub struct RelayPool {
    relays: Vec<Arc<dyn Relay>>,
    options: PoolOptions,
    limiter: RelayRateLimiter,
}

impl RelayPool {
    pub fn new(relays: Vec<Arc<dyn Relay>>, options: PoolOptions) -> Self {
        let limiter = RelayRateLimiter::new(options.rate_limit_per_second, options.min_interval);
        Self {
            relays,
            options,
            limiter,
        }
    }

    /// Pool of WebSocket relays; fails on the first invalid URL
    pub fn from_urls<S: AsRef<str>>(urls: &[S], options: PoolOptions) -> Result<Self, RelayError> {
        let relays = urls
            .iter()
            .map(|url| WebSocketRelay::new(url.as_ref()).map(|r| Arc::new(r) as Arc<dyn Relay>))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(relays, options))
    }

    /// Replace the rate limiter (e.g. to share one across pools)
    pub fn with_rate_limiter(mut self, limiter: RelayRateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn relay_urls(&self) -> Vec<String> {
        self.relays.iter().map(|r| r.url().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.relays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relays.is_empty()
    }

    pub fn options(&self) -> &PoolOptions {
        &self.options
    }

    /// Subscribe on every relay and merge the results
    pub async fn query(&self, filter: Filter) -> Result<Subscription, RelayError> {
        if self.relays.is_empty() {
            return Err(RelayError::NoRelaysConfigured);
        }
        self.limiter.acquire().await;

        let id = format!("redshift-{}", Uuid::new_v4());
        let token = CancellationToken::new();
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);

        debug!("Opening subscription {} on {} relays", id, self.relays.len());
        for relay in &self.relays {
            tokio::spawn(forward_relay(
                relay.clone(),
                id.clone(),
                vec![filter.clone()],
                tx.clone(),
                token.clone(),
                self.options.query_idle_timeout,
            ));
        }

        Ok(Subscription {
            id,
            receiver: rx,
            token,
            seen: HashSet::new(),
            closed: false,
        })
    }

    /// Run a query to completion and collect the distinct events
    pub async fn fetch_events(&self, filter: Filter) -> Result<Vec<Event>, RelayError> {
        let subscription = self.query(filter).await?;
        Ok(subscription.collect().await)
    }

    /// One publish round; returns as soon as any relay acknowledges
    ///
    /// Each relay is driven by its own task, so slower relays keep receiving
    /// the event after this returns.
    async fn publish_once(&self, event: &Event) -> PublishOutcome {
        let timeout = self.options.publish_timeout;
        let (tx, mut rx) = mpsc::channel(self.relays.len().max(1));

        for relay in &self.relays {
            let relay = relay.clone();
            let event = event.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let url = relay.url().to_string();
                let result = match tokio::time::timeout(timeout, relay.publish(&event)).await {
                    Ok(result) => result,
                    Err(_) => Err(RelayError::Timeout {
                        relay: url.clone(),
                        timeout_ms: timeout.as_millis() as u64,
                    }),
                };
                if let Err(mpsc::error::SendError((url, result))) = tx.send((url, result)).await {
                    match result {
                        Ok(()) => debug!("{} stored {} after the publish returned", url, event.id),
                        Err(e) => debug!("{} failed {} after the publish returned: {}", url, event.id, e),
                    }
                }
            });
        }
        drop(tx);

        let mut outcome = PublishOutcome::new(&event.id);
        while let Some((url, result)) = rx.recv().await {
            outcome.record(url, result);
            if outcome.is_success() {
                break;
            }
        }
        // Report relays that already answered; never wait on the rest
        while let Ok((url, result)) = rx.try_recv() {
            outcome.record(url, result);
        }
        outcome
    }

    /// Publish to every relay, retrying with exponential backoff until one acknowledges
    ///
    /// Returns on the first acknowledgement. The outcome lists only the relays
    /// that had answered by then. Returns `PublishTimeout` once the attempt
    /// budget is spent.
    pub async fn publish(&self, event: &Event) -> Result<PublishOutcome, RelayError> {
        if self.relays.is_empty() {
            return Err(RelayError::NoRelaysConfigured);
        }

        let attempts = self.options.publish_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 0..attempts {
            self.limiter.acquire().await;
            let start_time = Instant::now();
            let outcome = self.publish_once(event).await;

            if outcome.is_success() {
                info!(
                    "Published {} to {}/{} relays (attempt {}/{}, {}ms)",
                    event.id,
                    outcome.accepted.len(),
                    self.relays.len(),
                    attempt + 1,
                    attempts,
                    start_time.elapsed().as_millis()
                );
                return Ok(outcome);
            }

            last_error = outcome.summary();
            warn!(
                "Publish attempt {}/{} for {} failed: {}",
                attempt + 1,
                attempts,
                event.id,
                last_error
            );
            if attempt + 1 < attempts {
                let delay = self.options.retry_base_delay * 2u32.saturating_pow(attempt);
                debug!("Waiting {:?} before retry", delay);
                tokio::time::sleep(delay).await;
            }
        }

        error!(
            "Publish of {} failed after {} attempts: {}",
            event.id, attempts, last_error
        );
        Err(RelayError::PublishTimeout {
            event_id: event.id.clone(),
            attempts,
            last_error,
        })
    }

    /// Fire-and-forget publish: one attempt, failures are only logged
    pub async fn publish_advisory(&self, event: &Event) -> PublishOutcome {
        if self.relays.is_empty() {
            warn!("No relays for advisory event {}", event.id);
            return PublishOutcome::new(&event.id);
        }
        self.limiter.acquire().await;
        let outcome = self.publish_once(event).await;
        if outcome.is_success() {
            debug!("Advisory event {} accepted by {} relays", event.id, outcome.accepted.len());
        } else {
            warn!("Advisory event {} not accepted: {}", event.id, outcome.summary());
        }
        outcome
    }
}

impl std::fmt::Debug for RelayPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayPool")
            .field("relays", &self.relay_urls())
            .field("options", &self.options)
            .finish()
    }
}
