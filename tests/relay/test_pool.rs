// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! RelayPool over network and in-process relays

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::StreamExt;
use redshift::event::kind;
use redshift::relay::{PoolOptions, RelayMessage, RelayRateLimiter};
use tokio::sync::mpsc;
use redshift::{wrap, Filter, Keys, MemoryRelay, Relay, RelayError, RelayPool, SecretBundle, WebSocketRelay};

use super::loopback::LoopbackRelay;

fn fast_options() -> PoolOptions {
    PoolOptions {
        publish_timeout: Duration::from_secs(2),
        publish_attempts: 3,
        retry_base_delay: Duration::from_millis(20),
        query_idle_timeout: Duration::from_millis(300),
        rate_limit_per_second: 1000,
        min_interval: Duration::ZERO,
    }
}

/// In-process relay that takes `delay` to acknowledge each publish
struct SlowRelay {
    inner: MemoryRelay,
    delay: Duration,
}

#[async_trait]
impl Relay for SlowRelay {
    fn url(&self) -> &str {
        self.inner.url()
    }

    async fn subscribe(
        &self,
        subscription_id: &str,
        filters: Vec<Filter>,
    ) -> Result<mpsc::Receiver<RelayMessage>, RelayError> {
        self.inner.subscribe(subscription_id, filters).await
    }

    async fn publish(&self, event: &redshift::Event) -> Result<(), RelayError> {
        tokio::time::sleep(self.delay).await;
        self.inner.publish(event).await
    }
}

fn gift_wrap(keys: &Keys, d_tag: &str) -> redshift::Event {
    let bundle = SecretBundle::from_pairs([("K", d_tag)]).unwrap();
    wrap(&bundle, keys, d_tag).unwrap()
}

#[tokio::test]
async fn test_fetch_merges_network_and_memory_relays() {
    let keys = Keys::generate();
    let server = LoopbackRelay::start().await;
    let memory = Arc::new(MemoryRelay::new("memory://local"));

    let shared = gift_wrap(&keys, "a|prod");
    let network_only = gift_wrap(&keys, "a|dev");
    server.store(shared.clone());
    server.store(network_only.clone());
    memory.inject(shared.clone());

    let relays: Vec<Arc<dyn Relay>> = vec![Arc::new(WebSocketRelay::new(server.url()).unwrap()), memory];
    let pool = RelayPool::new(relays, fast_options());

    let filter = Filter::new().kind(kind::GIFT_WRAP).pubkey_tag(&keys.public_key());
    let events = pool.fetch_events(filter).await.unwrap();

    let mut ids: Vec<String> = events.into_iter().map(|e| e.id).collect();
    ids.sort();
    let mut expected = vec![shared.id, network_only.id];
    expected.sort();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn test_publish_over_websocket_pool() {
    let server = LoopbackRelay::start().await;
    let pool = RelayPool::from_urls(&[server.url()], fast_options()).unwrap();
    let event = gift_wrap(&Keys::generate(), "a|prod");

    let outcome = pool.publish(&event).await.unwrap();
    assert!(outcome.is_success());
    assert_eq!(outcome.accepted, vec![server.url().to_string()]);
    assert_eq!(server.stored().len(), 1);
}

#[tokio::test]
async fn test_publish_retries_with_backoff_then_succeeds() {
    let relay = Arc::new(MemoryRelay::new("memory://flaky"));
    relay.fail_next_publishes(2);
    let pool = RelayPool::new(vec![relay.clone() as Arc<dyn Relay>], fast_options())
        .with_rate_limiter(RelayRateLimiter::unlimited());

    let started = Instant::now();
    let outcome = pool.publish(&gift_wrap(&Keys::generate(), "a|prod")).await.unwrap();

    assert!(outcome.is_success());
    assert_eq!(relay.publish_attempts(), 3);
    // 20ms + 40ms of backoff
    assert!(started.elapsed() >= Duration::from_millis(60));
}

#[tokio::test]
async fn test_publish_returns_on_first_acknowledgement() {
    let fast = Arc::new(MemoryRelay::new("memory://fast"));
    let slow = Arc::new(SlowRelay {
        inner: MemoryRelay::new("memory://slow"),
        delay: Duration::from_millis(800),
    });
    let options = PoolOptions {
        publish_timeout: Duration::from_secs(5),
        ..fast_options()
    };
    let pool = RelayPool::new(vec![fast.clone() as Arc<dyn Relay>, slow.clone() as Arc<dyn Relay>], options)
        .with_rate_limiter(RelayRateLimiter::unlimited());

    let started = Instant::now();
    let outcome = pool.publish(&gift_wrap(&Keys::generate(), "a|prod")).await.unwrap();

    assert!(started.elapsed() < Duration::from_millis(500), "waited {:?}", started.elapsed());
    assert_eq!(outcome.accepted, vec!["memory://fast".to_string()]);
    assert_eq!(fast.len(), 1);

    // The slow relay still receives the event in the background
    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert_eq!(slow.inner.len(), 1);
}

#[tokio::test]
async fn test_publish_gives_up_after_attempt_budget() {
    let relay = Arc::new(MemoryRelay::new("memory://down"));
    relay.set_offline(true);
    let pool = RelayPool::new(vec![relay.clone() as Arc<dyn Relay>], fast_options())
        .with_rate_limiter(RelayRateLimiter::unlimited());

    let event = gift_wrap(&Keys::generate(), "a|prod");
    match pool.publish(&event).await {
        Err(RelayError::PublishTimeout {
            event_id, attempts, ..
        }) => {
            assert_eq!(event_id, event.id);
            assert_eq!(attempts, 3);
        }
        other => panic!("expected PublishTimeout, got {:?}", other),
    }
    assert_eq!(relay.publish_attempts(), 3);
}

#[tokio::test]
async fn test_subscription_yields_each_event_once() {
    let keys = Keys::generate();
    let relays: Vec<Arc<MemoryRelay>> = (0..3)
        .map(|i| Arc::new(MemoryRelay::new(format!("memory://{}", i))))
        .collect();
    let event = gift_wrap(&keys, "a|prod");
    for relay in &relays {
        relay.inject(event.clone());
    }

    let pool = RelayPool::new(
        relays.iter().map(|r| r.clone() as Arc<dyn Relay>).collect(),
        fast_options(),
    );
    let mut subscription = pool.query(Filter::new()).await.unwrap();
    assert!(subscription.id().starts_with("redshift-"));

    let mut seen = Vec::new();
    while let Some(event) = subscription.next().await {
        seen.push(event.id);
    }
    assert_eq!(seen, vec![event.id]);
}

#[test]
fn test_invalid_relay_url_rejected() {
    assert!(matches!(
        RelayPool::from_urls(&["http://relay.example.com"], fast_options()),
        Err(RelayError::InvalidUrl { .. })
    ));
}
