//! Pacing for requests to third-party services.
//!
//! The public routing servers the router talks to are rate limited, so all
//! remote work is issued through a [`RateLimiter`]. Two policies exist:
//!
//! - [`RateLimit::Batched`]: fixed-size concurrent groups with a fixed pause
//!   between groups. A batch size of one gives strictly sequential requests.
//! - [`RateLimit::TokenBucket`]: groups of `capacity` requests, each of which
//!   must take a token from a bucket refilled at a steady rate.

use std::future::Future;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Rate limiting policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateLimit {
    /// Run `batch_size` requests at a time, sleeping `delay` between batches.
    Batched { batch_size: usize, delay: Duration },

    /// Allow bursts of up to `capacity` requests, refilling one token every
    /// `refill_every`.
    TokenBucket { capacity: u32, refill_every: Duration },
}

impl RateLimit {
    /// One request at a time with `delay` between requests.
    pub const fn sequential(delay: Duration) -> Self {
        Self::Batched {
            batch_size: 1,
            delay,
        }
    }

    /// Default pacing for edge-weight lookups: groups of 5, 50ms apart.
    pub const fn graph_edges() -> Self {
        Self::Batched {
            batch_size: 5,
            delay: Duration::from_millis(50),
        }
    }

    /// Default pacing for geometry lookups: sequential, 150ms apart.
    pub const fn geometry() -> Self {
        Self::sequential(Duration::from_millis(150))
    }

    /// No pacing at all. Useful for local services and tests.
    pub const fn unlimited(batch_size: usize) -> Self {
        Self::Batched {
            batch_size,
            delay: Duration::ZERO,
        }
    }

    /// Number of requests allowed in flight together.
    pub fn group_size(&self) -> usize {
        match *self {
            RateLimit::Batched { batch_size, .. } => batch_size.max(1),
            RateLimit::TokenBucket { capacity, .. } => capacity.max(1) as usize,
        }
    }
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    fn refill(&mut self, now: Instant, capacity: u32, refill_every: Duration) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        let earned = elapsed.as_secs_f64() / refill_every.as_secs_f64();
        self.tokens = (self.tokens + earned).min(f64::from(capacity));
        self.last_refill = now;
    }
}

/// Applies a [`RateLimit`] to groups of async operations.
///
/// Pacing state is kept across calls to [`RateLimiter::run`], so many small
/// runs against one limiter are spaced like one large run.
#[derive(Debug)]
pub struct RateLimiter {
    policy: RateLimit,
    bucket: Mutex<Bucket>,
    /// When the most recent group finished. Held while a group is in flight.
    last_group: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(policy: RateLimit) -> Self {
        // A zero-capacity bucket could never hand out a token
        let policy = match policy {
            RateLimit::TokenBucket {
                capacity,
                refill_every,
            } => RateLimit::TokenBucket {
                capacity: capacity.max(1),
                refill_every,
            },
            batched => batched,
        };
        let tokens = match policy {
            RateLimit::TokenBucket { capacity, .. } => f64::from(capacity),
            RateLimit::Batched { .. } => 0.0,
        };

        Self {
            policy,
            bucket: Mutex::new(Bucket {
                tokens,
                last_refill: Instant::now(),
            }),
            last_group: Mutex::new(None),
        }
    }

    pub fn policy(&self) -> RateLimit {
        self.policy
    }

    /// Wait until a single request may be issued.
    async fn acquire(&self) {
        let RateLimit::TokenBucket {
            capacity,
            refill_every,
        } = self.policy
        else {
            return;
        };
        if refill_every.is_zero() {
            return;
        }

        let mut bucket = self.bucket.lock().await;
        loop {
            bucket.refill(Instant::now(), capacity, refill_every);
            if bucket.tokens >= 1.0 {
                bucket.tokens -= 1.0;
                return;
            }
            // Timer resolution is 1ms; a shorter wait could spin without refilling
            let wait = refill_every
                .mul_f64(1.0 - bucket.tokens)
                .max(Duration::from_millis(1));
            tokio::time::sleep(wait).await;
        }
    }

    /// Wait out the batch delay since the previous group finished.
    async fn pause(&self, last_group: Option<Instant>) {
        if let RateLimit::Batched { delay, .. } = self.policy
            && let Some(last) = last_group
            && !delay.is_zero()
        {
            tokio::time::sleep_until(last + delay).await;
        }
    }

    /// Run `op` over every item, in groups sized by the policy.
    ///
    /// Operations within a group run concurrently; groups run one after the
    /// other, including groups from concurrent or consecutive calls. Results
    /// are returned in input order.
    pub async fn run<I, T, F, Fut>(&self, items: I, op: F) -> Vec<T>
    where
        I: IntoIterator,
        F: Fn(I::Item) -> Fut,
        Fut: Future<Output = T>,
    {
        let group_size = self.policy.group_size();
        let mut items = items.into_iter();
        let mut results = Vec::new();

        loop {
            let group: Vec<I::Item> = items.by_ref().take(group_size).collect();
            if group.is_empty() {
                break;
            }

            let mut last_group = self.last_group.lock().await;
            self.pause(*last_group).await;

            let op = &op;
            let futures = group.into_iter().map(|item| async move {
                self.acquire().await;
                op(item).await
            });
            results.extend(join_all(futures).await);
            *last_group = Some(Instant::now());
        }

        results
    }
}
