use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// Buckets are pruned once the map holds more keys than this.
const PRUNE_THRESHOLD: usize = 256;

/// Per-service rate limiter using token buckets.
///
/// Keys are service names ("crossref", "wikipedia") or, for arbitrary
/// URLs, the host being checked. Shared by every analysis in the process.
///
/// Callers are never refused: each one reserves the next free slot and
/// waits for it, so waiters are served in arrival order.
pub struct DomainRateLimiter {
    buckets: Mutex<HashMap<String, TokenBucket>>,
    rate: f64,
}

struct TokenBucket {
    /// Negative while slots are reserved ahead of time.
    tokens: f64,
    last_refill: Instant,
    rate: f64, // tokens per second
}

impl TokenBucket {
    fn new(rate: f64) -> Self {
        Self {
            tokens: Self::burst(rate),
            last_refill: Instant::now(),
            rate,
        }
    }

    // Allow a single request of burst even for sub-1/s rates.
    fn burst(rate: f64) -> f64 {
        rate.max(1.0)
    }

    fn refill(&mut self) {
        let elapsed = self.last_refill.elapsed().as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(Self::burst(self.rate));
        self.last_refill = Instant::now();
    }

    /// Reserve one token and return how long to wait before using it.
    fn reserve(&mut self) -> Duration {
        self.refill();
        self.tokens -= 1.0;
        if self.tokens >= 0.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(-self.tokens / self.rate)
        }
    }

    /// A full bucket behaves exactly like a fresh one.
    fn is_idle(&mut self) -> bool {
        self.refill();
        self.tokens >= Self::burst(self.rate)
    }
}

impl DomainRateLimiter {
    /// `rate` is requests per second allowed for each key.
    pub fn new(rate: f64) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            rate,
        }
    }

    /// Wait until a permit for `key` is available.
    pub async fn acquire(&self, key: &str) {
        let wait = {
            let mut buckets = self.buckets.lock().await;
            if buckets.len() > PRUNE_THRESHOLD {
                buckets.retain(|_, bucket| !bucket.is_idle());
            }
            buckets
                .entry(key.to_string())
                .or_insert_with(|| TokenBucket::new(self.rate))
                .reserve()
        };

        if !wait.is_zero() {
            tracing::debug!(key, wait_ms = wait.as_millis() as u64, "Waiting for rate limit");
            tokio::time::sleep(wait).await;
        }
    }

    /// Number of keys currently tracked.
    pub async fn tracked_keys(&self) -> usize {
        self.buckets.lock().await.len()
    }
}

/// Rate-limit key for an arbitrary URL: its host, or the raw string when it
/// does not parse.
pub fn host_key(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}
