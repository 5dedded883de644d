//! Per-client token-bucket admission control.
//!
//! Every client id (normally the peer IP) owns a bucket holding up to `R`
//! tokens that refills continuously. An admitted request spends one token; a
//! denied request spends nothing. All client state lives in one map behind a
//! single mutex so check-and-update is atomic across request handlers.
//!
//! Idle buckets are swept inline, under the same lock, at most once per
//! `sweep_interval`: any client not seen for longer than `idle_timeout` is
//! dropped. A client that keeps calling, however sparsely, stays tracked.

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// System clock implementation using `Instant::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Unit of the configured request rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateInterval {
    Second,
    #[default]
    Minute,
}

impl RateInterval {
    const fn seconds(self) -> f64 {
        match self {
            Self::Second => 1.0,
            Self::Minute => 60.0,
        }
    }
}

/// Rate limiter settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitConfig {
    /// Bucket capacity and requests allowed per `per`
    pub requests: u32,
    pub per: RateInterval,
    /// A client unseen for longer than this is forgotten
    pub idle_timeout: Duration,
    /// Minimum time between two inline sweeps
    pub sweep_interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests: 60,
            per: RateInterval::Minute,
            idle_timeout: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ClientState {
    tokens: f64,
    last_refill: Instant,
}

#[derive(Debug)]
struct Buckets {
    clients: HashMap<String, ClientState>,
    last_sweep: Instant,
}

/// Thread-safe token-bucket limiter shared by all request handlers.
pub struct RateLimiter<C: Clock = SystemClock> {
    capacity: f64,
    refill_per_second: f64,
    idle_timeout: Duration,
    sweep_interval: Duration,
    clock: C,
    buckets: Mutex<Buckets>,
}

impl RateLimiter<SystemClock> {
    #[must_use]
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> RateLimiter<C> {
    pub fn with_clock(config: &RateLimitConfig, clock: C) -> Self {
        let capacity = f64::from(config.requests);
        let now = clock.now();

        Self {
            capacity,
            refill_per_second: capacity / config.per.seconds(),
            idle_timeout: config.idle_timeout,
            sweep_interval: config.sweep_interval,
            clock,
            buckets: Mutex::new(Buckets {
                clients: HashMap::new(),
                last_sweep: now,
            }),
        }
    }

    /// Try to admit one request from `client`.
    ///
    /// Returns `false` when the client has less than one token left; its
    /// bucket is left untouched apart from the refill.
    pub fn is_allowed(&self, client: &str) -> bool {
        let now = self.clock.now();
        let mut buckets = self.lock();

        if now.saturating_duration_since(buckets.last_sweep) >= self.sweep_interval {
            self.sweep_locked(&mut buckets, now);
        }

        let capacity = self.capacity;
        let state = buckets
            .clients
            .entry(client.to_string())
            .or_insert(ClientState {
                tokens: capacity,
                last_refill: now,
            });

        let elapsed = now.saturating_duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_per_second).min(capacity);
        state.last_refill = now;

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Drop every client idle for longer than the idle timeout.
    /// Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut buckets = self.lock();
        self.sweep_locked(&mut buckets, now)
    }

    /// Number of clients currently holding a bucket
    pub fn tracked_clients(&self) -> usize {
        self.lock().clients.len()
    }

    pub fn is_tracked(&self, client: &str) -> bool {
        self.lock().clients.contains_key(client)
    }

    fn sweep_locked(&self, buckets: &mut Buckets, now: Instant) -> usize {
        let before = buckets.clients.len();
        let idle_timeout = self.idle_timeout;
        buckets
            .clients
            .retain(|_, state| now.saturating_duration_since(state.last_refill) <= idle_timeout);
        buckets.last_sweep = now;

        let removed = before - buckets.clients.len();
        if removed > 0 {
            tracing::debug!(
                removed,
                remaining = buckets.clients.len(),
                "swept idle rate-limit clients"
            );
        }
        removed
    }

    // Bucket state stays consistent even if a holder panicked, so a poisoned
    // lock is recovered rather than propagated.
    fn lock(&self) -> MutexGuard<'_, Buckets> {
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Controllable clock for deterministic tests.
#[cfg(test)]
#[derive(Debug, Clone)]
pub(crate) struct MockClock {
    current_time: std::sync::Arc<Mutex<Instant>>,
}

#[cfg(test)]
impl MockClock {
    pub(crate) fn new(start: Instant) -> Self {
        Self {
            current_time: std::sync::Arc::new(Mutex::new(start)),
        }
    }

    pub(crate) fn advance(&self, duration: Duration) {
        let mut time = self.current_time.lock().unwrap();
        *time += duration;
    }
}

#[cfg(test)]
impl Clock for MockClock {
    fn now(&self) -> Instant {
        *self.current_time.lock().unwrap()
    }
}
