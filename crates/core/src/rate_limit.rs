//! Per-client rate limiting with a fixed-window counter.
//!
//! [`RateLimit`] is the portable contract: `allow(key) -> bool`. [`RateLimiter`] is the
//! in-process implementation. Its table lives in this process only, so several server
//! instances each keep their own counts; a shared deployment needs a store with atomic
//! increment-and-expire behind the same trait.
//!
//! The limiter owns a background sweep. Call [`RateLimiter::start`] once inside a Tokio
//! runtime and [`RateLimiter::stop`] on shutdown.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use crate::clock::Clock;
use crate::config::RateLimitConfig;
use crate::constants::{UNKNOWN_CLIENT, UNKNOWN_CLIENT_BUCKETS};

/// Decides whether one more request from `key` may proceed.
pub trait RateLimit: Send + Sync {
    fn allow(&self, key: &str) -> bool;
}

/// Counter state for one key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitRecord {
    pub count: u32,
    pub reset_at: DateTime<Utc>,
}

/// In-memory fixed-window limiter. Cloning shares the same table.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Inner>,
}

struct Inner {
    config: RateLimitConfig,
    window: chrono::Duration,
    clock: Arc<dyn Clock>,
    records: Mutex<HashMap<String, RateLimitRecord>>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        let window = chrono::Duration::from_std(config.window).unwrap_or(chrono::Duration::MAX);
        Self {
            inner: Arc::new(Inner {
                config,
                window,
                clock,
                records: Mutex::new(HashMap::new()),
                sweeper: Mutex::new(None),
            }),
        }
    }

    /// Spawn the periodic expiry sweep. Restarts the task if it is already running.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) {
        let mut sweeper = self
            .inner
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = sweeper.take() {
            handle.abort();
        }

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let period = self.inner.config.sweep_interval;
        *sweeper = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else { break };
                inner.sweep();
            }
        }));
        tracing::debug!("rate limiter sweep started (every {:?})", period);
    }

    /// Stop the sweep and drop every record.
    pub fn stop(&self) {
        if let Some(handle) = self
            .inner
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
        self.inner.lock_records().clear();
    }

    pub fn is_running(&self) -> bool {
        self.inner
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Remove expired records, then evict the soonest-expiring ones if the table is over its
    /// cap. Returns the number of records removed.
    pub fn sweep(&self) -> usize {
        self.inner.sweep()
    }

    pub fn len(&self) -> usize {
        self.inner.lock_records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn record(&self, key: &str) -> Option<RateLimitRecord> {
        self.inner.lock_records().get(key).copied()
    }

    /// The key actually stored for `key` at `now`.
    ///
    /// Blank or unknown identities are spread over time-bucketed synthetic keys so anonymous
    /// traffic neither shares one bucket nor escapes counting altogether.
    fn storage_key(key: &str, now: DateTime<Utc>) -> String {
        let key = key.trim();
        if key.is_empty() || key == UNKNOWN_CLIENT {
            let bucket = now.timestamp_millis().rem_euclid(UNKNOWN_CLIENT_BUCKETS);
            format!("{UNKNOWN_CLIENT}_{bucket}")
        } else {
            key.to_string()
        }
    }
}

impl RateLimit for RateLimiter {
    fn allow(&self, key: &str) -> bool {
        let now = self.inner.clock.now();
        let key = Self::storage_key(key, now);
        let mut records = self.inner.lock_records();

        if let Some(record) = records.get_mut(&key) {
            if now <= record.reset_at {
                if record.count >= self.inner.config.max_requests {
                    return false;
                }
                record.count += 1;
                return true;
            }
        }

        let reset_at = now
            .checked_add_signed(self.inner.window)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        records.insert(key, RateLimitRecord { count: 1, reset_at });
        true
    }
}

impl Inner {
    fn lock_records(&self) -> std::sync::MutexGuard<'_, HashMap<String, RateLimitRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut records = self.lock_records();
        let before = records.len();

        records.retain(|_, record| record.reset_at >= now);

        if records.len() > self.config.max_entries {
            let mut by_expiry: Vec<(String, DateTime<Utc>)> = records
                .iter()
                .map(|(k, r)| (k.clone(), r.reset_at))
                .collect();
            by_expiry.sort_by_key(|(_, reset_at)| *reset_at);
            let excess = by_expiry.len() - self.config.evict_to;
            for (key, _) in by_expiry.into_iter().take(excess) {
                records.remove(&key);
            }
        }

        let removed = before - records.len();
        if removed > 0 {
            tracing::debug!("rate limiter sweep removed {} records", removed);
        }
        removed
    }
}
