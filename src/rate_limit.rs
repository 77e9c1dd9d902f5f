//! In-memory fixed-window rate limiting.
//!
//! Counters are keyed by `(client, endpoint)` and live only in this process.
//! Behind several instances each one enforces its own limit.

use axum::http::HeaderMap;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Length of one rate limit window.
pub const WINDOW: Duration = Duration::from_secs(60);

/// Default map size above which expired entries are pruned.
pub const DEFAULT_PRUNE_THRESHOLD: usize = 10_000;

/// Client id used when no proxy header identifies the caller.
pub const UNKNOWN_CLIENT: &str = "unknown";

#[derive(Debug, Clone, Copy)]
struct Entry {
    count: u32,
    reset_at: Instant,
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    /// Rejected until the current window ends.
    Rejected { retry_after: Duration },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed)
    }

    /// Whole seconds to put in a `Retry-After` header (at least 1).
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            RateLimitDecision::Allowed => None,
            RateLimitDecision::Rejected { retry_after } => {
                let mut secs = retry_after.as_secs();
                if retry_after.subsec_nanos() > 0 {
                    secs += 1;
                }
                Some(secs.max(1))
            }
        }
    }
}

/// Per-client, per-endpoint request counter.
#[derive(Debug)]
pub struct RateLimiter {
    entries: Mutex<HashMap<(String, String), Entry>>,
    prune_threshold: usize,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_PRUNE_THRESHOLD)
    }
}

impl RateLimiter {
    pub fn new(prune_threshold: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            prune_threshold,
        }
    }

    /// Count a request from `client` to `endpoint` against `max_per_minute`.
    pub fn check(&self, client: &str, endpoint: &str, max_per_minute: u32) -> RateLimitDecision {
        self.check_at(Instant::now(), client, endpoint, max_per_minute)
    }

    /// [`RateLimiter::check`] with an explicit clock reading.
    pub fn check_at(
        &self,
        now: Instant,
        client: &str,
        endpoint: &str,
        max_per_minute: u32,
    ) -> RateLimitDecision {
        // Increment and compare under one lock so concurrent bursts cannot
        // undercount. A poisoned lock only means another request panicked
        // mid-update; the counters themselves are still usable.
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        if entries.len() > self.prune_threshold {
            prune(&mut entries, now);
        }

        let entry = entries
            .entry((client.to_string(), endpoint.to_string()))
            .or_insert(Entry {
                count: 0,
                reset_at: now + WINDOW,
            });

        if now >= entry.reset_at {
            entry.count = 0;
            entry.reset_at = now + WINDOW;
        }

        entry.count = entry.count.saturating_add(1);

        if entry.count > max_per_minute {
            RateLimitDecision::Rejected {
                retry_after: entry.reset_at.saturating_duration_since(now),
            }
        } else {
            RateLimitDecision::Allowed
        }
    }

    /// Number of tracked `(client, endpoint)` pairs.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn prune(entries: &mut HashMap<(String, String), Entry>, now: Instant) {
    let before = entries.len();
    entries.retain(|_, entry| entry.reset_at > now);
    tracing::debug!(
        pruned = before - entries.len(),
        remaining = entries.len(),
        "Pruned expired rate limit entries"
    );
}

/// Best-effort client identity for rate limiting.
///
/// Uses the first `X-Forwarded-For` address, then `X-Real-IP`, then
/// [`UNKNOWN_CLIENT`]. Headers are client-controlled, so this damps abuse but
/// does not stop a determined caller.
pub fn client_identifier(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }
    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Hash a client id so it can be logged without recording the address.
pub fn client_hash(client: &str) -> String {
    let mut hasher = std::hash::DefaultHasher::new();
    client.hash(&mut hasher);
    format!("{:x}", hasher.finish())
}
