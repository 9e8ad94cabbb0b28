//! Time-sensitive store
//!
//! Remembers when each id went missing. An id is expired once it has been
//! missing, without an intervening `seen`, for at least the configured TTL.

use changes_core::ExpiryTracker;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Reference expiry window for abandoned connections
pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(45);

/// Missing-since timestamps keyed by connection id
#[derive(Debug)]
pub struct TimeSensitiveStore {
    ttl: Duration,
    missing_since: DashMap<String, Instant>,
}

impl TimeSensitiveStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            missing_since: DashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether `id` is currently counting towards expiry
    pub fn is_missing(&self, id: &str) -> bool {
        self.missing_since.contains_key(id)
    }

    /// Number of ids currently counting towards expiry
    pub fn missing_count(&self) -> usize {
        self.missing_since.len()
    }

    fn is_expired(&self, since: Instant, now: Instant) -> bool {
        now.saturating_duration_since(since) >= self.ttl
    }
}

impl Default for TimeSensitiveStore {
    fn default() -> Self {
        Self::new(DEFAULT_EXPIRY)
    }
}

impl ExpiryTracker for TimeSensitiveStore {
    fn seen(&self, id: &str) {
        self.missing_since.remove(id);
    }

    fn missing(&self, id: &str) {
        // The window starts at the first report; repeats don't extend it.
        self.missing_since
            .entry(id.to_string())
            .or_insert_with(Instant::now);
    }

    fn for_all_expired(&self, action: &mut dyn FnMut(&str)) {
        let now = Instant::now();

        let candidates: Vec<String> = self
            .missing_since
            .iter()
            .filter(|entry| self.is_expired(*entry.value(), now))
            .map(|entry| entry.key().clone())
            .collect();

        for id in candidates {
            // Re-check: a `seen` (or a fresh `missing`) may have landed since the scan.
            let removed = self
                .missing_since
                .remove_if(&id, |_, since| self.is_expired(*since, now));

            if removed.is_some() {
                action(&id);
            }
        }
    }
}
