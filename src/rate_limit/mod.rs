//! Per-client sliding-window rate limiting.
//!
//! Each key (a client IP) keeps the instants of its admitted requests. A
//! request is rejected when the number of instants inside the trailing window
//! has already reached the ceiling.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default window length.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Sliding-window limiter keyed by client identifier.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    max_requests: usize,
    window: Duration,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindowLimiter {
    /// Create a limiter admitting `max_requests` per trailing minute.
    /// A ceiling of zero disables limiting.
    pub fn new(max_requests: usize) -> Self {
        Self::with_window(max_requests, DEFAULT_WINDOW)
    }

    pub fn with_window(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.max_requests > 0
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record a request for `key` now and report whether it is admitted.
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    /// Same as [`check`](Self::check) with an explicit clock reading.
    pub fn check_at(&self, key: &str, now: Instant) -> bool {
        if !self.is_enabled() {
            return true;
        }

        let Ok(mut hits) = self.hits.lock() else {
            // poisoned lock: fail open
            return true;
        };

        let window = hits.entry(key.to_string()).or_default();
        Self::evict_older_than(window, now, self.window);

        if window.len() >= self.max_requests {
            return false;
        }

        window.push_back(now);
        true
    }

    /// Drop keys whose every request has left the window.
    pub fn cleanup_idle(&self) -> usize {
        self.cleanup_idle_at(Instant::now())
    }

    pub fn cleanup_idle_at(&self, now: Instant) -> usize {
        let Ok(mut hits) = self.hits.lock() else {
            return 0;
        };

        let before = hits.len();
        let window = self.window;
        hits.retain(|_, instants| {
            Self::evict_older_than(instants, now, window);
            !instants.is_empty()
        });
        before - hits.len()
    }

    /// Number of keys currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.hits.lock().map(|hits| hits.len()).unwrap_or(0)
    }

    fn evict_older_than(instants: &mut VecDeque<Instant>, now: Instant, window: Duration) {
        while let Some(oldest) = instants.front() {
            if now.saturating_duration_since(*oldest) >= window {
                instants.pop_front();
            } else {
                break;
            }
        }
    }
}
