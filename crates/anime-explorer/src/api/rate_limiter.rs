//! Request pacing for the Jikan API.
//!
//! Enforces both a per-second and a per-minute budget. Callers that share a
//! limiter queue behind each other, so concurrent fetches are spaced too.

use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

const WINDOW: Duration = Duration::from_secs(60);

/// Rate limiter with dual constraints (per-second and per-minute)
#[derive(Debug)]
pub struct RateLimiter {
    /// Minimum spacing between two requests
    min_interval: Duration,
    /// Maximum requests per rolling minute
    max_per_minute: usize,
    state: Mutex<LimiterState>,
}

#[derive(Debug, Default)]
struct LimiterState {
    last_request: Option<Instant>,
    /// Request timestamps inside the rolling window, oldest first
    recent: VecDeque<Instant>,
}

impl LimiterState {
    fn prune(&mut self, now: Instant) {
        while let Some(&oldest) = self.recent.front() {
            if now.duration_since(oldest) >= WINDOW {
                self.recent.pop_front();
            } else {
                break;
            }
        }
    }
}

impl RateLimiter {
    /// Create a new rate limiter. Non-positive budgets disable that constraint.
    pub fn new(max_per_second: f64, max_per_minute: u32) -> Self {
        // A rate so small that its interval overflows means "practically never"
        let min_interval = if max_per_second > 0.0 {
            Duration::try_from_secs_f64(1.0 / max_per_second).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        };

        Self {
            min_interval,
            max_per_minute: max_per_minute as usize,
            state: Mutex::new(LimiterState::default()),
        }
    }

    /// Limiter that never waits
    pub fn unlimited() -> Self {
        Self::new(0.0, 0)
    }

    /// Wait until a request can be made, respecting both limits
    pub async fn acquire(&self) {
        let mut state = self.state.lock().await;

        if self.max_per_minute > 0 {
            state.prune(Instant::now());
            if state.recent.len() >= self.max_per_minute {
                if let Some(&oldest) = state.recent.front() {
                    let wait = WINDOW.saturating_sub(Instant::now().duration_since(oldest));
                    if !wait.is_zero() {
                        tracing::debug!(
                            wait_ms = wait.as_millis() as u64,
                            "Rate limit: waiting for per-minute budget"
                        );
                        sleep(wait).await;
                    }
                }
                state.prune(Instant::now());
            }
        }

        if let Some(last) = state.last_request {
            let elapsed = Instant::now().duration_since(last);
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                tracing::debug!(
                    wait_ms = wait.as_millis() as u64,
                    "Rate limit: waiting for per-second budget"
                );
                sleep(wait).await;
            }
        }

        let now = Instant::now();
        state.last_request = Some(now);
        if self.max_per_minute > 0 {
            state.recent.push_back(now);
        }
    }

    /// Number of requests made in the last minute
    pub async fn current_minute_count(&self) -> usize {
        let mut state = self.state.lock().await;
        state.prune(Instant::now());
        state.recent.len()
    }
}
