//! Sliding window rate limiter keyed by client identifier

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// Limiter settings
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Requests allowed per window
    pub max_requests: u32,
    pub window: Duration,
    /// How often idle clients are dropped from the table
    pub sweep_interval: Duration,
    /// Whether the client identity may come from `x-forwarded-for`
    pub trust_forwarded_for: bool,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_requests: 20,
            window: Duration::from_secs(60),
            sweep_interval: Duration::from_secs(300),
            trust_forwarded_for: false,
        }
    }
}

impl RateLimiterConfig {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            ..Default::default()
        }
    }

    pub fn with_trust_forwarded_for(mut self, trust: bool) -> Self {
        self.trust_forwarded_for = trust;
        self
    }
}

/// Result of a rate limit check
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitResult {
    pub allowed: bool,
    /// Remaining requests in the current window
    pub remaining: u32,
    pub limit: u32,
    /// Seconds until the oldest request leaves the window
    pub reset_in_seconds: u64,
}

#[derive(Debug)]
struct LimiterState {
    windows: HashMap<String, VecDeque<Instant>>,
    last_sweep: Instant,
}

/// Per-client sliding window limiter; all state sits behind one mutex
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    state: Mutex<LimiterState>,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            state: Mutex::new(LimiterState {
                windows: HashMap::new(),
                last_sweep: Instant::now(),
            }),
        }
    }

    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }

    /// Checks the client's window and records the request when allowed
    pub async fn check_and_record(&self, client: &str) -> RateLimitResult {
        self.check_and_record_at(client, Instant::now()).await
    }

    /// Same as [`check_and_record`](Self::check_and_record) with an explicit clock
    pub async fn check_and_record_at(&self, client: &str, now: Instant) -> RateLimitResult {
        let mut state = self.state.lock().await;

        if now.saturating_duration_since(state.last_sweep) >= self.config.sweep_interval {
            Self::sweep(&mut state.windows, self.config.window, now);
            state.last_sweep = now;
        }

        let limit = self.config.max_requests;
        let window = state.windows.entry(client.to_string()).or_default();

        while let Some(oldest) = window.front() {
            if now.saturating_duration_since(*oldest) > self.config.window {
                window.pop_front();
            } else {
                break;
            }
        }

        if window.len() as u32 >= limit {
            let reset_in = window
                .front()
                .map(|oldest| {
                    self.config
                        .window
                        .saturating_sub(now.saturating_duration_since(*oldest))
                        .as_secs()
                        .max(1)
                })
                .unwrap_or_else(|| self.config.window.as_secs());

            return RateLimitResult {
                allowed: false,
                remaining: 0,
                limit,
                reset_in_seconds: reset_in,
            };
        }

        window.push_back(now);

        RateLimitResult {
            allowed: true,
            remaining: limit.saturating_sub(window.len() as u32),
            limit,
            reset_in_seconds: self.config.window.as_secs(),
        }
    }

    /// Forget a client's history
    pub async fn reset(&self, client: &str) {
        self.state.lock().await.windows.remove(client);
    }

    /// Number of clients currently tracked
    pub async fn tracked_clients(&self) -> usize {
        self.state.lock().await.windows.len()
    }

    fn sweep(windows: &mut HashMap<String, VecDeque<Instant>>, window: Duration, now: Instant) {
        for timestamps in windows.values_mut() {
            timestamps.retain(|t| now.saturating_duration_since(*t) <= window);
        }

        windows.retain(|_, v| !v.is_empty());
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimiterConfig::default())
    }
}
