use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use dashmap::DashMap;

/// Sliding window in-memory rate limiter (process local).
#[derive(Clone)]
pub struct InMemoryRateLimiter {
    store: Arc<DashMap<String, VecDeque<Instant>>>,
    pub enabled: bool,
}

impl InMemoryRateLimiter {
    pub fn new(enabled: bool) -> Self {
        Self { store: Arc::new(DashMap::new()), enabled }
    }

    /// Returns true if allowed, false if limited.
    pub fn check(&self, key: &str, limit: usize, window: Duration) -> bool {
        if !self.enabled { return true; }
        let now = Instant::now();
        let mut entry = self.store.entry(key.to_string()).or_default();
        while let Some(front) = entry.front() {
            if now.duration_since(*front) >= window { entry.pop_front(); } else { break; }
        }
        if entry.len() < limit {
            entry.push_back(now);
            true
        } else {
            false
        }
    }
}

/// Per-action limits derived from env.
#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    pub job_limit: usize,
    pub job_window: Duration,
    pub message_limit: usize,
    pub message_window: Duration,
    pub post_limit: usize,
    pub post_window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            job_limit: 5,
            job_window: Duration::from_secs(3600),
            message_limit: 30,
            message_window: Duration::from_secs(60),
            post_limit: 10,
            post_window: Duration::from_secs(600),
        }
    }
}

impl RateLimitConfig {
    pub fn from_env() -> Self {
        fn usize_env(name: &str, default: usize) -> usize { std::env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default) }
        fn dur_env(name: &str, default: Duration) -> Duration {
            std::env::var(name).ok().and_then(|v| v.parse().ok()).map(Duration::from_secs).unwrap_or(default)
        }
        let d = Self::default();
        Self {
            job_limit: usize_env("RL_JOB_LIMIT", d.job_limit),
            job_window: dur_env("RL_JOB_WINDOW", d.job_window),
            message_limit: usize_env("RL_MESSAGE_LIMIT", d.message_limit),
            message_window: dur_env("RL_MESSAGE_WINDOW", d.message_window),
            post_limit: usize_env("RL_POST_LIMIT", d.post_limit),
            post_window: dur_env("RL_POST_WINDOW", d.post_window),
        }
    }
}

/// High level guard used by handlers; keys are session subjects.
#[derive(Clone)]
pub struct RateLimiterFacade {
    pub limiter: InMemoryRateLimiter,
    pub cfg: RateLimitConfig,
}

impl RateLimiterFacade {
    pub fn new(limiter: InMemoryRateLimiter, cfg: RateLimitConfig) -> Self { Self { limiter, cfg } }
    pub fn allow_job(&self, user: &str) -> bool { self.limiter.check(&format!("job:{user}"), self.cfg.job_limit, self.cfg.job_window) }
    pub fn allow_message(&self, user: &str) -> bool { self.limiter.check(&format!("message:{user}"), self.cfg.message_limit, self.cfg.message_window) }
    pub fn allow_post(&self, user: &str) -> bool { self.limiter.check(&format!("post:{user}"), self.cfg.post_limit, self.cfg.post_window) }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn sliding_window_basic() {
        let rl = InMemoryRateLimiter::new(true);
        let window = Duration::from_millis(50);
        for _ in 0..3 { assert!(rl.check("k", 3, window)); }
        assert!(!rl.check("k", 3, window));
    }

    #[test]
    fn limits_are_per_user_and_action() {
        let cfg = RateLimitConfig { job_limit: 1, ..RateLimitConfig::default() };
        let rl = RateLimiterFacade::new(InMemoryRateLimiter::new(true), cfg);
        assert!(rl.allow_job("alice"));
        assert!(!rl.allow_job("alice"));
        assert!(rl.allow_job("bob"));
        assert!(rl.allow_post("alice"));
    }

    #[test]
    fn disabled_limiter_allows_everything() {
        let rl = InMemoryRateLimiter::new(false);
        for _ in 0..10 { assert!(rl.check("k", 1, Duration::from_secs(60))); }
    }
}
