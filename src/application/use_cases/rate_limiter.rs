//! Fixed-window rate limiting for mutating service routes
//!
//! - Request counting per caller key
//! - Lazy window creation and reset on expiry
//! - Retry-after reporting for limited callers

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::error::{AppError, Result};

/// Rate limit configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests allowed per window
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: i64,
}

fn default_max_requests() -> u32 {
    30
}

fn default_window_secs() -> i64 {
    3600
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
        }
    }
}

/// One caller's window state
#[derive(Debug, Clone)]
pub struct RateWindow {
    pub count: u32,
    pub window_reset_at: DateTime<Utc>,
}

/// Window store shared across server workers; keys are caller identities
pub type SharedRateLimitStore = Arc<Mutex<HashMap<String, RateWindow>>>;

pub fn new_rate_limit_store() -> SharedRateLimitStore {
    Arc::new(Mutex::new(HashMap::new()))
}

/// Rate limit check result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Request counted; budget left in the current window
    Allowed { remaining: u32 },
    /// Budget exhausted until the window resets
    Limited { retry_after_secs: i64 },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed { .. })
    }
}

/// Fixed-window limiter. Clones handed the same store enforce one
/// combined budget; the store is injected so tests control it.
#[derive(Clone)]
pub struct RateLimiter {
    store: SharedRateLimitStore,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(store: SharedRateLimitStore, config: RateLimitConfig) -> Self {
        Self { store, config }
    }

    pub fn with_default_store(config: RateLimitConfig) -> Self {
        Self::new(new_rate_limit_store(), config)
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Count a request against `key` and decide
    pub fn check(&self, key: &str) -> Result<RateLimitDecision> {
        self.check_at(key, Utc::now())
    }

    /// Like `check`, but limited callers come back as an error
    pub fn enforce(&self, key: &str) -> Result<()> {
        match self.check(key)? {
            RateLimitDecision::Allowed { .. } => Ok(()),
            RateLimitDecision::Limited { retry_after_secs } => {
                Err(AppError::RateLimited { retry_after_secs })
            }
        }
    }

    fn check_at(&self, key: &str, now: DateTime<Utc>) -> Result<RateLimitDecision> {
        let mut windows = self
            .store
            .lock()
            .map_err(|_| AppError::Internal("Rate limit store lock poisoned".to_string()))?;

        let window = windows.entry(key.to_string()).or_insert_with(|| RateWindow {
            count: 0,
            window_reset_at: now + Duration::seconds(self.config.window_secs),
        });

        if now >= window.window_reset_at {
            window.count = 0;
            window.window_reset_at = now + Duration::seconds(self.config.window_secs);
        }

        if window.count >= self.config.max_requests {
            let retry_after_secs = (window.window_reset_at - now).num_seconds().max(1);
            debug!("Rate limited {} for {}s", key, retry_after_secs);
            return Ok(RateLimitDecision::Limited { retry_after_secs });
        }

        window.count += 1;
        Ok(RateLimitDecision::Allowed {
            remaining: self.config.max_requests - window.count,
        })
    }
}
