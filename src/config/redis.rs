//! Connection settings for the Redis-backed identity store.
//!
//! The bot keeps all of its durable mappings in one Redis database, so the
//! only knobs are where it lives and how long startup may wait for it.

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Where the identity store lives (`ATTENDANCE_BOT__REDIS__*`).
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// `redis://` or `rediss://` URL, optionally with credentials and a
    /// database index (`redis://host:6379/2`).
    pub url: String,

    /// Upper bound on connecting and the initial `PING`, in seconds.
    #[serde(default = "default_connect_timeout")]
    pub timeout_secs: u64,
}

impl RedisConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Rejects settings the store could never open with.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.trim().is_empty() {
            return Err(ValidationError::MissingRequired("REDIS_URL"));
        }
        let scheme_ok = ["redis://", "rediss://"]
            .iter()
            .any(|scheme| self.url.starts_with(scheme));
        if !scheme_ok {
            return Err(ValidationError::InvalidRedisUrl);
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("redis.timeout_secs"));
        }
        Ok(())
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_secs: default_connect_timeout(),
        }
    }
}

fn default_connect_timeout() -> u64 {
    5
}
