//! Failed-login throttling keyed by client address.
//!
//! Failures are counted in a fixed window. Once the count reaches the limit the
//! key stays locked until the window expires. The Redis backend uses
//! `INCR` + `EXPIRE` and falls back to the in-memory map when Redis is unreachable.

use crate::config::AppConfig;
use dashmap::DashMap;
use metrics::counter;
use redis::AsyncCommands;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Clone)]
struct FailureEntry {
    count: u32,
    window_start: Instant,
}

impl FailureEntry {
    fn new(now: Instant) -> Self {
        Self {
            count: 0,
            window_start: now,
        }
    }

    fn expired(&self, now: Instant, window: Duration) -> bool {
        now.duration_since(self.window_start) >= window
    }

    fn time_until_reset(&self, now: Instant, window: Duration) -> Duration {
        window.saturating_sub(now.duration_since(self.window_start))
    }
}

#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    pub max_attempts: u32,
    pub window: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::from_secs(900),
        }
    }
}

impl From<&AppConfig> for ThrottleConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_attempts: config.login_max_attempts,
            window: Duration::from_secs(config.login_lockout_secs),
        }
    }
}

#[derive(Clone)]
pub enum ThrottleBackend {
    InMemory,
    Redis {
        client: Arc<redis::Client>,
        namespace: String,
    },
}

#[derive(Clone)]
enum ThrottleStore {
    InMemory {
        entries: Arc<DashMap<String, FailureEntry>>,
    },
    Redis {
        client: Arc<redis::Client>,
        namespace: String,
        fallback: Arc<DashMap<String, FailureEntry>>,
    },
}

/// Outcome of a throttle check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleStatus {
    Allowed { remaining: u32 },
    Locked { retry_after: Duration },
}

impl ThrottleStatus {
    pub fn is_locked(&self) -> bool {
        matches!(self, ThrottleStatus::Locked { .. })
    }
}

#[derive(Clone)]
pub struct LoginThrottle {
    store: ThrottleStore,
    config: ThrottleConfig,
}

impl LoginThrottle {
    pub fn new(config: ThrottleConfig, backend: ThrottleBackend) -> Self {
        let store = match backend {
            ThrottleBackend::InMemory => ThrottleStore::InMemory {
                entries: Arc::new(DashMap::new()),
            },
            ThrottleBackend::Redis { client, namespace } => ThrottleStore::Redis {
                client,
                namespace,
                fallback: Arc::new(DashMap::new()),
            },
        };
        Self { store, config }
    }

    pub fn in_memory(config: ThrottleConfig) -> Self {
        Self::new(config, ThrottleBackend::InMemory)
    }

    /// Builds the throttle selected by `login_throttle_backend`.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, RateLimitError> {
        let throttle_config = ThrottleConfig::from(config);
        match config.login_throttle_backend.to_ascii_lowercase().as_str() {
            "in-memory" => Ok(Self::in_memory(throttle_config)),
            "redis" => {
                let client = redis::Client::open(config.redis_url.as_str())
                    .map_err(|e| RateLimitError::InvalidConfig(e.to_string()))?;
                Ok(Self::new(
                    throttle_config,
                    ThrottleBackend::Redis {
                        client: Arc::new(client),
                        namespace: "hostel:login".to_string(),
                    },
                ))
            }
            other => Err(RateLimitError::InvalidConfig(format!(
                "unknown login throttle backend '{}'",
                other
            ))),
        }
    }

    pub async fn check(&self, key: &str) -> ThrottleStatus {
        match &self.store {
            ThrottleStore::InMemory { entries } => Self::check_in_memory(entries, key, &self.config),
            ThrottleStore::Redis {
                client,
                namespace,
                fallback,
            } => match client.get_async_connection().await {
                Ok(mut conn) => {
                    match Self::check_with_redis(&mut conn, namespace, key, &self.config).await {
                        Ok(status) => status,
                        Err(err) => {
                            warn!("Redis login throttle error: {}", err);
                            Self::check_in_memory(fallback, key, &self.config)
                        }
                    }
                }
                Err(err) => {
                    warn!("Failed to connect to Redis for login throttle, using fallback: {}", err);
                    Self::check_in_memory(fallback, key, &self.config)
                }
            },
        }
    }

    pub async fn record_failure(&self, key: &str) {
        counter!("hostel_admin.login_failures", 1);
        match &self.store {
            ThrottleStore::InMemory { entries } => Self::fail_in_memory(entries, key, &self.config),
            ThrottleStore::Redis {
                client,
                namespace,
                fallback,
            } => {
                let result = match client.get_async_connection().await {
                    Ok(mut conn) => {
                        Self::fail_with_redis(&mut conn, namespace, key, &self.config).await
                    }
                    Err(err) => Err(err),
                };
                if let Err(err) = result {
                    warn!("Redis login throttle error, counting locally: {}", err);
                    Self::fail_in_memory(fallback, key, &self.config);
                }
            }
        }
    }

    pub async fn reset(&self, key: &str) {
        match &self.store {
            ThrottleStore::InMemory { entries } => {
                entries.remove(key);
            }
            ThrottleStore::Redis {
                client,
                namespace,
                fallback,
            } => {
                let redis_key = format!("{}:{}", namespace, key);
                let result: redis::RedisResult<()> = match client.get_async_connection().await {
                    Ok(mut conn) => conn.del(&redis_key).await,
                    Err(err) => Err(err),
                };
                if let Err(err) = result {
                    warn!("Failed to reset Redis login throttle for {}: {}", key, err);
                }
                fallback.remove(key);
            }
        }
    }

    /// Drops expired in-memory windows.
    pub fn cleanup_expired(&self) {
        let now = Instant::now();
        let window = self.config.window;
        let entries = match &self.store {
            ThrottleStore::InMemory { entries } => entries,
            ThrottleStore::Redis { fallback, .. } => fallback,
        };
        entries.retain(|_, entry| !entry.expired(now, window));
    }

    fn check_in_memory(
        entries: &DashMap<String, FailureEntry>,
        key: &str,
        config: &ThrottleConfig,
    ) -> ThrottleStatus {
        let now = Instant::now();
        match entries.get(key) {
            Some(entry) if !entry.expired(now, config.window) => {
                if entry.count >= config.max_attempts {
                    ThrottleStatus::Locked {
                        retry_after: entry.time_until_reset(now, config.window),
                    }
                } else {
                    ThrottleStatus::Allowed {
                        remaining: config.max_attempts - entry.count,
                    }
                }
            }
            _ => ThrottleStatus::Allowed {
                remaining: config.max_attempts,
            },
        }
    }

    fn fail_in_memory(entries: &DashMap<String, FailureEntry>, key: &str, config: &ThrottleConfig) {
        let now = Instant::now();
        let mut entry = entries
            .entry(key.to_string())
            .or_insert_with(|| FailureEntry::new(now));
        if entry.expired(now, config.window) {
            *entry = FailureEntry::new(now);
        }
        entry.count += 1;
        debug!(key, count = entry.count, "Recorded failed login");
    }

    async fn check_with_redis<C>(
        conn: &mut C,
        namespace: &str,
        key: &str,
        config: &ThrottleConfig,
    ) -> Result<ThrottleStatus, redis::RedisError>
    where
        C: redis::aio::ConnectionLike + Send,
    {
        let redis_key = format!("{}:{}", namespace, key);
        let count: Option<u32> = conn.get(&redis_key).await?;
        let count = count.unwrap_or(0);
        if count < config.max_attempts {
            return Ok(ThrottleStatus::Allowed {
                remaining: config.max_attempts - count,
            });
        }
        let ttl: i64 = conn.ttl(&redis_key).await?;
        let retry_after = if ttl > 0 {
            Duration::from_secs(ttl as u64)
        } else {
            config.window
        };
        Ok(ThrottleStatus::Locked { retry_after })
    }

    async fn fail_with_redis<C>(
        conn: &mut C,
        namespace: &str,
        key: &str,
        config: &ThrottleConfig,
    ) -> Result<(), redis::RedisError>
    where
        C: redis::aio::ConnectionLike + Send,
    {
        let redis_key = format!("{}:{}", namespace, key);
        let window_secs = config.window.as_secs().max(1);
        let count: i64 = conn.incr(&redis_key, 1).await?;
        if count == 1 {
            let _: () = conn.expire(&redis_key, window_secs as usize).await?;
        } else {
            let ttl: i64 = conn.ttl(&redis_key).await.unwrap_or(-1);
            if ttl < 0 {
                let _: () = conn.expire(&redis_key, window_secs as usize).await?;
            }
        }
        Ok(())
    }
}

/// Periodically drops expired windows.
pub async fn start_cleanup_task(throttle: LoginThrottle, interval: Duration) {
    let mut timer = tokio::time::interval(interval);
    loop {
        timer.tick().await;
        throttle.cleanup_expired();
        debug!("Login throttle cleanup completed");
    }
}

pub fn login_key_for_ip(ip: &str) -> String {
    format!("ip:{}", ip)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn throttle(max_attempts: u32, window: Duration) -> LoginThrottle {
        LoginThrottle::in_memory(ThrottleConfig {
            max_attempts,
            window,
        })
    }

    #[tokio::test]
    async fn locks_after_max_failures() {
        let limiter = throttle(3, Duration::from_secs(60));
        let key = login_key_for_ip("10.0.0.1");

        for _ in 0..2 {
            limiter.record_failure(&key).await;
            assert!(!limiter.check(&key).await.is_locked());
        }
        limiter.record_failure(&key).await;
        assert!(limiter.check(&key).await.is_locked());

        // other clients are unaffected
        assert_eq!(
            limiter.check(&login_key_for_ip("10.0.0.2")).await,
            ThrottleStatus::Allowed { remaining: 3 }
        );
    }

    #[tokio::test]
    async fn reset_clears_failures() {
        let limiter = throttle(1, Duration::from_secs(60));
        let key = login_key_for_ip("10.0.0.3");
        limiter.record_failure(&key).await;
        assert!(limiter.check(&key).await.is_locked());

        limiter.reset(&key).await;
        assert!(!limiter.check(&key).await.is_locked());
    }

    #[tokio::test]
    async fn lock_expires_with_window() {
        let limiter = throttle(1, Duration::from_millis(50));
        let key = login_key_for_ip("10.0.0.4");
        limiter.record_failure(&key).await;
        assert!(limiter.check(&key).await.is_locked());

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(!limiter.check(&key).await.is_locked());
        limiter.cleanup_expired();
    }

    #[tokio::test]
    async fn reset_clears_local_count_when_redis_is_down() {
        let client = redis::Client::open("redis://127.0.0.1:1/").unwrap();
        let limiter = LoginThrottle::new(
            ThrottleConfig {
                max_attempts: 1,
                window: Duration::from_secs(60),
            },
            ThrottleBackend::Redis {
                client: Arc::new(client),
                namespace: "hostel:login:test".into(),
            },
        );
        let key = login_key_for_ip("10.0.0.5");

        limiter.record_failure(&key).await;
        assert!(limiter.check(&key).await.is_locked());

        limiter.reset(&key).await;
        assert!(!limiter.check(&key).await.is_locked());
    }

    #[test]
    fn rejects_unknown_backend() {
        let mut config = crate::test_support::test_config();
        config.login_throttle_backend = "memcached".into();
        assert!(LoginThrottle::from_app_config(&config).is_err());
    }
}
