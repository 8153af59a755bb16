//! Connection pool and request pacing for the Vultr API

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub struct ConnectionPoolConfig {
    pub max_idle_connections: usize,
    pub idle_timeout: Duration,
    pub connection_timeout: Duration,
    pub request_timeout: Duration,
    pub tcp_keepalive: Option<Duration>,
}

impl Default for ConnectionPoolConfig {
    fn default() -> Self {
        Self {
            max_idle_connections: 10,
            idle_timeout: Duration::from_secs(90),
            connection_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            tcp_keepalive: Some(Duration::from_secs(30)),
        }
    }
}

pub fn build_http_client(config: &ConnectionPoolConfig) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .connect_timeout(config.connection_timeout)
        .pool_idle_timeout(config.idle_timeout)
        .pool_max_idle_per_host(config.max_idle_connections)
        .user_agent(concat!("terraform-provider-vultr/", env!("CARGO_PKG_VERSION")));

    if let Some(keepalive) = config.tcp_keepalive {
        builder = builder.tcp_keepalive(keepalive);
    }

    builder.build()
}

/// Spaces requests at least `interval` apart. The API rejects bursts with 503.
pub struct RateLimiter {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Waits for the next free slot. Returns true if the caller had to wait.
    pub async fn acquire(&self) -> bool {
        if self.interval.is_zero() {
            return false;
        }

        let mut next_slot = self.next_slot.lock().await;
        let now = Instant::now();
        let waited = match *next_slot {
            Some(slot) if slot > now => {
                tokio::time::sleep_until(slot).await;
                true
            }
            _ => false,
        };
        *next_slot = Some(Instant::now() + self.interval);
        waited
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn rate_limiter_spaces_requests() {
        let limiter = RateLimiter::new(Duration::from_millis(500));
        let start = Instant::now();

        assert!(!limiter.acquire().await);
        assert!(limiter.acquire().await);
        assert!(limiter.acquire().await);

        assert!(start.elapsed() >= Duration::from_millis(1000));
        assert!(start.elapsed() < Duration::from_millis(1100));
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limiter_does_not_wait_after_idle_period() {
        let limiter = RateLimiter::new(Duration::from_millis(500));

        limiter.acquire().await;
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(!limiter.acquire().await);
    }

    #[tokio::test]
    async fn zero_interval_disables_pacing() {
        let limiter = RateLimiter::new(Duration::ZERO);

        assert!(!limiter.acquire().await);
        assert!(!limiter.acquire().await);
    }

    #[test]
    fn http_client_builds_from_default_config() {
        assert!(build_http_client(&ConnectionPoolConfig::default()).is_ok());
    }
}
