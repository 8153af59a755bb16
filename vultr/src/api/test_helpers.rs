//! Test helpers for the Vultr API

use super::{Client, ClientConfig, RetryConfig};
use std::time::Duration;

/// Client pointed at a mock server, without pacing and with fast retries.
#[allow(clippy::disallowed_methods)]
pub fn test_client(url: &str) -> Client {
    Client::with_config(
        ClientConfig::new("test-api-key")
            .endpoint(url)
            .rate_limit(Duration::ZERO)
            .retry(RetryConfig {
                max_retries: 1,
                initial_backoff_ms: 1,
                max_backoff_ms: 2,
                timeout_seconds: 5,
            }),
    )
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn retry_config_defaults() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.initial_backoff_ms, 100);
        assert_eq!(config.max_backoff_ms, 10000);
        assert_eq!(config.timeout_seconds, 30);
    }

    #[test]
    fn client_config_defaults() {
        let config = ClientConfig::new("key");
        assert_eq!(config.endpoint, "https://api.vultr.com");
        assert_eq!(config.rate_limit, std::time::Duration::from_millis(500));
    }
}
