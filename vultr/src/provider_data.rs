//! Provider data structure passed to resources and data sources

use crate::api::Client;
use crate::wait::WaitSettings;
use std::sync::Arc;
use tfplug::KeyedMutex;

#[derive(Clone)]
pub struct VultrProviderData {
    pub client: Arc<Client>,
    /// Per-key locks shared by every resource of this provider instance.
    pub locks: Arc<KeyedMutex>,
    pub wait: WaitSettings,
}

impl VultrProviderData {
    pub fn new(client: Client) -> Self {
        Self {
            client: Arc::new(client),
            locks: Arc::new(KeyedMutex::new()),
            wait: WaitSettings::default(),
        }
    }

    pub fn with_wait_settings(mut self, wait: WaitSettings) -> Self {
        self.wait = wait;
        self
    }
}

#[cfg(test)]
impl VultrProviderData {
    /// Provider data against a mock server with near-instant waits.
    pub(crate) fn for_tests(url: &str) -> Self {
        Self::new(crate::api::test_helpers::test_client(url)).with_wait_settings(WaitSettings {
            delay: std::time::Duration::ZERO,
            min_poll_interval: std::time::Duration::from_millis(10),
        })
    }
}
