//! Vultr v1 API client
//!
//! GET requests carry query parameters, POST requests form-encoded bodies,
//! and every request is authenticated with the `API-Key` header. Endpoint
//! groups hang off [`Client`] as borrowed views (`client.servers()`, ...).

pub mod block;
pub mod catalog;
pub mod client;
pub mod common;
pub mod dns;
pub mod error;
pub mod firewall;
pub mod network;
pub mod pool;
pub mod reserved_ip;
pub mod server;
pub mod ssh_key;
pub mod startup_script;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use client::{Client, ClientConfig, RetryConfig, DEFAULT_ENDPOINT, DEFAULT_RATE_LIMIT};
pub use error::ApiError;

impl Client {
    pub fn servers(&self) -> server::ServerApi<'_> {
        server::ServerApi::new(self)
    }

    pub fn block_storage(&self) -> block::BlockStorageApi<'_> {
        block::BlockStorageApi::new(self)
    }

    pub fn dns(&self) -> dns::DnsApi<'_> {
        dns::DnsApi::new(self)
    }

    pub fn firewall(&self) -> firewall::FirewallApi<'_> {
        firewall::FirewallApi::new(self)
    }

    pub fn networks(&self) -> network::NetworkApi<'_> {
        network::NetworkApi::new(self)
    }

    pub fn reserved_ips(&self) -> reserved_ip::ReservedIpApi<'_> {
        reserved_ip::ReservedIpApi::new(self)
    }

    pub fn startup_scripts(&self) -> startup_script::StartupScriptApi<'_> {
        startup_script::StartupScriptApi::new(self)
    }

    pub fn ssh_keys(&self) -> ssh_key::SshKeyApi<'_> {
        ssh_key::SshKeyApi::new(self)
    }

    pub fn catalog(&self) -> catalog::CatalogApi<'_> {
        catalog::CatalogApi::new(self)
    }
}
