pub mod api;
pub mod data_sources;
pub mod filter;
pub mod provider_data;
pub mod resources;
pub mod wait;

use async_trait::async_trait;
use provider_data::VultrProviderData;
use std::collections::HashMap;
use std::time::Duration;
use tfplug::{
    AttributeBuilder, AttributeType, Context, DataSource, Diagnostics, Dynamic, Provider,
    Resource, Schema, SchemaBuilder, TfplugError,
};

pub struct VultrProvider {
    provider_data: Option<VultrProviderData>,
}

impl Default for VultrProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl VultrProvider {
    pub fn new() -> Self {
        Self {
            provider_data: None,
        }
    }

    fn provider_data(&self) -> tfplug::Result<VultrProviderData> {
        self.provider_data
            .clone()
            .ok_or(TfplugError::ProviderNotConfigured)
    }
}

/// Provider block value, falling back to an environment variable.
fn config_string(config: &HashMap<String, Dynamic>, key: &str, env: &str) -> Option<String> {
    config
        .get(key)
        .and_then(|v| v.as_string())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .or_else(|| std::env::var(env).ok().filter(|s| !s.is_empty()))
}

#[async_trait]
impl Provider for VultrProvider {
    fn type_name(&self) -> &str {
        "vultr"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Vultr cloud provider")
            .attribute(
                AttributeBuilder::new("api_key", AttributeType::String)
                    .description("API key; defaults to VULTR_API_KEY")
                    .optional()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("endpoint", AttributeType::String)
                    .description("API base URL; defaults to VULTR_ENDPOINT or https://api.vultr.com")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("rate_limit_ms", AttributeType::Number)
                    .description("Minimum milliseconds between API requests; defaults to VULTR_RATE_LIMIT_MS or 500")
                    .optional()
                    .build(),
            )
            .build()
    }

    async fn configure(
        &mut self,
        _ctx: &Context,
        config: HashMap<String, Dynamic>,
    ) -> Diagnostics {
        let mut diags = Diagnostics::new();

        let Some(api_key) = config_string(&config, "api_key", "VULTR_API_KEY") else {
            diags.add_error(
                "api_key is required (set in provider config or VULTR_API_KEY env var)",
                None::<String>,
            );
            return diags;
        };

        let endpoint = config_string(&config, "endpoint", "VULTR_ENDPOINT")
            .unwrap_or_else(|| api::DEFAULT_ENDPOINT.to_string());

        let rate_limit_ms = match config.get("rate_limit_ms").and_then(Dynamic::as_int) {
            Some(ms) => Some(ms),
            None => match std::env::var("VULTR_RATE_LIMIT_MS") {
                Ok(raw) => match raw.parse::<i64>() {
                    Ok(ms) => Some(ms),
                    Err(_) => {
                        diags.add_error(
                            format!("VULTR_RATE_LIMIT_MS must be an integer, got {:?}", raw),
                            None::<String>,
                        );
                        return diags;
                    }
                },
                Err(_) => None,
            },
        };
        let rate_limit = match rate_limit_ms {
            Some(ms) if ms < 0 => {
                diags.add_error(
                    format!("rate_limit_ms must not be negative, got {}", ms),
                    None::<String>,
                );
                return diags;
            }
            Some(ms) => Duration::from_millis(ms.unsigned_abs()),
            None => api::DEFAULT_RATE_LIMIT,
        };

        let client_config = api::ClientConfig::new(api_key)
            .endpoint(endpoint)
            .rate_limit(rate_limit);
        match api::Client::with_config(client_config) {
            Ok(client) => {
                self.provider_data = Some(VultrProviderData::new(client));
            }
            Err(e) => {
                diags.add_error(format!("Failed to create API client: {}", e), None::<String>);
            }
        }

        diags
    }

    async fn create_resource(&self, name: &str) -> tfplug::Result<Box<dyn Resource>> {
        let data = self.provider_data()?;

        match name {
            "vultr_block_storage" => Ok(Box::new(resources::BlockStorageResource::new(data))),
            "vultr_dns_domain" => Ok(Box::new(resources::DnsDomainResource::new(data))),
            "vultr_dns_record" => Ok(Box::new(resources::DnsRecordResource::new(data))),
            "vultr_firewall_group" => Ok(Box::new(resources::FirewallGroupResource::new(data))),
            "vultr_firewall_rule" => Ok(Box::new(resources::FirewallRuleResource::new(data))),
            "vultr_instance" => Ok(Box::new(resources::InstanceResource::new(data))),
            "vultr_ipv4" => Ok(Box::new(resources::Ipv4Resource::new(data))),
            "vultr_network" => Ok(Box::new(resources::NetworkResource::new(data))),
            "vultr_reserved_ip" => Ok(Box::new(resources::ReservedIpResource::new(data))),
            "vultr_ssh_key" => Ok(Box::new(resources::SshKeyResource::new(data))),
            "vultr_startup_script" => Ok(Box::new(resources::StartupScriptResource::new(data))),
            _ => Err(TfplugError::ResourceNotFound(name.to_string())),
        }
    }

    async fn create_data_source(&self, name: &str) -> tfplug::Result<Box<dyn DataSource>> {
        let data = self.provider_data()?;

        match name {
            "vultr_application" => Ok(Box::new(data_sources::ApplicationDataSource::new(data))),
            "vultr_firewall_group" => {
                Ok(Box::new(data_sources::FirewallGroupDataSource::new(data)))
            }
            "vultr_network" => Ok(Box::new(data_sources::NetworkDataSource::new(data))),
            "vultr_os" => Ok(Box::new(data_sources::OsDataSource::new(data))),
            "vultr_plan" => Ok(Box::new(data_sources::PlanDataSource::new(data))),
            "vultr_region" => Ok(Box::new(data_sources::RegionDataSource::new(data))),
            "vultr_snapshot" => Ok(Box::new(data_sources::SnapshotDataSource::new(data))),
            "vultr_ssh_key" => Ok(Box::new(data_sources::SshKeyDataSource::new(data))),
            "vultr_startup_script" => {
                Ok(Box::new(data_sources::StartupScriptDataSource::new(data)))
            }
            _ => Err(TfplugError::DataSourceNotFound(name.to_string())),
        }
    }

    fn resource_schemas(&self) -> HashMap<String, Schema> {
        static SCHEMAS: std::sync::OnceLock<HashMap<String, Schema>> = std::sync::OnceLock::new();

        SCHEMAS
            .get_or_init(|| {
                HashMap::from([
                    (
                        "vultr_block_storage".to_string(),
                        resources::BlockStorageResource::schema_static(),
                    ),
                    (
                        "vultr_dns_domain".to_string(),
                        resources::DnsDomainResource::schema_static(),
                    ),
                    (
                        "vultr_dns_record".to_string(),
                        resources::DnsRecordResource::schema_static(),
                    ),
                    (
                        "vultr_firewall_group".to_string(),
                        resources::FirewallGroupResource::schema_static(),
                    ),
                    (
                        "vultr_firewall_rule".to_string(),
                        resources::FirewallRuleResource::schema_static(),
                    ),
                    (
                        "vultr_instance".to_string(),
                        resources::InstanceResource::schema_static(),
                    ),
                    (
                        "vultr_ipv4".to_string(),
                        resources::Ipv4Resource::schema_static(),
                    ),
                    (
                        "vultr_network".to_string(),
                        resources::NetworkResource::schema_static(),
                    ),
                    (
                        "vultr_reserved_ip".to_string(),
                        resources::ReservedIpResource::schema_static(),
                    ),
                    (
                        "vultr_ssh_key".to_string(),
                        resources::SshKeyResource::schema_static(),
                    ),
                    (
                        "vultr_startup_script".to_string(),
                        resources::StartupScriptResource::schema_static(),
                    ),
                ])
            })
            .clone()
    }

    fn data_source_schemas(&self) -> HashMap<String, Schema> {
        static SCHEMAS: std::sync::OnceLock<HashMap<String, Schema>> = std::sync::OnceLock::new();

        SCHEMAS
            .get_or_init(|| {
                HashMap::from([
                    (
                        "vultr_application".to_string(),
                        data_sources::ApplicationDataSource::schema_static(),
                    ),
                    (
                        "vultr_firewall_group".to_string(),
                        data_sources::FirewallGroupDataSource::schema_static(),
                    ),
                    (
                        "vultr_network".to_string(),
                        data_sources::NetworkDataSource::schema_static(),
                    ),
                    (
                        "vultr_os".to_string(),
                        data_sources::OsDataSource::schema_static(),
                    ),
                    (
                        "vultr_plan".to_string(),
                        data_sources::PlanDataSource::schema_static(),
                    ),
                    (
                        "vultr_region".to_string(),
                        data_sources::RegionDataSource::schema_static(),
                    ),
                    (
                        "vultr_snapshot".to_string(),
                        data_sources::SnapshotDataSource::schema_static(),
                    ),
                    (
                        "vultr_ssh_key".to_string(),
                        data_sources::SshKeyDataSource::schema_static(),
                    ),
                    (
                        "vultr_startup_script".to_string(),
                        data_sources::StartupScriptDataSource::schema_static(),
                    ),
                ])
            })
            .clone()
    }
}
