//! Additional IPv4 address on an instance
//!
//! The API does not say which address it allocated, so create diffs the
//! instance's address list before and after. Concurrent creates on the same
//! instance would see each other's addresses; the sequence runs under the
//! provider's per-instance lock. Ids are `<instance-id>/<ip-address>`.

use crate::api::server::Ipv4;
use crate::api::Client;
use crate::provider_data::VultrProviderData;
use async_trait::async_trait;
use std::sync::OnceLock;
use tfplug::validator::parse_string_string_id;
use tfplug::{
    AttributeBuilder, AttributeType, Context, Dynamic, Resource, ResourceData, Result, Schema,
    SchemaBuilder, TfplugError,
};
use tracing::{debug, info, warn};

pub struct Ipv4Resource {
    provider_data: VultrProviderData,
}

impl Ipv4Resource {
    pub fn new(provider_data: VultrProviderData) -> Self {
        Self { provider_data }
    }

    pub fn schema_static() -> Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                SchemaBuilder::new()
                    .version(0)
                    .description("Manages an additional IPv4 address of a Vultr instance")
                    .attribute(
                        AttributeBuilder::new("gateway", AttributeType::String)
                            .computed()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("instance_id", AttributeType::String)
                            .required()
                            .force_new()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("ipv4_address", AttributeType::String)
                            .computed()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("netmask", AttributeType::String)
                            .computed()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("reboot", AttributeType::Bool)
                            .description("Reboot the instance so it picks up the address")
                            .optional()
                            .default(true)
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("reverse_dns", AttributeType::String)
                            .computed()
                            .build(),
                    )
                    .build()
            })
            .clone()
    }

    fn client(&self) -> &Client {
        &self.provider_data.client
    }

    /// Lists, allocates and re-lists while holding the instance's lock.
    async fn allocate(&self, instance: &str, reboot: bool) -> Result<Option<Ipv4>> {
        let _guard = self.provider_data.locks.lock(instance).await;
        debug!("Holding IPv4 lock for instance ({})", instance);

        let servers = self.client().servers();
        let before = servers.list_ipv4(instance).await.map_err(|e| {
            TfplugError::Custom(format!("Error listing IPv4 addresses: {}", e))
        })?;
        servers.create_ipv4(instance, reboot).await.map_err(|e| {
            TfplugError::Custom(format!("Error creating IPv4 address: {}", e))
        })?;
        let after = servers.list_ipv4(instance).await.map_err(|e| {
            TfplugError::Custom(format!("Error re-listing IPv4 addresses: {}", e))
        })?;

        Ok(after.into_iter().find(|ip| !before.contains(ip)))
    }
}

fn parse_ipv4_id(id: &str) -> Result<(String, String)> {
    parse_string_string_id(id).map_err(|_| {
        TfplugError::InvalidState(
            "Error parsing IPv4 ID: ID should be of form <instance-id>/<ip-address>".to_string(),
        )
    })
}

#[async_trait]
impl Resource for Ipv4Resource {
    fn type_name(&self) -> &str {
        "vultr_ipv4"
    }

    fn schema(&self) -> Schema {
        Self::schema_static()
    }

    async fn create(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let instance = data.get_string("instance_id")?;
        let reboot = data
            .get("reboot")
            .and_then(Dynamic::as_bool)
            .unwrap_or(true);

        info!("Creating new IPv4 address");
        let ip = self
            .allocate(&instance, reboot)
            .await?
            .ok_or_else(|| TfplugError::Custom("Error finding created IPv4 address".to_string()))?;
        data.set_id(format!("{}/{}", instance, ip.ip));

        self.read(ctx, data).await
    }

    async fn read(&self, _ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        let (instance, address) = parse_ipv4_id(&id)?;

        let addresses = match self.client().servers().list_ipv4(&instance).await {
            Ok(addresses) => addresses,
            Err(e) if e.message_starts_with("Invalid server.") => {
                warn!(
                    "Removing IPv4 address ({}) because the attached instance ({}) is gone",
                    id, instance
                );
                data.set_id("");
                return Ok(());
            }
            Err(e) => {
                return Err(TfplugError::Custom(format!(
                    "Error getting IPv4 addresses: {}",
                    e
                )))
            }
        };

        let Some(ip) = addresses.into_iter().find(|ip| ip.ip == address) else {
            warn!("Removing IPv4 address ({}) because it is gone", id);
            data.set_id("");
            return Ok(());
        };

        data.set("gateway", ip.gateway);
        data.set("instance_id", instance);
        data.set("ipv4_address", ip.ip);
        data.set("netmask", ip.netmask);
        data.set("reverse_dns", ip.reverse_dns);

        Ok(())
    }

    /// Only `reboot` can change and it matters at create time only.
    async fn update(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        self.read(ctx, data).await
    }

    async fn delete(&self, _ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        let (instance, address) = parse_ipv4_id(&id)?;
        info!("Destroying IPv4 address ({})", id);

        self.client()
            .servers()
            .destroy_ipv4(&instance, &address)
            .await
            .map_err(|e| {
                TfplugError::Custom(format!("Error destroying IPv4 address ({}): {}", id, e))
            })?;

        data.set_id("");
        Ok(())
    }
}
