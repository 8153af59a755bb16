//! Reserved IP resource
//!
//! A reserved IP can be moved between instances in place; the attach and
//! detach calls address it by its CIDR.

use super::string_change;
use crate::api::Client;
use crate::provider_data::VultrProviderData;
use async_trait::async_trait;
use std::sync::OnceLock;
use tfplug::validator::StringOneOf;
use tfplug::{
    AttributeBuilder, AttributeType, Context, Resource, ResourceData, Result, Schema,
    SchemaBuilder, TfplugError,
};
use tracing::{info, warn};

pub struct ReservedIpResource {
    provider_data: VultrProviderData,
}

impl ReservedIpResource {
    pub fn new(provider_data: VultrProviderData) -> Self {
        Self { provider_data }
    }

    pub fn schema_static() -> Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                SchemaBuilder::new()
                    .version(0)
                    .description("Manages a Vultr reserved IP")
                    .attribute(
                        AttributeBuilder::new("attached_id", AttributeType::String)
                            .description("Instance the IP is attached to")
                            .optional()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("cidr", AttributeType::String)
                            .computed()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("name", AttributeType::String)
                            .optional()
                            .force_new()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("region_id", AttributeType::Number)
                            .required()
                            .force_new()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("type", AttributeType::String)
                            .optional()
                            .force_new()
                            .default("v4")
                            .validator(StringOneOf::new(&["v4", "v6"]))
                            .build(),
                    )
                    .build()
            })
            .clone()
    }

    fn client(&self) -> &Client {
        &self.provider_data.client
    }

    async fn attach(&self, id: &str, cidr: &str, instance: &str) -> Result<()> {
        info!("Attaching reserved IP ({}) to instance ({})", id, instance);
        self.client()
            .reserved_ips()
            .attach(cidr, instance)
            .await
            .map_err(|e| {
                TfplugError::Custom(format!(
                    "Error attaching reserved IP ({}) to instance ({}): {}",
                    id, instance, e
                ))
            })
    }

    async fn detach(&self, id: &str, cidr: &str, instance: &str) -> Result<()> {
        info!("Detaching reserved IP ({}) from instance ({})", id, instance);
        self.client()
            .reserved_ips()
            .detach(instance, cidr)
            .await
            .map_err(|e| {
                TfplugError::Custom(format!(
                    "Error detaching reserved IP ({}) from instance ({}): {}",
                    id, instance, e
                ))
            })
    }

    /// Current CIDR of the reserved IP, from state or the API.
    async fn cidr(&self, data: &ResourceData) -> Result<String> {
        let cidr = data.get_string("cidr")?;
        if !cidr.is_empty() {
            return Ok(cidr);
        }
        let id = data.id();
        let ip = self
            .client()
            .reserved_ips()
            .get(id)
            .await
            .map_err(|e| {
                TfplugError::Custom(format!("Error getting reserved IP ({}): {}", id, e))
            })?
            .ok_or_else(|| TfplugError::Custom(format!("Reserved IP ({}) not found", id)))?;
        Ok(ip.cidr())
    }
}

#[async_trait]
impl Resource for ReservedIpResource {
    fn type_name(&self) -> &str {
        "vultr_reserved_ip"
    }

    fn schema(&self) -> Schema {
        Self::schema_static()
    }

    async fn create(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let region_id = data.get_int("region_id")?;
        let ip_type = data
            .get("type")
            .and_then(|v| v.as_string().map(str::to_string))
            .unwrap_or_else(|| "v4".to_string());
        let name = data.get_string("name")?;
        let attached_id = data.get_string("attached_id")?;

        info!("Creating new reserved IP");
        let id = self
            .client()
            .reserved_ips()
            .create(region_id, &ip_type, &name)
            .await
            .map_err(|e| TfplugError::Custom(format!("Error creating reserved IP: {}", e)))?;
        data.set_id(id.clone());

        if !attached_id.is_empty() {
            let cidr = self.cidr(data).await?;
            self.attach(&id, &cidr, &attached_id).await?;
        }

        self.read(ctx, data).await
    }

    async fn read(&self, _ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();

        let ip = self.client().reserved_ips().get(&id).await.map_err(|e| {
            TfplugError::Custom(format!("Error getting reserved IP ({}): {}", id, e))
        })?;
        let Some(ip) = ip else {
            warn!("Removing reserved IP ({}) because it is gone", id);
            data.set_id("");
            return Ok(());
        };

        data.set("cidr", ip.cidr());
        data.set("attached_id", ip.attached_to);
        data.set("name", ip.label);
        data.set("region_id", ip.region_id);
        data.set("type", ip.ip_type);

        Ok(())
    }

    async fn update(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();

        if data.has_change("attached_id") {
            let (old, new) = string_change(data, "attached_id");
            let cidr = self.cidr(data).await?;
            if !old.is_empty() {
                self.detach(&id, &cidr, &old).await?;
            }
            if !new.is_empty() {
                self.attach(&id, &cidr, &new).await?;
            }
        }

        self.read(ctx, data).await
    }

    async fn delete(&self, _ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        let attached_id = data.get_string("attached_id")?;

        if !attached_id.is_empty() {
            let cidr = self.cidr(data).await?;
            self.detach(&id, &cidr, &attached_id).await?;
        }

        info!("Destroying reserved IP ({})", id);
        self.client()
            .reserved_ips()
            .destroy(&id)
            .await
            .map_err(|e| {
                TfplugError::Custom(format!("Error destroying reserved IP ({}): {}", id, e))
            })?;

        data.set_id("");
        Ok(())
    }
}
