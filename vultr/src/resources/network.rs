//! Private network resource

use crate::api::Client;
use crate::provider_data::VultrProviderData;
use async_trait::async_trait;
use std::sync::OnceLock;
use tfplug::validator::{parse_cidr_network, CidrNetwork};
use tfplug::{
    AttributeBuilder, AttributeType, Context, Resource, ResourceData, Result, Schema,
    SchemaBuilder, TfplugError,
};
use tracing::{info, warn};

pub struct NetworkResource {
    provider_data: VultrProviderData,
}

impl NetworkResource {
    pub fn new(provider_data: VultrProviderData) -> Self {
        Self { provider_data }
    }

    pub fn schema_static() -> Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                SchemaBuilder::new()
                    .version(0)
                    .description("Manages a Vultr private network")
                    .attribute(
                        AttributeBuilder::new("cidr_block", AttributeType::String)
                            .description("IPv4 subnet in CIDR notation; picked by Vultr when unset")
                            .optional()
                            .computed()
                            .force_new()
                            .validator(CidrNetwork)
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("description", AttributeType::String)
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
                    .build()
            })
            .clone()
    }

    fn client(&self) -> &Client {
        &self.provider_data.client
    }
}

#[async_trait]
impl Resource for NetworkResource {
    fn type_name(&self) -> &str {
        "vultr_network"
    }

    fn schema(&self) -> Schema {
        Self::schema_static()
    }

    async fn create(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let cidr_block = data.get_string("cidr_block")?;
        let subnet = if cidr_block.is_empty() {
            None
        } else {
            Some(parse_cidr_network(&cidr_block).map_err(|e| {
                TfplugError::InvalidConfiguration(format!(
                    "Error parsing {:?} for network: {}",
                    "cidr_block", e
                ))
            })?)
        };
        let description = data.get_string("description")?;
        let region_id = data.get_int("region_id")?;

        info!("Creating new network");
        let id = self
            .client()
            .networks()
            .create(region_id, &description, subnet)
            .await
            .map_err(|e| TfplugError::Custom(format!("Error creating network: {}", e)))?;
        data.set_id(id);

        self.read(ctx, data).await
    }

    async fn read(&self, _ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();

        let networks = self
            .client()
            .networks()
            .list()
            .await
            .map_err(|e| TfplugError::Custom(format!("Error getting networks: {}", e)))?;
        let Some(network) = networks.into_iter().find(|n| n.id == id) else {
            warn!("Removing network ({}) because it is gone", id);
            data.set_id("");
            return Ok(());
        };

        data.set("cidr_block", network.cidr_block());
        data.set("description", network.description);
        data.set("region_id", network.region_id);

        Ok(())
    }

    /// Every attribute forces a new network.
    async fn update(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        self.read(ctx, data).await
    }

    async fn delete(&self, _ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        info!("Destroying network ({})", id);

        self.client().networks().destroy(&id).await.map_err(|e| {
            TfplugError::Custom(format!("Error destroying network ({}): {}", id, e))
        })?;

        data.set_id("");
        Ok(())
    }
}
