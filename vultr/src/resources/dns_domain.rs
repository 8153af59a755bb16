//! DNS domain resource
//!
//! A domain is created together with a default `A` record (empty name)
//! pointing at `ip`. The id is the domain name.

use crate::api::Client;
use crate::provider_data::VultrProviderData;
use async_trait::async_trait;
use std::sync::OnceLock;
use tfplug::validator::IpAddress;
use tfplug::{
    AttributeBuilder, AttributeType, Context, Resource, ResourceData, Result, Schema,
    SchemaBuilder, TfplugError,
};
use tracing::{info, warn};

pub struct DnsDomainResource {
    provider_data: VultrProviderData,
}

impl DnsDomainResource {
    pub fn new(provider_data: VultrProviderData) -> Self {
        Self { provider_data }
    }

    pub fn schema_static() -> Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                SchemaBuilder::new()
                    .version(0)
                    .description("Manages a DNS domain hosted by Vultr")
                    .attribute(
                        AttributeBuilder::new("domain", AttributeType::String)
                            .required()
                            .force_new()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("ip", AttributeType::String)
                            .description("Address of the default A record")
                            .required()
                            .force_new()
                            .validator(IpAddress)
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
impl Resource for DnsDomainResource {
    fn type_name(&self) -> &str {
        "vultr_dns_domain"
    }

    fn schema(&self) -> Schema {
        Self::schema_static()
    }

    async fn create(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let domain = data.get_string("domain")?;
        let ip = data.get_string("ip")?;

        info!("Creating new DNS domain");
        self.client()
            .dns()
            .create_domain(&domain, &ip)
            .await
            .map_err(|e| TfplugError::Custom(format!("Error creating DNS domain: {}", e)))?;
        data.set_id(domain);

        self.read(ctx, data).await
    }

    async fn read(&self, _ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();

        let domains =
            self.client().dns().list_domains().await.map_err(|e| {
                TfplugError::Custom(format!("Error getting DNS domains: {}", e))
            })?;
        if !domains.iter().any(|d| d.domain == id) {
            warn!("Removing DNS domain ({}) because it is gone", id);
            data.set_id("");
            return Ok(());
        }

        let records = match self.client().dns().list_records(&id).await {
            Ok(records) => records,
            Err(e) if e.message_starts_with("Invalid domain.") => {
                warn!(
                    "Removing DNS domain ({}) because it has no default record",
                    id
                );
                data.set_id("");
                return Ok(());
            }
            Err(e) => {
                return Err(TfplugError::Custom(format!(
                    "Error getting DNS records for DNS domain ({}): {}",
                    id, e
                )))
            }
        };

        let Some(default_record) = records
            .into_iter()
            .find(|r| r.record_type == "A" && r.name.is_empty())
        else {
            warn!(
                "Removing DNS domain ({}) because it has no default record",
                id
            );
            data.set_id("");
            return Ok(());
        };

        data.set("domain", id);
        data.set("ip", default_record.data);

        Ok(())
    }

    /// Both attributes force a new domain, so there is nothing to change in
    /// place.
    async fn update(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        self.read(ctx, data).await
    }

    async fn delete(&self, _ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        info!("Destroying DNS domain ({})", id);

        self.client().dns().delete_domain(&id).await.map_err(|e| {
            TfplugError::Custom(format!("Error destroying DNS domain ({}): {}", id, e))
        })?;

        data.set_id("");
        Ok(())
    }
}
