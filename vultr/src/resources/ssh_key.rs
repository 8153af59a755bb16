//! SSH key resource

use crate::api::Client;
use crate::provider_data::VultrProviderData;
use async_trait::async_trait;
use std::sync::OnceLock;
use tfplug::{
    AttributeBuilder, AttributeType, Context, Resource, ResourceData, Result, Schema,
    SchemaBuilder, TfplugError,
};
use tracing::{info, warn};

pub struct SshKeyResource {
    provider_data: VultrProviderData,
}

impl SshKeyResource {
    pub fn new(provider_data: VultrProviderData) -> Self {
        Self { provider_data }
    }

    pub fn schema_static() -> Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                SchemaBuilder::new()
                    .version(0)
                    .description("Manages an SSH key stored in a Vultr account")
                    .attribute(
                        AttributeBuilder::new("name", AttributeType::String)
                            .required()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("public_key", AttributeType::String)
                            .description("OpenSSH public key; surrounding whitespace is ignored")
                            .required()
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
impl Resource for SshKeyResource {
    fn type_name(&self) -> &str {
        "vultr_ssh_key"
    }

    fn schema(&self) -> Schema {
        Self::schema_static()
    }

    async fn create(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let name = data.get_string("name")?;
        let public_key = data.get_string("public_key")?;

        info!("Creating new SSH key");
        let id = self
            .client()
            .ssh_keys()
            .create(&name, &public_key)
            .await
            .map_err(|e| TfplugError::Custom(format!("Error creating SSH key: {}", e)))?;
        data.set_id(id);

        self.read(ctx, data).await
    }

    async fn read(&self, _ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();

        let keys = self
            .client()
            .ssh_keys()
            .list()
            .await
            .map_err(|e| TfplugError::Custom(format!("Error getting SSH keys: {}", e)))?;
        let Some(key) = keys.into_iter().find(|k| k.id == id) else {
            warn!("Removing SSH key ({}) because it is gone", id);
            data.set_id("");
            return Ok(());
        };

        data.set("name", key.name);
        data.set("public_key", key.key.trim().to_string());

        Ok(())
    }

    async fn update(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();

        if data.has_change("name") || data.has_change("public_key") {
            let name = data.get_string("name")?;
            let public_key = data.get_string("public_key")?;
            info!("Updating SSH key ({})", id);
            self.client()
                .ssh_keys()
                .update(&id, &name, &public_key)
                .await
                .map_err(|e| {
                    TfplugError::Custom(format!("Error updating SSH key ({}): {}", id, e))
                })?;
        }

        self.read(ctx, data).await
    }

    async fn delete(&self, _ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        info!("Destroying SSH key ({})", id);

        self.client().ssh_keys().destroy(&id).await.map_err(|e| {
            TfplugError::Custom(format!("Error destroying SSH key ({}): {}", id, e))
        })?;

        data.set_id("");
        Ok(())
    }
}
