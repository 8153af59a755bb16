//! Startup script resource

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

pub struct StartupScriptResource {
    provider_data: VultrProviderData,
}

impl StartupScriptResource {
    pub fn new(provider_data: VultrProviderData) -> Self {
        Self { provider_data }
    }

    pub fn schema_static() -> Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                SchemaBuilder::new()
                    .version(0)
                    .description("Manages a Vultr startup script")
                    .attribute(
                        AttributeBuilder::new("content", AttributeType::String)
                            .required()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("name", AttributeType::String)
                            .required()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("type", AttributeType::String)
                            .description("boot or pxe")
                            .optional()
                            .force_new()
                            .default("boot")
                            .validator(StringOneOf::new(&["boot", "pxe"]))
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
impl Resource for StartupScriptResource {
    fn type_name(&self) -> &str {
        "vultr_startup_script"
    }

    fn schema(&self) -> Schema {
        Self::schema_static()
    }

    async fn create(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let name = data.get_string("name")?;
        let content = data.get_string("content")?;
        let script_type = data
            .get("type")
            .and_then(|v| v.as_string().map(str::to_string))
            .unwrap_or_else(|| "boot".to_string());

        info!("Creating new startup script");
        let id = self
            .client()
            .startup_scripts()
            .create(&name, &content, &script_type)
            .await
            .map_err(|e| TfplugError::Custom(format!("Error creating startup script: {}", e)))?;
        data.set_id(id);

        self.read(ctx, data).await
    }

    async fn read(&self, _ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();

        let scripts = self.client().startup_scripts().list().await.map_err(|e| {
            TfplugError::Custom(format!("Error getting startup scripts: {}", e))
        })?;
        let Some(script) = scripts.into_iter().find(|s| s.id == id) else {
            warn!("Removing startup script ({}) because it is gone", id);
            data.set_id("");
            return Ok(());
        };

        data.set("content", script.content);
        data.set("name", script.name);
        data.set("type", script.script_type);

        Ok(())
    }

    async fn update(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();

        if data.has_change("name") || data.has_change("content") {
            let name = data.get_string("name")?;
            let content = data.get_string("content")?;
            info!("Updating startup script ({})", id);
            self.client()
                .startup_scripts()
                .update(&id, &name, &content)
                .await
                .map_err(|e| {
                    TfplugError::Custom(format!("Error updating startup script ({}): {}", id, e))
                })?;
        }

        self.read(ctx, data).await
    }

    async fn delete(&self, _ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        info!("Destroying startup script ({})", id);

        self.client()
            .startup_scripts()
            .destroy(&id)
            .await
            .map_err(|e| {
                TfplugError::Custom(format!("Error destroying startup script ({}): {}", id, e))
            })?;

        data.set_id("");
        Ok(())
    }
}
