//! Block storage resource

use crate::api::Client;
use crate::provider_data::VultrProviderData;
use crate::resources::{int_change, string_change};
use crate::wait::{wait_for_resource_state, ResourceWait};
use async_trait::async_trait;
use std::sync::OnceLock;
use tfplug::{
    AttributeBuilder, AttributeType, Context, Resource, ResourceData, Result, Schema,
    SchemaBuilder, TfplugError, TimeoutKind,
};
use tracing::{info, warn};

pub struct BlockStorageResource {
    provider_data: VultrProviderData,
}

impl BlockStorageResource {
    pub fn new(provider_data: VultrProviderData) -> Self {
        Self { provider_data }
    }

    pub fn schema_static() -> Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                SchemaBuilder::new()
                    .version(0)
                    .description("Manages a Vultr block storage volume")
                    .attribute(
                        AttributeBuilder::new("cost_per_month", AttributeType::String)
                            .computed()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("date_created", AttributeType::String)
                            .computed()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("instance", AttributeType::String)
                            .description("Instance the volume is attached to")
                            .optional()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("name", AttributeType::String)
                            .description("Label of the volume")
                            .required()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("region_id", AttributeType::Number)
                            .required()
                            .force_new()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("size", AttributeType::Number)
                            .description("Size in GB; volumes can only grow")
                            .required()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("status", AttributeType::String)
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
}

#[async_trait]
impl Resource for BlockStorageResource {
    fn type_name(&self) -> &str {
        "vultr_block_storage"
    }

    fn schema(&self) -> Schema {
        Self::schema_static()
    }

    async fn create(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let name = data.get_string("name")?;
        let region_id = data.get_int("region_id")?;
        let size = data.get_int("size")?;
        let instance = data.get_string("instance")?;

        info!("Creating new block storage");
        let id = self
            .client()
            .block_storage()
            .create(region_id, size, &name)
            .await
            .map_err(|e| TfplugError::Custom(format!("Error creating block storage: {}", e)))?;
        data.set_id(&id);

        wait_for_resource_state(
            ctx,
            &self.provider_data.wait,
            self,
            data,
            ResourceWait {
                kind: "block storage",
                attribute: "status",
                target: "active",
                pending: &["pending"],
                timeout: TimeoutKind::Create,
            },
        )
        .await?;

        if !instance.is_empty() {
            self.client()
                .block_storage()
                .attach(&id, &instance)
                .await
                .map_err(|e| {
                    TfplugError::Custom(format!(
                        "Error attaching newly created block storage ({}) to instance {:?}: {}",
                        id, instance, e
                    ))
                })?;
        }

        self.read(ctx, data).await
    }

    async fn read(&self, _ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();

        let storage = match self.client().block_storage().get(&id).await {
            Ok(storage) => storage,
            Err(e) if e.message_starts_with("Invalid block storage") => {
                warn!("Removing block storage ({}) because it is gone", id);
                data.set_id("");
                return Ok(());
            }
            Err(e) => {
                return Err(TfplugError::Custom(format!(
                    "Error getting block storage ({}): {}",
                    id, e
                )))
            }
        };

        data.set("cost_per_month", storage.cost_per_month);
        data.set("date_created", storage.date_created);
        data.set("size", storage.size);
        data.set("name", storage.name);
        data.set("region_id", storage.region_id);
        data.set("status", storage.status);
        data.set("instance", storage.attached_to);

        Ok(())
    }

    async fn update(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        let volumes = self.client().block_storage();

        if data.has_change("name") {
            info!("Renaming block storage ({})", id);
            let (_, name) = string_change(data, "name");
            volumes.rename(&id, &name).await.map_err(|e| {
                TfplugError::Custom(format!(
                    "Error renaming block storage ({}) to {:?}: {}",
                    id, name, e
                ))
            })?;
        }

        if data.has_change("size") {
            info!("Resizing block storage ({})", id);
            let (_, size) = int_change(data, "size");
            volumes.resize(&id, size).await.map_err(|e| {
                TfplugError::Custom(format!(
                    "Error resizing block storage ({}) to {}: {}",
                    id, size, e
                ))
            })?;
        }

        if data.has_change("instance") {
            let (old, new) = string_change(data, "instance");
            if !old.is_empty() {
                info!("Detaching block storage ({})", id);
                volumes.detach(&id).await.map_err(|e| {
                    TfplugError::Custom(format!(
                        "Error detaching block storage ({}): {}",
                        id, e
                    ))
                })?;
            }
            if !new.is_empty() {
                info!("Attaching block storage ({})", id);
                volumes.attach(&id, &new).await.map_err(|e| {
                    TfplugError::Custom(format!(
                        "Error attaching block storage ({}) to {:?}: {}",
                        id, new, e
                    ))
                })?;
            }
        }

        self.read(ctx, data).await
    }

    async fn delete(&self, _ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        let volumes = self.client().block_storage();
        info!("Destroying block storage ({})", id);

        if !data.get_string("instance")?.is_empty() {
            info!("Detaching block storage ({}) before deleting it", id);
            volumes.detach(&id).await.map_err(|e| {
                TfplugError::Custom(format!("Error detaching block storage ({}): {}", id, e))
            })?;
        }

        volumes.delete(&id).await.map_err(|e| {
            TfplugError::Custom(format!("Error destroying block storage ({}): {}", id, e))
        })?;

        data.set_id("");
        Ok(())
    }
}
