//! Snapshot lookup

use super::{computed, selection_schema};
use crate::filter::{exactly_one, Selection};
use crate::provider_data::VultrProviderData;
use async_trait::async_trait;
use std::sync::OnceLock;
use tfplug::{AttributeType, Context, DataSource, ResourceData, Result, Schema, TfplugError};

pub struct SnapshotDataSource {
    provider_data: VultrProviderData,
}

impl SnapshotDataSource {
    pub fn new(provider_data: VultrProviderData) -> Self {
        Self { provider_data }
    }

    pub fn schema_static() -> Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                selection_schema("Looks up a Vultr snapshot", "description_regex")
                    .attribute(computed("application_id", AttributeType::String))
                    .attribute(computed("created", AttributeType::String))
                    .attribute(computed("description", AttributeType::String))
                    .attribute(computed("os_id", AttributeType::Number))
                    .attribute(computed("size", AttributeType::String))
                    .attribute(computed("status", AttributeType::String))
                    .build()
            })
            .clone()
    }
}

#[async_trait]
impl DataSource for SnapshotDataSource {
    fn type_name(&self) -> &str {
        "vultr_snapshot"
    }

    fn schema(&self) -> Schema {
        Self::schema_static()
    }

    async fn read(&self, _ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let selection = Selection::from_data(data, "description_regex")?;

        let snapshots = self
            .provider_data
            .client
            .catalog()
            .snapshots()
            .await
            .map_err(|e| TfplugError::Custom(format!("Error getting snapshots: {}", e)))?;
        let snapshot = exactly_one(
            selection.apply(snapshots, |s| s.description.as_str())?,
            "snapshots",
        )?;

        let os_id = snapshot.os_id.parse::<i64>().map_err(|e| {
            TfplugError::Custom(format!(
                "Error parsing OS ID {:?} of snapshot ({}): {}",
                snapshot.os_id, snapshot.id, e
            ))
        })?;

        data.set_id(snapshot.id);
        data.set("application_id", snapshot.app_id);
        data.set("created", snapshot.created);
        data.set("description", snapshot.description);
        data.set("os_id", os_id);
        data.set("size", snapshot.size);
        data.set("status", snapshot.status);

        Ok(())
    }
}
