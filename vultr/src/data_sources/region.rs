//! Region lookup

use super::{computed, selection_schema};
use crate::filter::{exactly_one, Selection};
use crate::provider_data::VultrProviderData;
use async_trait::async_trait;
use std::sync::OnceLock;
use tfplug::{AttributeType, Context, DataSource, ResourceData, Result, Schema, TfplugError};

pub struct RegionDataSource {
    provider_data: VultrProviderData,
}

impl RegionDataSource {
    pub fn new(provider_data: VultrProviderData) -> Self {
        Self { provider_data }
    }

    pub fn schema_static() -> Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                selection_schema("Looks up a Vultr region", "name_regex")
                    .attribute(computed("block_storage", AttributeType::Bool))
                    .attribute(computed("code", AttributeType::String))
                    .attribute(computed("continent", AttributeType::String))
                    .attribute(computed("country", AttributeType::String))
                    .attribute(computed("ddos_protection", AttributeType::Bool))
                    .attribute(computed("name", AttributeType::String))
                    .attribute(computed("state", AttributeType::String))
                    .build()
            })
            .clone()
    }
}

#[async_trait]
impl DataSource for RegionDataSource {
    fn type_name(&self) -> &str {
        "vultr_region"
    }

    fn schema(&self) -> Schema {
        Self::schema_static()
    }

    async fn read(&self, _ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let selection = Selection::from_data(data, "name_regex")?;

        let regions = self
            .provider_data
            .client
            .catalog()
            .regions()
            .await
            .map_err(|e| TfplugError::Custom(format!("Error getting regions: {}", e)))?;
        let region = exactly_one(selection.apply(regions, |r| r.name.as_str())?, "regions")?;

        data.set_id(region.id.to_string());
        data.set("block_storage", region.block_storage);
        data.set("code", region.code);
        data.set("continent", region.continent);
        data.set("country", region.country);
        data.set("ddos_protection", region.ddos);
        data.set("name", region.name);
        data.set("state", region.state);

        Ok(())
    }
}
