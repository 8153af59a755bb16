//! Private network lookup

use super::{computed, selection_schema};
use crate::filter::{exactly_one, Selection};
use crate::provider_data::VultrProviderData;
use async_trait::async_trait;
use std::sync::OnceLock;
use tfplug::{AttributeType, Context, DataSource, ResourceData, Result, Schema, TfplugError};

pub struct NetworkDataSource {
    provider_data: VultrProviderData,
}

impl NetworkDataSource {
    pub fn new(provider_data: VultrProviderData) -> Self {
        Self { provider_data }
    }

    pub fn schema_static() -> Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                selection_schema("Looks up a Vultr private network", "description_regex")
                    .attribute(computed("cidr_block", AttributeType::String))
                    .attribute(computed("description", AttributeType::String))
                    .attribute(computed("region_id", AttributeType::Number))
                    .build()
            })
            .clone()
    }
}

#[async_trait]
impl DataSource for NetworkDataSource {
    fn type_name(&self) -> &str {
        "vultr_network"
    }

    fn schema(&self) -> Schema {
        Self::schema_static()
    }

    async fn read(&self, _ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let selection = Selection::from_data(data, "description_regex")?;

        let networks = self
            .provider_data
            .client
            .networks()
            .list()
            .await
            .map_err(|e| TfplugError::Custom(format!("Error getting networks: {}", e)))?;
        let network = exactly_one(
            selection.apply(networks, |n| n.description.as_str())?,
            "networks",
        )?;

        data.set_id(network.id.clone());
        data.set("cidr_block", network.cidr_block());
        data.set("description", network.description);
        data.set("region_id", network.region_id);

        Ok(())
    }
}
