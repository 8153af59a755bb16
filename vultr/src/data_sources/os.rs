//! Operating system lookup

use super::{computed, selection_schema};
use crate::filter::{exactly_one, Selection};
use crate::provider_data::VultrProviderData;
use async_trait::async_trait;
use std::sync::OnceLock;
use tfplug::{AttributeType, Context, DataSource, ResourceData, Result, Schema, TfplugError};

pub struct OsDataSource {
    provider_data: VultrProviderData,
}

impl OsDataSource {
    pub fn new(provider_data: VultrProviderData) -> Self {
        Self { provider_data }
    }

    pub fn schema_static() -> Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                selection_schema("Looks up a Vultr operating system", "name_regex")
                    .attribute(computed("arch", AttributeType::String))
                    .attribute(computed("family", AttributeType::String))
                    .attribute(computed("name", AttributeType::String))
                    .attribute(computed("surcharge", AttributeType::String))
                    .attribute(computed("windows", AttributeType::Bool))
                    .build()
            })
            .clone()
    }
}

#[async_trait]
impl DataSource for OsDataSource {
    fn type_name(&self) -> &str {
        "vultr_os"
    }

    fn schema(&self) -> Schema {
        Self::schema_static()
    }

    async fn read(&self, _ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let selection = Selection::from_data(data, "name_regex")?;

        let systems = self
            .provider_data
            .client
            .catalog()
            .operating_systems()
            .await
            .map_err(|e| TfplugError::Custom(format!("Error getting operating systems: {}", e)))?;
        let os = exactly_one(
            selection.apply(systems, |os| os.name.as_str())?,
            "operating systems",
        )?;

        data.set_id(os.id.to_string());
        data.set("arch", os.arch);
        data.set("family", os.family);
        data.set("name", os.name);
        data.set("surcharge", os.surcharge);
        data.set("windows", os.windows);

        Ok(())
    }
}
