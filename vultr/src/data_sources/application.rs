//! One-click application lookup

use super::{computed, selection_schema};
use crate::filter::{exactly_one, Selection};
use crate::provider_data::VultrProviderData;
use async_trait::async_trait;
use std::sync::OnceLock;
use tfplug::{AttributeType, Context, DataSource, ResourceData, Result, Schema, TfplugError};

pub struct ApplicationDataSource {
    provider_data: VultrProviderData,
}

impl ApplicationDataSource {
    pub fn new(provider_data: VultrProviderData) -> Self {
        Self { provider_data }
    }

    pub fn schema_static() -> Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                selection_schema("Looks up a Vultr one-click application", "name_regex")
                    .attribute(computed("deploy_name", AttributeType::String))
                    .attribute(computed("name", AttributeType::String))
                    .attribute(computed("short_name", AttributeType::String))
                    .attribute(computed("surcharge", AttributeType::Number))
                    .build()
            })
            .clone()
    }
}

#[async_trait]
impl DataSource for ApplicationDataSource {
    fn type_name(&self) -> &str {
        "vultr_application"
    }

    fn schema(&self) -> Schema {
        Self::schema_static()
    }

    async fn read(&self, _ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let selection = Selection::from_data(data, "name_regex")?;

        let applications = self
            .provider_data
            .client
            .catalog()
            .applications()
            .await
            .map_err(|e| TfplugError::Custom(format!("Error getting applications: {}", e)))?;
        let application = exactly_one(
            selection.apply(applications, |a| a.name.as_str())?,
            "applications",
        )?;

        data.set_id(application.id);
        data.set("deploy_name", application.deploy_name);
        data.set("name", application.name);
        data.set("short_name", application.short_name);
        data.set("surcharge", application.surcharge);

        Ok(())
    }
}
