//! Startup script lookup

use super::{computed, selection_schema};
use crate::filter::{exactly_one, Selection};
use crate::provider_data::VultrProviderData;
use async_trait::async_trait;
use std::sync::OnceLock;
use tfplug::{AttributeType, Context, DataSource, ResourceData, Result, Schema, TfplugError};

pub struct StartupScriptDataSource {
    provider_data: VultrProviderData,
}

impl StartupScriptDataSource {
    pub fn new(provider_data: VultrProviderData) -> Self {
        Self { provider_data }
    }

    pub fn schema_static() -> Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                selection_schema("Looks up a Vultr startup script", "name_regex")
                    .attribute(computed("content", AttributeType::String))
                    .attribute(computed("name", AttributeType::String))
                    .attribute(computed("type", AttributeType::String))
                    .build()
            })
            .clone()
    }
}

#[async_trait]
impl DataSource for StartupScriptDataSource {
    fn type_name(&self) -> &str {
        "vultr_startup_script"
    }

    fn schema(&self) -> Schema {
        Self::schema_static()
    }

    async fn read(&self, _ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let selection = Selection::from_data(data, "name_regex")?;

        let scripts = self
            .provider_data
            .client
            .startup_scripts()
            .list()
            .await
            .map_err(|e| TfplugError::Custom(format!("Error getting startup scripts: {}", e)))?;
        let script = exactly_one(
            selection.apply(scripts, |s| s.name.as_str())?,
            "startup scripts",
        )?;

        data.set_id(script.id);
        data.set("content", script.content);
        data.set("name", script.name);
        data.set("type", script.script_type);

        Ok(())
    }
}
