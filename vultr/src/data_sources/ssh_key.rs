//! SSH key lookup

use super::{computed, selection_schema};
use crate::filter::{exactly_one, Selection};
use crate::provider_data::VultrProviderData;
use async_trait::async_trait;
use std::sync::OnceLock;
use tfplug::{AttributeType, Context, DataSource, ResourceData, Result, Schema, TfplugError};

pub struct SshKeyDataSource {
    provider_data: VultrProviderData,
}

impl SshKeyDataSource {
    pub fn new(provider_data: VultrProviderData) -> Self {
        Self { provider_data }
    }

    pub fn schema_static() -> Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                selection_schema("Looks up an SSH key in the Vultr account", "name_regex")
                    .attribute(computed("name", AttributeType::String))
                    .attribute(computed("public_key", AttributeType::String))
                    .build()
            })
            .clone()
    }
}

#[async_trait]
impl DataSource for SshKeyDataSource {
    fn type_name(&self) -> &str {
        "vultr_ssh_key"
    }

    fn schema(&self) -> Schema {
        Self::schema_static()
    }

    async fn read(&self, _ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let selection = Selection::from_data(data, "name_regex")?;

        let keys = self
            .provider_data
            .client
            .ssh_keys()
            .list()
            .await
            .map_err(|e| TfplugError::Custom(format!("Error getting SSH keys: {}", e)))?;
        let key = exactly_one(selection.apply(keys, |k| k.name.as_str())?, "SSH keys")?;

        data.set_id(key.id);
        data.set("name", key.name);
        data.set("public_key", key.key.trim().to_string());

        Ok(())
    }
}
