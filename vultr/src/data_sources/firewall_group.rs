//! Firewall group lookup

use super::{computed, selection_schema};
use crate::filter::{exactly_one, Selection};
use crate::provider_data::VultrProviderData;
use async_trait::async_trait;
use std::sync::OnceLock;
use tfplug::{AttributeType, Context, DataSource, ResourceData, Result, Schema, TfplugError};

pub struct FirewallGroupDataSource {
    provider_data: VultrProviderData,
}

impl FirewallGroupDataSource {
    pub fn new(provider_data: VultrProviderData) -> Self {
        Self { provider_data }
    }

    pub fn schema_static() -> Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                selection_schema("Looks up a Vultr firewall group", "description_regex")
                    .attribute(computed("description", AttributeType::String))
                    .attribute(computed("instance_count", AttributeType::Number))
                    .attribute(computed("max_rule_count", AttributeType::Number))
                    .attribute(computed("rule_count", AttributeType::Number))
                    .build()
            })
            .clone()
    }
}

#[async_trait]
impl DataSource for FirewallGroupDataSource {
    fn type_name(&self) -> &str {
        "vultr_firewall_group"
    }

    fn schema(&self) -> Schema {
        Self::schema_static()
    }

    async fn read(&self, _ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let selection = Selection::from_data(data, "description_regex")?;

        let groups = self
            .provider_data
            .client
            .firewall()
            .list_groups()
            .await
            .map_err(|e| TfplugError::Custom(format!("Error getting firewall groups: {}", e)))?;
        let group = exactly_one(
            selection.apply(groups, |g| g.description.as_str())?,
            "firewall groups",
        )?;

        data.set_id(group.id);
        data.set("description", group.description);
        data.set("instance_count", group.instance_count);
        data.set("max_rule_count", group.max_rule_count);
        data.set("rule_count", group.rule_count);

        Ok(())
    }
}
