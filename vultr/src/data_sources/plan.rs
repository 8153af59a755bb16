//! Plan lookup

use super::{computed, selection_schema};
use crate::filter::{exactly_one, Selection};
use crate::provider_data::VultrProviderData;
use async_trait::async_trait;
use std::sync::OnceLock;
use tfplug::{AttributeType, Context, DataSource, ResourceData, Result, Schema, TfplugError};

pub struct PlanDataSource {
    provider_data: VultrProviderData,
}

impl PlanDataSource {
    pub fn new(provider_data: VultrProviderData) -> Self {
        Self { provider_data }
    }

    pub fn schema_static() -> Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                selection_schema("Looks up a Vultr instance plan", "name_regex")
                    .attribute(computed(
                        "available_locations",
                        AttributeType::List(Box::new(AttributeType::Number)),
                    ))
                    .attribute(computed("bandwidth", AttributeType::String))
                    .attribute(computed("disk", AttributeType::String))
                    .attribute(computed("name", AttributeType::String))
                    .attribute(computed("price_per_month", AttributeType::String))
                    .attribute(computed("ram", AttributeType::String))
                    .attribute(computed("vcpu_count", AttributeType::Number))
                    .build()
            })
            .clone()
    }
}

#[async_trait]
impl DataSource for PlanDataSource {
    fn type_name(&self) -> &str {
        "vultr_plan"
    }

    fn schema(&self) -> Schema {
        Self::schema_static()
    }

    async fn read(&self, _ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let selection = Selection::from_data(data, "name_regex")?;

        let plans = self
            .provider_data
            .client
            .catalog()
            .plans()
            .await
            .map_err(|e| TfplugError::Custom(format!("Error getting plans: {}", e)))?;
        let plan = exactly_one(selection.apply(plans, |p| p.name.as_str())?, "plans")?;

        data.set_id(plan.id.to_string());
        data.set("available_locations", plan.regions);
        data.set("bandwidth", plan.bandwidth);
        data.set("disk", plan.disk);
        data.set("name", plan.name);
        data.set("price_per_month", plan.price);
        data.set("ram", plan.ram);
        data.set("vcpu_count", plan.vcpus);

        Ok(())
    }
}
