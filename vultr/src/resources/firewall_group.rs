//! Firewall group resource

use crate::api::Client;
use crate::provider_data::VultrProviderData;
use async_trait::async_trait;
use std::sync::OnceLock;
use tfplug::{
    AttributeBuilder, AttributeType, Context, Resource, ResourceData, Result, Schema,
    SchemaBuilder, TfplugError,
};
use tracing::{info, warn};

pub struct FirewallGroupResource {
    provider_data: VultrProviderData,
}

impl FirewallGroupResource {
    pub fn new(provider_data: VultrProviderData) -> Self {
        Self { provider_data }
    }

    pub fn schema_static() -> Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                SchemaBuilder::new()
                    .version(0)
                    .description("Manages a Vultr firewall group")
                    .attribute(
                        AttributeBuilder::new("description", AttributeType::String)
                            .optional()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("instance_count", AttributeType::Number)
                            .computed()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("max_rule_count", AttributeType::Number)
                            .computed()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("rule_count", AttributeType::Number)
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
impl Resource for FirewallGroupResource {
    fn type_name(&self) -> &str {
        "vultr_firewall_group"
    }

    fn schema(&self) -> Schema {
        Self::schema_static()
    }

    async fn create(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let description = data.get_string("description")?;

        info!("Creating new firewall group");
        let id = self
            .client()
            .firewall()
            .create_group(&description)
            .await
            .map_err(|e| TfplugError::Custom(format!("Error creating firewall group: {}", e)))?;
        data.set_id(id);

        self.read(ctx, data).await
    }

    async fn read(&self, _ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();

        let group = self.client().firewall().get_group(&id).await.map_err(|e| {
            TfplugError::Custom(format!("Error getting firewall group ({}): {}", id, e))
        })?;
        let Some(group) = group else {
            warn!("Removing firewall group ({}) because it is gone", id);
            data.set_id("");
            return Ok(());
        };

        data.set("description", group.description);
        data.set("instance_count", group.instance_count);
        data.set("max_rule_count", group.max_rule_count);
        data.set("rule_count", group.rule_count);

        Ok(())
    }

    async fn update(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();

        if data.has_change("description") {
            info!("Updating firewall group ({}) description", id);
            let description = data.get_string("description")?;
            self.client()
                .firewall()
                .set_group_description(&id, &description)
                .await
                .map_err(|e| {
                    TfplugError::Custom(format!(
                        "Error changing firewall group ({}) description to {:?}: {}",
                        id, description, e
                    ))
                })?;
        }

        self.read(ctx, data).await
    }

    async fn delete(&self, _ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = data.id().to_string();
        info!("Destroying firewall group ({})", id);

        self.client().firewall().delete_group(&id).await.map_err(|e| {
            TfplugError::Custom(format!("Error destroying firewall group ({}): {}", id, e))
        })?;

        data.set_id("");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use std::collections::HashMap;
    use tfplug::Dynamic;

    const GROUPS: &str = r#"{"1234abcd":{"FIREWALLGROUPID":"1234abcd","description":"web","date_created":"2017-02-14 17:48:40","date_modified":"2017-02-14 17:48:40","instance_count":2,"rule_count":2,"max_rule_count":50}}"#;

    #[tokio::test]
    async fn test_create_then_read_counts() {
        let mut server = Server::new_async().await;
        let create = server
            .mock("POST", "/v1/firewall/group_create")
            .match_body(Matcher::UrlEncoded("description".into(), "web".into()))
            .with_body(r#"{"FIREWALLGROUPID":"1234abcd"}"#)
            .create_async()
            .await;
        let _list = server
            .mock("GET", "/v1/firewall/group_list")
            .match_query(Matcher::UrlEncoded("FIREWALLGROUPID".into(), "1234abcd".into()))
            .with_body(GROUPS)
            .create_async()
            .await;

        let resource = FirewallGroupResource::new(VultrProviderData::for_tests(&server.url()));
        let mut data = ResourceData::from_config(HashMap::from([(
            "description".to_string(),
            Dynamic::from("web"),
        )]));

        resource.create(&Context::new(), &mut data).await.unwrap();

        create.assert_async().await;
        assert_eq!(data.id(), "1234abcd");
        assert_eq!(data.get_int("instance_count").unwrap(), 2);
        assert_eq!(data.get_int("max_rule_count").unwrap(), 50);
    }

    #[tokio::test]
    async fn test_read_missing_group_is_gone() {
        let mut server = Server::new_async().await;
        let _list = server
            .mock("GET", "/v1/firewall/group_list")
            .match_query(Matcher::Any)
            .with_body("[]")
            .create_async()
            .await;

        let resource = FirewallGroupResource::new(VultrProviderData::for_tests(&server.url()));
        let mut data = ResourceData::from_state("1234abcd", HashMap::new());

        resource.read(&Context::new(), &mut data).await.unwrap();

        assert_eq!(data.id(), "");
    }

    #[tokio::test]
    async fn test_update_description() {
        let mut server = Server::new_async().await;
        let set = server
            .mock("POST", "/v1/firewall/group_set_description")
            .match_body(Matcher::UrlEncoded("description".into(), "api".into()))
            .create_async()
            .await;
        let _list = server
            .mock("GET", "/v1/firewall/group_list")
            .match_query(Matcher::Any)
            .with_body(GROUPS.replace(r#""description":"web""#, r#""description":"api""#))
            .create_async()
            .await;

        let resource = FirewallGroupResource::new(VultrProviderData::for_tests(&server.url()));
        let mut data = ResourceData::for_update(
            "1234abcd",
            HashMap::from([("description".to_string(), Dynamic::from("web"))]),
            HashMap::from([("description".to_string(), Dynamic::from("api"))]),
        );

        resource.update(&Context::new(), &mut data).await.unwrap();

        set.assert_async().await;
        assert_eq!(data.get_string("description").unwrap(), "api");
    }
}
